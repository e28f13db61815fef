pub mod flight;
pub mod session;
