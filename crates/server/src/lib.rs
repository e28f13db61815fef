//! HTTP surface and turn orchestration for the fareflow backend.

pub mod bootstrap;
pub mod chat;
pub mod health;
pub mod turn;
