//! The flight source seam.

use async_trait::async_trait;

use fareflow_core::domain::flight::RawOffer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub from_code: String,
    pub to_code: String,
    /// ISO date, or the week-search sentinel passed through unchanged.
    pub date: String,
    pub max_results: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    Unavailable { source: String, detail: String },
    Timeout { source: String, timeout_secs: u64 },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { source, detail } => {
                write!(f, "source `{source}` is unavailable: {detail}")
            }
            Self::Timeout { source, timeout_secs } => {
                write!(f, "source `{source}` timed out after {timeout_secs}s")
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// One upstream flight inventory. Implementations own their transport and
/// credentials; callers only see offers or a source-tagged error.
#[async_trait]
pub trait FlightSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawOffer>, SourceError>;
}

/// Canned source for demo mode and tests. Offers come back stamped with
/// this source's name regardless of what the fixtures carried.
#[derive(Clone, Debug)]
pub struct StaticSource {
    name: String,
    offers: Vec<RawOffer>,
    failure: Option<SourceError>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, offers: Vec<RawOffer>) -> Self {
        Self { name: name.into(), offers, failure: None }
    }

    pub fn failing(name: impl Into<String>, failure: SourceError) -> Self {
        Self { name: name.into(), offers: Vec::new(), failure: Some(failure) }
    }
}

#[async_trait]
impl FlightSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawOffer>, SourceError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let offers = self
            .offers
            .iter()
            .take(query.max_results as usize)
            .cloned()
            .map(|mut offer| {
                offer.source = self.name.clone();
                offer
            })
            .collect();
        Ok(offers)
    }
}
