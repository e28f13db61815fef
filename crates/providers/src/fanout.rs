//! Concurrent search across every configured source.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use fareflow_core::domain::flight::RawOffer;

use crate::flights::{FlightSource, SearchQuery};

/// Fans one query out to all sources at once. Each source gets its own
/// timeout budget; a slow or failing source contributes an empty list and
/// never sinks the search.
#[derive(Clone)]
pub struct SourceFanout {
    sources: Vec<Arc<dyn FlightSource>>,
    timeout: Duration,
}

impl SourceFanout {
    pub fn new(sources: Vec<Arc<dyn FlightSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.name().to_owned()).collect()
    }

    pub async fn search_all(&self, query: &SearchQuery) -> BTreeMap<String, Vec<RawOffer>> {
        let mut handles = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let source = Arc::clone(source);
            let query = query.clone();
            let timeout = self.timeout;
            handles.push(tokio::spawn(async move {
                let name = source.name().to_owned();
                let offers = match tokio::time::timeout(timeout, source.fetch(&query)).await {
                    Ok(Ok(offers)) => offers,
                    Ok(Err(error)) => {
                        warn!(
                            event_name = "search.source_failed",
                            source = %name,
                            error = %error,
                            "source dropped from this search"
                        );
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            event_name = "search.source_timed_out",
                            source = %name,
                            timeout_secs = timeout.as_secs(),
                            "source dropped from this search"
                        );
                        Vec::new()
                    }
                };
                (name, offers)
            }));
        }

        let mut results = BTreeMap::new();
        for handle in handles {
            match handle.await {
                Ok((name, offers)) => {
                    results.insert(name, offers);
                }
                Err(error) => {
                    warn!(event_name = "search.source_task_failed", error = %error);
                }
            }
        }
        results
    }
}
