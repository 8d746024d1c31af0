use futures::future::join_all;

use crate::models::PreviewRecord;
use crate::preview::fetcher::PreviewFetcher;

/// Resolves a batch of URLs in two phases.
///
/// Every URL is first looked up in the cache concurrently. Once all lookups
/// have finished, the records still unresolved are fetched from their
/// origins concurrently. Each task returns its own result, so no collection
/// is shared between tasks.
#[derive(Clone)]
pub struct BatchResolver {
    fetcher: PreviewFetcher,
}

impl BatchResolver {
    pub fn new(fetcher: PreviewFetcher) -> Self {
        Self { fetcher }
    }

    /// One record per input URL, duplicates included.
    ///
    /// Callers must correlate results by `url`, not position.
    pub async fn resolve(&self, urls: &[String]) -> Vec<PreviewRecord> {
        let mut records = self.read_cache_phase(urls).await;
        self.origin_phase(&mut records).await;
        records
    }

    async fn read_cache_phase(&self, urls: &[String]) -> Vec<PreviewRecord> {
        let lookups = urls.iter().map(|url| async move {
            match self.fetcher.read_cache(url).await {
                Ok(record) => record,
                Err(e) => {
                    // Treat an unreachable store as a miss for this URL only.
                    tracing::warn!(error = %e, url = %url, "Preview cache lookup failed");
                    PreviewRecord::missing(url.as_str())
                }
            }
        });
        join_all(lookups).await
    }

    async fn origin_phase(&self, records: &mut [PreviewRecord]) {
        let fetches = records
            .iter_mut()
            .filter(|record| !record.found)
            .map(|record| self.fetcher.resolve_from_origin(record));

        let pending = join_all(fetches).await.len();
        tracing::debug!(pending, "Origin phase complete");
    }
}
