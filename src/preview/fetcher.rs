use std::future::Future;
use std::time::Duration;

use reqwest::Client as ReqwestClient;

use crate::error::{PreviewResult, StoreError, StoreResult};
use crate::models::{PreviewMetadata, PreviewRecord};
use crate::preview::extractor::extract_stream;
use crate::store::ArcStore;

/// How long a resolved record stays in the store (7 days).
pub const CACHE_TTL: Duration = Duration::from_secs(604_800);

/// Statuses treated as a failed fetch even when the transport succeeded.
pub const FAILURE_STATUSES: [u16; 5] = [400, 403, 502, 503, 530];

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; LinkPreviewProxy/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Client used for origin fetches. Redirects are followed.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<ReqwestClient> {
    ReqwestClient::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Cache-aside access to preview records for a single URL.
///
/// Cheaply cloneable; the store handle and HTTP client are shared.
#[derive(Clone)]
pub struct PreviewFetcher {
    store: ArcStore,
    http_client: ReqwestClient,
    store_timeout: Duration,
}

impl PreviewFetcher {
    pub fn new(store: ArcStore, http_client: ReqwestClient) -> Self {
        Self {
            store,
            http_client,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Look `url` up in the store.
    ///
    /// A miss yields an unresolved record. A hit is returned with `found`
    /// forced to `true`. Unparseable entries count as a miss; only a failing
    /// store is reported as an error.
    pub async fn read_cache(&self, url: &str) -> PreviewResult<PreviewRecord> {
        let Some(raw) = self.bounded(self.store.get(url)).await? else {
            tracing::debug!(url = %url, "Preview cache miss");
            return Ok(PreviewRecord::missing(url));
        };

        match serde_json::from_str::<PreviewRecord>(&raw) {
            Ok(mut record) => {
                tracing::debug!(url = %url, "Preview cache hit");
                record.url = url.to_owned();
                record.found = true;
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Ignoring corrupt preview cache entry");
                Ok(PreviewRecord::missing(url))
            }
        }
    }

    /// Fetch `record.url` from its origin and fill `record` in place.
    ///
    /// Failures are logged and leave the record untouched with
    /// `found == false`. On success the fully extracted record is written to
    /// the store; a failed write is logged and the record is still returned
    /// as found.
    pub async fn resolve_from_origin(&self, record: &mut PreviewRecord) {
        let metadata = match self.fetch_metadata(&record.url).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, url = %record.url, "Failed to resolve preview from origin");
                return;
            }
        };

        record.resolve(metadata);

        if let Err(e) = self.persist(record).await {
            tracing::warn!(error = %e, url = %record.url, "Failed to store preview");
        }
    }

    /// `Ok(None)` when the origin answered with an unusable status.
    async fn fetch_metadata(&self, url: &str) -> PreviewResult<Option<PreviewMetadata>> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() || FAILURE_STATUSES.contains(&status.as_u16()) {
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or(""),
                "Failed request to origin"
            );
            return Ok(None);
        }

        let metadata = extract_stream(response.bytes_stream()).await?;
        Ok(Some(metadata))
    }

    async fn persist(&self, record: &PreviewRecord) -> PreviewResult<()> {
        let value = serde_json::to_string(record)?;
        self.bounded(self.store.put(&record.url, &value, CACHE_TTL))
            .await?;
        Ok(())
    }

    async fn bounded<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        tokio::time::timeout(self.store_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

