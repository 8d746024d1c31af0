use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::error::StoreResult;

mod in_memory;

pub use self::in_memory::InMemoryStore;

pub type ArcStore = Arc<dyn KvStore>;

/// Key-value store backing the preview cache.
///
/// Values are opaque strings; the store is responsible for dropping entries
/// once their time-to-live has elapsed.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;
}

