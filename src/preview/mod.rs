pub mod batch;
pub mod extractor;
pub mod fetcher;

pub use batch::BatchResolver;
pub use fetcher::{build_http_client, PreviewFetcher, CACHE_TTL};
