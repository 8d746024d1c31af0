use axum::http::HeaderValue;

use crate::preview::BatchResolver;

/// Shared application state passed to all handlers.
/// The cache store and HTTP client live inside the resolver, injected at
/// startup rather than looked up globally.
#[derive(Clone)]
pub struct AppState {
    pub resolver: BatchResolver,
    pub allowed_origin: HeaderValue,
}
