pub mod link_preview;

use axum::{
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::state::AppState;

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "link-preview-proxy",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Build the application router.
///
/// Every path other than the auxiliary routes resolves previews, whatever the
/// method. All responses carry the configured `Access-Control-Allow-Origin`.
pub fn router(state: AppState) -> Router {
    let allow_origin = SetResponseHeaderLayer::overriding(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        state.allowed_origin.clone(),
    );

    Router::new()
        .route("/health", get(health_check))
        .fallback(link_preview::get_link_previews)
        .layer(TraceLayer::new_for_http())
        .layer(allow_origin)
        .with_state(state)
}
