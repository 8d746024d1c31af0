use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP layer.
///
/// Per-URL failures never reach this type: they are folded into each
/// record's `found` flag by the batch resolver.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing `url` query parameter")]
    MissingParameter,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Usage errors are reported in the body only; the status stays 200.
            AppError::MissingParameter => {
                let body = serde_json::to_string_pretty(&json!({ "hey": "no-url" }))
                    .unwrap_or_else(|_| r#"{"hey":"no-url"}"#.to_owned());
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response()
            }
            AppError::Internal => {
                tracing::error!("Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the key-value store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Cache store operation timed out")]
    Timeout,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while resolving a single URL.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Origin fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid extractor selector: {0}")]
    InvalidSelector(#[from] lol_html::errors::SelectorError),

    #[error("Metadata extraction failed: {0}")]
    Extract(#[from] lol_html::errors::RewritingError),

    #[error("Record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type PreviewResult<T> = Result<T, PreviewError>;

/// Invalid values found while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ALLOWED_ORIGIN is not a valid header value: {0}")]
    InvalidOrigin(String),
}
