use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::PreviewRecord;
use crate::state::AppState;

// ── Query params ───────────────────────────────────────────────────────────

/// The first `url` parameter, holding a comma-separated list of URLs.
///
/// Later repetitions of `url` are ignored rather than rejected.
pub fn first_url_param(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.as_str())
}

/// Split the `url` parameter on commas. `None` when absent or empty.
///
/// Entries are passed through as-is: no trimming, validation or dedup.
pub fn split_url_list(raw: Option<&str>) -> Option<Vec<String>> {
    match raw {
        Some(raw) if !raw.is_empty() => Some(raw.split(',').map(str::to_owned).collect()),
        _ => None,
    }
}

// ── Response envelope ──────────────────────────────────────────────────────

/// JSON body pretty-printed with two-space indentation.
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                tracing::error!(error = ?e, "Failed to serialize response");
                AppError::Internal.into_response()
            }
        }
    }
}

// ── Handler ────────────────────────────────────────────────────────────────

/// `<any method> <any path>?url=<url>[,<url>...]`
///
/// Returns one preview record per requested URL. Cached records are served
/// from the store; the rest are fetched from their origins and cached for
/// seven days.
pub async fn get_link_previews(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<PrettyJson<Vec<PreviewRecord>>> {
    let urls = split_url_list(first_url_param(&params)).ok_or(AppError::MissingParameter)?;

    tracing::debug!(count = urls.len(), "Resolving link previews");
    let records = state.resolver.resolve(&urls).await;

    Ok(PrettyJson(records))
}

// ── Unit tests ─────────────────────────────────────────────────────────────
