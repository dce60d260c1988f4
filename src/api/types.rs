// REST request/response shapes (spec §6.1). Deliberately minimal: this
// engine serves exactly two routes, so there is no `ApiConfig` grab-bag
// of CORS/rate-limit/swagger/auth toggles — those concerns either have
// no counterpart here or are fixed at startup in `server::run`.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::pool::PoolManager;

#[derive(Clone)]
pub struct AppState {
    pub pool_manager: Arc<PoolManager>,
}

/// `GET /feed/scroll` query parameters.
#[derive(Debug, Deserialize)]
pub struct ScrollQuery {
    pub limit: Option<usize>,
    pub cursor: Option<usize>,
    /// ISO timestamp identifying the browsing session; required so pool
    /// state and cursors stay scoped to one scroll rather than one user
    /// globally (spec §6.1).
    pub session: String,
    /// Defaults to a single-user deployment's implicit user, since auth
    /// has no counterpart in this spec (§1 Non-goals).
    pub user: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrollResponse {
    pub items: Vec<crate::model::FeedItem>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct DismissRequest {
    #[serde(rename = "itemIds")]
    pub item_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DismissResponse {
    pub dismissed: usize,
}

/// Structured error body for the handful of `FeedError` variants that
/// `is_surfaced()` — everything else is absorbed upstream and never
/// reaches a handler as an `Err`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        let code = match &err {
            FeedError::ConfigInvalid(_) => "CONFIG_INVALID",
            FeedError::InvalidRequest(_) => "INVALID_REQUEST",
            FeedError::Cancelled => "CANCELLED",
            FeedError::NotFound(_) => "NOT_FOUND",
            _ => "INTERNAL",
        };
        Self { code: code.to_string(), message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "INVALID_REQUEST" | "CONFIG_INVALID" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CANCELLED" => StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
