use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use tokio_util::sync::CancellationToken;

use crate::pool::{GetBatchRequest, SessionKey};

use super::types::{AppState, ApiResult, DismissRequest, DismissResponse, ScrollQuery, ScrollResponse};

/// `GET /feed/scroll?limit=N&cursor=C&session=<iso>&filter=<expr>` (spec
/// §6.1). `cursor` is accepted but only its presence/absence matters to
/// the Pool Manager — it decides refill, not slicing.
pub async fn get_scroll(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScrollQuery>,
) -> ApiResult<Json<ScrollResponse>> {
    let session = SessionKey::new(query.user.unwrap_or_else(|| "default".to_string()), query.session);
    let req = GetBatchRequest {
        session,
        limit: query.limit,
        cursor: query.cursor,
        filter: query.filter,
    };
    let batch = state.pool_manager.get_batch(req, CancellationToken::new()).await?;
    Ok(Json(ScrollResponse {
        items: batch.items,
        next_cursor: batch.next_cursor,
        has_more: batch.has_more,
    }))
}

/// `POST /feed/scroll/dismiss` body `{itemIds: [...]}` (spec §6.1).
pub async fn post_dismiss(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DismissRequest>,
) -> ApiResult<Json<DismissResponse>> {
    let outcome = state.pool_manager.dismiss(body.item_ids).await?;
    Ok(Json(DismissResponse { dismissed: outcome.dismissed }))
}
