use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use chainstate_common::{ChainStateError, ChainStateSnapshot, Pagination, PaginatedResponse, CURRENT_CHAIN_STATE_ID};
use crate::error::ApiResult;
use crate::handlers::get_table_count;
use crate::AppState;

/// GET /api/chain-state/current - Most recent snapshot.
pub async fn get_current(State(state): State<Arc<AppState>>) -> ApiResult<Json<ChainStateSnapshot>> {
    let snapshot: ChainStateSnapshot = sqlx::query_as(
        "SELECT id, block_number, block_hash, timestamp, council_members, council_proposals,
                democracy_proposals, token_supply, token_holders
         FROM current_chain_state
         WHERE id = $1",
    )
    .bind(CURRENT_CHAIN_STATE_ID)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ChainStateError::NotFound("No chain state snapshot yet".to_string()))?;

    Ok(Json(snapshot))
}

/// GET /api/chain-state - Snapshot history, newest first.
pub async fn list_snapshots(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<PaginatedResponse<ChainStateSnapshot>>> {
    let total = get_table_count(&state.pool, "chain_state").await?;

    let snapshots: Vec<ChainStateSnapshot> = sqlx::query_as(
        "SELECT id, block_number, block_hash, timestamp, council_members, council_proposals,
                democracy_proposals, token_supply, token_holders
         FROM chain_state
         ORDER BY timestamp DESC
         LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(pagination.respond(snapshots, total)))
}
