use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use chainstate_common::ChainDescriptor;
use crate::error::ApiResult;
use crate::handlers::get_table_count;
use crate::AppState;

#[derive(Serialize)]
pub struct IndexerStatus {
    pub chain: &'static str,
    pub last_indexed_block: Option<i64>,
    pub indexed_at: Option<String>,
    pub total_accounts: i64,
    pub total_snapshots: i64,
}

/// GET /api/chain - Static description of the indexed chain.
pub async fn get_chain(State(state): State<Arc<AppState>>) -> Json<&'static ChainDescriptor> {
    Json(state.chain)
}

/// GET /api/status - Indexer progress and table sizes.
pub async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<IndexerStatus>> {
    let cursor: Option<(String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        "SELECT value, updated_at FROM indexer_state WHERE key = 'last_indexed_block'",
    )
    .fetch_optional(&state.pool)
    .await?;

    let total_accounts = get_table_count(&state.pool, "accounts").await?;
    let total_snapshots = get_table_count(&state.pool, "chain_state").await?;

    Ok(Json(IndexerStatus {
        chain: state.chain.name.as_str(),
        last_indexed_block: cursor.as_ref().and_then(|(value, _)| value.parse().ok()),
        indexed_at: cursor.map(|(_, at)| at.to_rfc3339()),
        total_accounts,
        total_snapshots,
    }))
}
