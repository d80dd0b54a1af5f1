use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use chainstate_common::{Account, ChainStateError, Pagination, PaginatedResponse, RankedAccount};
use crate::error::ApiResult;
use crate::handlers::get_table_count;
use crate::AppState;

/// GET /api/accounts - Accounts by total balance, richest first.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<PaginatedResponse<Account>>> {
    let total = get_table_count(&state.pool, "accounts").await?;

    let accounts: Vec<Account> = sqlx::query_as(
        "SELECT id, free, reserved, total, updated_at
         FROM accounts
         ORDER BY total DESC, id
         LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(pagination.respond(accounts, total)))
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    let id = normalize_account_id(&id)?;

    let account: Account = sqlx::query_as(
        "SELECT id, free, reserved, total, updated_at
         FROM accounts
         WHERE id = $1",
    )
    .bind(&id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ChainStateError::NotFound(format!("Account {} not found", id)))?;

    Ok(Json(account))
}

/// GET /api/accounts/{id}/rank - Position of an account by total balance.
/// Ties share a rank.
pub async fn get_account_rank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RankedAccount>> {
    let id = normalize_account_id(&id)?;

    let ranked: RankedAccount = sqlx::query_as(
        "SELECT rank, id, free, reserved, total, updated_at
         FROM (
             SELECT id, free, reserved, total, updated_at,
                    RANK() OVER (ORDER BY total DESC) AS rank
             FROM accounts
         ) ranked
         WHERE id = $1",
    )
    .bind(&id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ChainStateError::NotFound(format!("Account {} not found", id)))?;

    Ok(Json(ranked))
}

/// Validate a path account id. Hex ids are lowercased; SS58 ids are case
/// sensitive and kept as given.
fn normalize_account_id(id: &str) -> Result<String, ChainStateError> {
    let id = id.trim();
    if let Some(hex) = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
        if !matches!(hex.len(), 40 | 64) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChainStateError::InvalidInput(format!("Invalid hex account id {}", id)));
        }
        return Ok(format!("0x{}", hex.to_lowercase()));
    }

    if id.is_empty() || id.len() > 64 || bs58::decode(id).into_vec().is_err() {
        return Err(ChainStateError::InvalidInput(format!("Invalid account id {}", id)));
    }
    Ok(id.to_string())
}
