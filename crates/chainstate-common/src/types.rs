use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Key of the single `current_chain_state` row.
pub const CURRENT_CHAIN_STATE_ID: &str = "0";

/// Account balance as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: String,
    pub free: BigDecimal,
    pub reserved: BigDecimal,
    pub total: BigDecimal,
    pub updated_at: i64,
}

impl Account {
    /// Build a row from an observed balance. `total` is always derived here,
    /// never taken from the caller.
    pub fn observed(id: String, free: u128, reserved: u128, block_number: u64) -> Option<Self> {
        let total = free.checked_add(reserved)?;
        Some(Self {
            id,
            free: to_numeric(free),
            reserved: to_numeric(reserved),
            total: to_numeric(total),
            updated_at: block_number as i64,
        })
    }
}

/// Account together with its position when ordered by total balance
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RankedAccount {
    pub rank: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub account: Account,
}

/// Aggregate chain metrics taken at one block.
/// Used for both the `chain_state` history rows and the `current_chain_state` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChainStateSnapshot {
    pub id: String,
    pub block_number: i64,
    pub block_hash: String,
    pub timestamp: DateTime<Utc>,
    pub council_members: i32,
    pub council_proposals: i32,
    pub democracy_proposals: i32,
    pub token_supply: BigDecimal,
    pub token_holders: i64,
}

/// Stable identifier of a block: zero-padded height plus a hash prefix,
/// so ids sort by height.
pub fn block_id(height: u64, hash: &str) -> String {
    let hash = hash.trim_start_matches("0x");
    let short = hash.get(..5).unwrap_or(hash);
    format!("{:010}-{}", height, short)
}

/// Convert an on-chain balance to a NUMERIC value without going through floats.
pub fn to_numeric(value: u128) -> BigDecimal {
    BigDecimal::new(BigInt::from(value), 0)
}

/// Pagination parameters
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    20
}

const MAX_PAGE_SIZE: u32 = 100;

impl Pagination {
    /// Rows to skip. Uses the capped page size, so pages never overlap or skip rows.
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.limit.min(MAX_PAGE_SIZE) as i64
    }

    /// Wrap one page of rows, reporting the page size actually applied.
    pub fn respond<T>(&self, data: Vec<T>, total: i64) -> PaginatedResponse<T> {
        PaginatedResponse::new(data, self.page, self.limit.min(MAX_PAGE_SIZE), total)
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32, total: i64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as u32
        };
        Self {
            data,
            page,
            limit,
            total,
            total_pages,
        }
    }
}
