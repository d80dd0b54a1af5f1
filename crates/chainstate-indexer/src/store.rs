use anyhow::Result;
use async_trait::async_trait;
use chainstate_common::{Account, ChainStateSnapshot, CURRENT_CHAIN_STATE_ID};
use sqlx::PgPool;

/// Persistence used by the indexing pipeline.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or overwrite account rows. A row never replaces one observed at
    /// a later block.
    async fn upsert_accounts(&self, accounts: &[Account]) -> Result<()>;

    async fn count_holders(&self) -> Result<i64>;

    /// Most recent snapshot by block time.
    async fn latest_snapshot(&self) -> Result<Option<ChainStateSnapshot>>;

    /// Append to the history (no-op if the block already has one) and
    /// overwrite the current row, atomically.
    async fn save_snapshot(&self, snapshot: &ChainStateSnapshot) -> Result<()>;

    async fn last_indexed_block(&self) -> Result<Option<u64>>;

    async fn set_last_indexed_block(&self, height: u64) -> Result<()>;

    async fn truncate(&self) -> Result<()>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_accounts(&self, accounts: &[Account]) -> Result<()> {
        if accounts.is_empty() {
            return Ok(());
        }

        // Columnar so the whole window goes through UNNEST in one statement.
        // Balances are bound as strings and cast to numeric in SQL.
        let mut ids = Vec::with_capacity(accounts.len());
        let mut frees = Vec::with_capacity(accounts.len());
        let mut reserveds = Vec::with_capacity(accounts.len());
        let mut totals = Vec::with_capacity(accounts.len());
        let mut updated = Vec::with_capacity(accounts.len());
        for account in accounts {
            ids.push(account.id.clone());
            frees.push(account.free.to_string());
            reserveds.push(account.reserved.to_string());
            totals.push(account.total.to_string());
            updated.push(account.updated_at);
        }

        sqlx::query(
            "INSERT INTO accounts (id, free, reserved, total, updated_at)
             SELECT id, free::numeric, reserved::numeric, total::numeric, updated_at
             FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::bigint[])
                AS t(id, free, reserved, total, updated_at)
             ON CONFLICT (id) DO UPDATE SET
                free = EXCLUDED.free,
                reserved = EXCLUDED.reserved,
                total = EXCLUDED.total,
                updated_at = EXCLUDED.updated_at
             WHERE accounts.updated_at <= EXCLUDED.updated_at",
        )
        .bind(&ids)
        .bind(&frees)
        .bind(&reserveds)
        .bind(&totals)
        .bind(&updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_holders(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn latest_snapshot(&self) -> Result<Option<ChainStateSnapshot>> {
        let snapshot = sqlx::query_as(
            "SELECT id, block_number, block_hash, timestamp, council_members, council_proposals,
                    democracy_proposals, token_supply, token_holders
             FROM chain_state
             ORDER BY timestamp DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }

    async fn save_snapshot(&self, snapshot: &ChainStateSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO chain_state (id, block_number, block_hash, timestamp, council_members,
                council_proposals, democracy_proposals, token_supply, token_holders)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&snapshot.id)
        .bind(snapshot.block_number)
        .bind(&snapshot.block_hash)
        .bind(snapshot.timestamp)
        .bind(snapshot.council_members)
        .bind(snapshot.council_proposals)
        .bind(snapshot.democracy_proposals)
        .bind(&snapshot.token_supply)
        .bind(snapshot.token_holders)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO current_chain_state (id, block_number, block_hash, timestamp, council_members,
                council_proposals, democracy_proposals, token_supply, token_holders)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                block_number = EXCLUDED.block_number,
                block_hash = EXCLUDED.block_hash,
                timestamp = EXCLUDED.timestamp,
                council_members = EXCLUDED.council_members,
                council_proposals = EXCLUDED.council_proposals,
                democracy_proposals = EXCLUDED.democracy_proposals,
                token_supply = EXCLUDED.token_supply,
                token_holders = EXCLUDED.token_holders",
        )
        .bind(CURRENT_CHAIN_STATE_ID)
        .bind(snapshot.block_number)
        .bind(&snapshot.block_hash)
        .bind(snapshot.timestamp)
        .bind(snapshot.council_members)
        .bind(snapshot.council_proposals)
        .bind(snapshot.democracy_proposals)
        .bind(&snapshot.token_supply)
        .bind(snapshot.token_holders)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn last_indexed_block(&self) -> Result<Option<u64>> {
        let result: Option<(String,)> = sqlx::query_as(
            "SELECT value FROM indexer_state WHERE key = 'last_indexed_block'"
        )
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some((value,)) => Ok(Some(value.parse()?)),
            None => Ok(None),
        }
    }

    async fn set_last_indexed_block(&self, height: u64) -> Result<()> {
        sqlx::query(
            "INSERT INTO indexer_state (key, value, updated_at)
             VALUES ('last_indexed_block', $1, NOW())
             ON CONFLICT (key) DO UPDATE SET value = $1, updated_at = NOW()"
        )
        .bind(height.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        sqlx::query("TRUNCATE accounts, chain_state, current_chain_state, indexer_state")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
