pub mod accounts;
pub mod chain;
pub mod snapshots;

use sqlx::PgPool;

/// Row count of `table`.
/// Large tables use the planner's estimate instead of a full COUNT(*) scan.
pub async fn get_table_count(pool: &PgPool, table: &'static str) -> Result<i64, sqlx::Error> {
    let estimate: (Option<f32>,) = sqlx::query_as("SELECT reltuples FROM pg_class WHERE relname = $1")
        .bind(table)
        .fetch_optional(pool)
        .await?
        .unwrap_or((None,));

    match estimate.0 {
        Some(n) if n > 100_000.0 => Ok(n as i64),
        _ => {
            let exact: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(pool)
                .await?;
            Ok(exact.0)
        }
    }
}
