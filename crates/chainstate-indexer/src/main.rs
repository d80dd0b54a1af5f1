use anyhow::Result;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod accounts;
mod balances;
mod batch;
mod chains;
mod codec;
mod collector;
mod config;
mod indexer;
mod rpc;
mod snapshot;
mod source;
mod store;
#[cfg(test)]
mod testing;

use codec::SchemaError;

/// Retry delays for exponential backoff (in seconds)
const RETRY_DELAYS: &[u64] = &[5, 10, 20, 30, 60];
const MAX_RETRY_DELAY: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "chainstate_indexer=info,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chainstate indexer");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    if let Some(addr) = config.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!("Serving metrics on {}", addr);
    }

    // Create database pool
    let pool = chainstate_common::db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    tracing::info!("Running database migrations");
    chainstate_common::db::run_migrations(&pool).await?;

    let source = rpc::ArchiveSource::new(
        &config.archive_url,
        &config.chain_rpc_url,
        config.rpc_requests_per_second,
        config.storage_query_chunk,
    );
    let indexer = indexer::Indexer::new(
        source,
        store::PgStore::new(pool),
        chains::for_chain(config.chain),
        indexer::IndexerOptions::from_config(&config),
    );

    run_with_retry(|| indexer.run()).await
}

/// Run an async function with exponential backoff retry.
/// RPC errors are retried inside the client; this loop restarts the run after
/// DB failures and exhausted RPC retries. Schema errors halt the process.
async fn run_with_retry<F, Fut>(f: F) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let mut retry_count = 0;

    loop {
        match f().await {
            Ok(()) => {
                retry_count = 0;
            }
            Err(e) if e.downcast_ref::<SchemaError>().is_some() => {
                tracing::error!("Halting on schema error: {:#}", e);
                return Err(e);
            }
            Err(e) => {
                let delay = RETRY_DELAYS
                    .get(retry_count)
                    .copied()
                    .unwrap_or(MAX_RETRY_DELAY);

                tracing::error!(
                    "Fatal error (internal retries exhausted): {:#}. Restarting in {}s (attempt {})...",
                    e,
                    delay,
                    retry_count + 1
                );

                tokio::time::sleep(Duration::from_secs(delay)).await;
                retry_count += 1;
            }
        }
    }
}
