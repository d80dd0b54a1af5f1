use anyhow::{Context, Result};
use chainstate_common::ChainName;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub chain: ChainName,
    pub archive_url: String,
    pub chain_rpc_url: String,
    pub rpc_requests_per_second: u32,
    pub start_block: u64,
    pub batch_size: u64,
    pub reindex: bool,
    pub snapshot_period_secs: i64,
    pub storage_query_chunk: usize,
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DB_MAX_CONNECTIONS")?,
            chain: env::var("CHAIN")
                .context("CHAIN must be set")?
                .parse()
                .context("Invalid CHAIN")?,
            archive_url: env::var("ARCHIVE_URL")
                .context("ARCHIVE_URL must be set")?,
            chain_rpc_url: env::var("CHAIN_RPC_URL")
                .context("CHAIN_RPC_URL must be set")?,
            rpc_requests_per_second: env::var("RPC_REQUESTS_PER_SECOND")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .context("Invalid RPC_REQUESTS_PER_SECOND")?,
            start_block: env::var("START_BLOCK")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("Invalid START_BLOCK")?,
            batch_size: env::var("BATCH_SIZE")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("Invalid BATCH_SIZE")?,
            reindex: env::var("REINDEX")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("Invalid REINDEX")?,
            snapshot_period_secs: env::var("SNAPSHOT_PERIOD_SECS")
                .unwrap_or_else(|_| "43200".to_string())
                .parse()
                .context("Invalid SNAPSHOT_PERIOD_SECS")?,
            storage_query_chunk: env::var("STORAGE_QUERY_CHUNK")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("Invalid STORAGE_QUERY_CHUNK")?,
            metrics_addr: env::var("METRICS_ADDR")
                .ok()
                .map(|addr| addr.parse())
                .transpose()
                .context("Invalid METRICS_ADDR")?,
        })
    }
}
