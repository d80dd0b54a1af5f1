use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::hashing::{map_key, storage_prefix, to_hex};
use crate::codec::{AccountId, RuntimeFingerprint, StorageHasher};
use crate::source::{Block, ChainSource};

/// Retry delays for RPC calls (in seconds)
const RPC_RETRY_DELAYS: &[u64] = &[2, 5, 10, 20, 30];
const RPC_MAX_RETRIES: usize = 10;

pub(crate) type SharedRateLimiter = Arc<RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>;

pub(crate) fn rate_limiter(requests_per_second: u32) -> SharedRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN.saturating_add(99));
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// JSON-RPC 2.0 over HTTP with rate limiting and retry on transport errors.
#[derive(Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: String,
    rate_limiter: SharedRateLimiter,
}

impl RpcClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>, rate_limiter: SharedRateLimiter) -> Self {
        Self {
            client,
            url: url.into(),
            rate_limiter,
        }
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self.send_with_retry(method, &request).await?;

        if let Some(error) = response.get("error") {
            bail!("RPC error from {}: {}", method, error);
        }
        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("No result in response to {}", method))?;

        serde_json::from_value(result).with_context(|| format!("Failed to parse {} result", method))
    }

    async fn send_with_retry(&self, method: &str, request: &serde_json::Value) -> Result<serde_json::Value> {
        let mut last_error: Option<String> = None;

        for attempt in 0..RPC_MAX_RETRIES {
            // Every attempt, retries included, takes a rate limiter permit
            self.rate_limiter.until_ready().await;
            let outcome = match self.client.post(&self.url).json(request).send().await {
                Ok(resp) => resp
                    .json::<serde_json::Value>()
                    .await
                    .map_err(|e| format!("Failed to parse response: {}", e)),
                Err(e) => Err(format!("HTTP request failed: {}", e)),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!("{} succeeded after {} retries", method, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    let delay = RPC_RETRY_DELAYS
                        .get(attempt)
                        .copied()
                        .unwrap_or(*RPC_RETRY_DELAYS.last().unwrap_or(&30));

                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}s...",
                        method,
                        attempt + 1,
                        RPC_MAX_RETRIES,
                        e,
                        delay
                    );

                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
            }
        }

        Err(anyhow!(
            "{} failed after {} retries: {}",
            method,
            RPC_MAX_RETRIES,
            last_error.unwrap_or_else(|| "Unknown error".to_string())
        ))
    }
}

#[derive(Debug, Deserialize)]
struct StorageChangeSet {
    changes: Vec<(String, Option<String>)>,
}

/// Blocks and runtime descriptions from the archive gateway, state from a
/// chain node.
pub struct ArchiveSource {
    archive: RpcClient,
    node: RpcClient,
    storage_chunk: usize,
}

impl ArchiveSource {
    pub fn new(archive_url: &str, node_url: &str, requests_per_second: u32, storage_chunk: usize) -> Self {
        let client = reqwest::Client::new();
        let limiter = rate_limiter(requests_per_second);
        tracing::info!("Rate limiting RPC requests to {} req/sec", requests_per_second);

        Self {
            archive: RpcClient::new(client.clone(), archive_url, Arc::clone(&limiter)),
            node: RpcClient::new(client, node_url, limiter),
            storage_chunk: storage_chunk.max(1),
        }
    }

    async fn query_storage_at(&self, keys: &[String], block_hash: &str) -> Result<Vec<StorageChangeSet>> {
        self.node
            .call("state_queryStorageAt", serde_json::json!([keys, block_hash]))
            .await
    }
}

fn decode_value(key: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim_start_matches("0x")).with_context(|| format!("Invalid storage value for key {}", key))
}

#[async_trait]
impl ChainSource for ArchiveSource {
    async fn finalized_height(&self) -> Result<u64> {
        self.archive.call("archive_finalizedHeight", serde_json::json!([])).await
    }

    async fn blocks(&self, from: u64, to: u64) -> Result<Vec<Block>> {
        tracing::debug!("Fetching blocks {} to {}", from, to);
        let mut blocks: Vec<Block> = self.archive.call("archive_blocks", serde_json::json!([from, to])).await?;
        blocks.sort_by_key(|b| b.header.height);

        let expected = (to - from + 1) as usize;
        if blocks.len() != expected {
            bail!("Archive returned {} blocks for range {}..={}, expected {}", blocks.len(), from, to, expected);
        }
        if let Some((block, height)) = blocks.iter().zip(from..=to).find(|(b, h)| b.header.height != *h) {
            bail!(
                "Archive returned block {} for range {}..={}, expected {}",
                block.header.height,
                from,
                to,
                height
            );
        }
        Ok(blocks)
    }

    async fn runtime(&self, spec_version: u32) -> Result<RuntimeFingerprint> {
        self.archive.call("archive_runtime", serde_json::json!([spec_version])).await
    }

    async fn storage_map(
        &self,
        block_hash: &str,
        item: &str,
        hasher: StorageHasher,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = accounts
            .iter()
            .map(|account| to_hex(&map_key(item, hasher, account.as_bytes())))
            .collect();

        let chunks = keys
            .chunks(self.storage_chunk)
            .map(|chunk| self.query_storage_at(chunk, block_hash));
        let change_sets = futures::future::try_join_all(chunks)
            .await
            .with_context(|| format!("Failed to read {} at {}", item, block_hash))?;

        let values: HashMap<String, Option<String>> = change_sets
            .into_iter()
            .flatten()
            .flat_map(|set| set.changes)
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();

        keys.iter()
            .map(|key| match values.get(key) {
                Some(Some(value)) => decode_value(key, value).map(Some),
                _ => Ok(None),
            })
            .collect()
    }

    async fn storage_value(&self, block_hash: &str, item: &str) -> Result<Option<Vec<u8>>> {
        let key = to_hex(&storage_prefix(item));
        let value: Option<String> = self
            .node
            .call("state_getStorage", serde_json::json!([key, block_hash]))
            .await?;
        value.map(|v| decode_value(&key, &v)).transpose()
    }
}
