use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::codec::{AccountId, RuntimeFingerprint, StorageHasher};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub height: u64,
    pub hash: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub spec_version: u32,
}

/// One call or event, in block order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockItem {
    Event {
        name: String,
        /// SCALE-encoded event payload, hex.
        args: String,
    },
    Call {
        name: String,
        /// Index of the enclosing call; `None` for top-level calls.
        #[serde(default)]
        parent: Option<u32>,
        #[serde(default)]
        origin: Option<serde_json::Value>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub items: Vec<BlockItem>,
}

/// Where blocks, runtime descriptions and state come from.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn finalized_height(&self) -> Result<u64>;

    /// Blocks `from..=to`, in height order.
    async fn blocks(&self, from: u64, to: u64) -> Result<Vec<Block>>;

    async fn runtime(&self, spec_version: u32) -> Result<RuntimeFingerprint>;

    /// Read one storage map entry per account at `block_hash`, aligned with `accounts`.
    async fn storage_map(
        &self,
        block_hash: &str,
        item: &str,
        hasher: StorageHasher,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<Vec<u8>>>>;

    async fn storage_value(&self, block_hash: &str, item: &str) -> Result<Option<Vec<u8>>>;
}
