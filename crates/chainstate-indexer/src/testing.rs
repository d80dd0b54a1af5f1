//! In-memory collaborators for pipeline tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chainstate_common::{Account, ChainStateSnapshot};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::codec::{AccountId, RuntimeFingerprint, StorageHasher};
use crate::source::{Block, ChainSource};
use crate::store::Store;

#[derive(Default)]
pub(crate) struct MemoryStore {
    accounts: Mutex<BTreeMap<String, Account>>,
    history: Mutex<BTreeMap<String, ChainStateSnapshot>>,
    current: Mutex<Option<ChainStateSnapshot>>,
    cursor: Mutex<Option<u64>>,
}

impl MemoryStore {
    pub(crate) fn accounts(&self) -> BTreeMap<String, Account> {
        self.accounts.lock().unwrap().clone()
    }

    pub(crate) fn history(&self) -> Vec<ChainStateSnapshot> {
        self.history.lock().unwrap().values().cloned().collect()
    }

    pub(crate) fn current_snapshot(&self) -> Option<ChainStateSnapshot> {
        self.current.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_accounts(&self, accounts: &[Account]) -> Result<()> {
        let mut rows = self.accounts.lock().unwrap();
        for account in accounts {
            match rows.get(&account.id) {
                Some(existing) if existing.updated_at > account.updated_at => {}
                _ => {
                    rows.insert(account.id.clone(), account.clone());
                }
            }
        }
        Ok(())
    }

    async fn count_holders(&self) -> Result<i64> {
        Ok(self.accounts.lock().unwrap().len() as i64)
    }

    async fn latest_snapshot(&self) -> Result<Option<ChainStateSnapshot>> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .values()
            .max_by_key(|s| s.timestamp)
            .cloned())
    }

    async fn save_snapshot(&self, snapshot: &ChainStateSnapshot) -> Result<()> {
        self.history
            .lock()
            .unwrap()
            .entry(snapshot.id.clone())
            .or_insert_with(|| snapshot.clone());
        *self.current.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    async fn last_indexed_block(&self) -> Result<Option<u64>> {
        Ok(*self.cursor.lock().unwrap())
    }

    async fn set_last_indexed_block(&self, height: u64) -> Result<()> {
        *self.cursor.lock().unwrap() = Some(height);
        Ok(())
    }

    async fn truncate(&self) -> Result<()> {
        self.accounts.lock().unwrap().clear();
        self.history.lock().unwrap().clear();
        *self.current.lock().unwrap() = None;
        *self.cursor.lock().unwrap() = None;
        Ok(())
    }
}

/// Serves fixed blocks, runtimes and state. Storage is the same at every block.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    blocks: Mutex<BTreeMap<u64, Block>>,
    runtimes: Mutex<HashMap<u32, RuntimeFingerprint>>,
    maps: Mutex<HashMap<(String, Vec<u8>), Vec<u8>>>,
    values: Mutex<HashMap<String, Vec<u8>>>,
    storage_reads: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn add_block(&self, block: Block) {
        self.blocks.lock().unwrap().insert(block.header.height, block);
    }

    pub(crate) fn add_runtime(&self, runtime: RuntimeFingerprint) {
        self.runtimes.lock().unwrap().insert(runtime.spec_version, runtime);
    }

    pub(crate) fn set_map(&self, item: &str, account: &[u8], value: Vec<u8>) {
        self.maps
            .lock()
            .unwrap()
            .insert((item.to_string(), account.to_vec()), value);
    }

    pub(crate) fn set_value(&self, item: &str, value: Vec<u8>) {
        self.values.lock().unwrap().insert(item.to_string(), value);
    }

    /// Number of bulk storage map reads served.
    pub(crate) fn storage_reads(&self) -> usize {
        self.storage_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainSource for ScriptedSource {
    async fn finalized_height(&self) -> Result<u64> {
        Ok(self.blocks.lock().unwrap().keys().next_back().copied().unwrap_or(0))
    }

    async fn blocks(&self, from: u64, to: u64) -> Result<Vec<Block>> {
        let blocks = self.blocks.lock().unwrap();
        (from..=to)
            .map(|h| blocks.get(&h).cloned().ok_or_else(|| anyhow!("No block {}", h)))
            .collect()
    }

    async fn runtime(&self, spec_version: u32) -> Result<RuntimeFingerprint> {
        self.runtimes
            .lock()
            .unwrap()
            .get(&spec_version)
            .cloned()
            .ok_or_else(|| anyhow!("No runtime {}", spec_version))
    }

    async fn storage_map(
        &self,
        _block_hash: &str,
        item: &str,
        _hasher: StorageHasher,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        self.storage_reads.fetch_add(1, Ordering::SeqCst);
        let maps = self.maps.lock().unwrap();
        Ok(accounts
            .iter()
            .map(|a| maps.get(&(item.to_string(), a.as_bytes().to_vec())).cloned())
            .collect())
    }

    async fn storage_value(&self, _block_hash: &str, item: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.lock().unwrap().get(item).cloned())
    }
}
