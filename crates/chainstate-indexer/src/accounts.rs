use anyhow::{anyhow, Result};
use chainstate_common::{Account, ChainDescriptor};
use std::collections::BTreeMap;

use crate::codec::{AccountBalance, AccountId};
use crate::store::Store;

/// Build account rows for balances observed at `block_number`.
///
/// Ids are encoded for display with the chain's address format. Duplicate
/// ids keep the last observation.
pub fn account_rows(
    chain: &ChainDescriptor,
    block_number: u64,
    observations: &[(AccountId, AccountBalance)],
) -> Result<Vec<Account>> {
    let mut rows = BTreeMap::new();
    for (account, balance) in observations {
        let id = chain.encode_account(account.as_bytes());
        let row = Account::observed(id.clone(), balance.free, balance.reserved, block_number)
            .ok_or_else(|| anyhow!("Balance of {} overflows: {} + {}", id, balance.free, balance.reserved))?;
        rows.insert(id, row);
    }
    Ok(rows.into_values().collect())
}

/// Writes balance observations.
pub struct AccountStore<'a, S: ?Sized> {
    store: &'a S,
    chain: &'static ChainDescriptor,
}

impl<'a, S: Store + ?Sized> AccountStore<'a, S> {
    pub fn new(store: &'a S, chain: &'static ChainDescriptor) -> Self {
        Self { store, chain }
    }

    /// Upsert one row per account. Returns the number of rows written.
    pub async fn save(&self, block_number: u64, observations: &[(AccountId, AccountBalance)]) -> Result<usize> {
        let rows = account_rows(self.chain, block_number, observations)?;
        self.store.upsert_accounts(&rows).await?;
        Ok(rows.len())
    }
}
