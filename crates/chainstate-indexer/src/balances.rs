use anyhow::{Context, Result};

use crate::chains::{BALANCES_ACCOUNT, FREE_BALANCE, RESERVED_BALANCE, SYSTEM_ACCOUNT};
use crate::codec::storage::StorageSchema;
use crate::codec::{AccountBalance, AccountId, RuntimeFingerprint, SchemaError, SchemaTable, StorageHasher};
use crate::source::ChainSource;

/// How a runtime stores account balances, richest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Representation<'s> {
    /// `System.Account`: balance nested in the account info record.
    SystemAccount(&'s StorageSchema),
    /// `Balances.Account`: free and reserved in one record.
    BalancesAccount(&'s StorageSchema),
    /// `Balances.FreeBalance` and `Balances.ReservedBalance`, either of which
    /// may be missing from the runtime.
    Split {
        free: Option<&'s StorageSchema>,
        reserved: Option<&'s StorageSchema>,
    },
}

pub(crate) fn select_representation<'s>(
    storage: &'s SchemaTable<StorageSchema>,
    runtime: &RuntimeFingerprint,
) -> Result<Representation<'s>, SchemaError> {
    if let Some(schema) = storage.resolve(SYSTEM_ACCOUNT, runtime)? {
        return Ok(Representation::SystemAccount(schema));
    }
    if let Some(schema) = storage.resolve(BALANCES_ACCOUNT, runtime)? {
        return Ok(Representation::BalancesAccount(schema));
    }

    let free = storage.resolve(FREE_BALANCE, runtime)?;
    let reserved = storage.resolve(RESERVED_BALANCE, runtime)?;
    if free.is_none() && reserved.is_none() {
        return Err(SchemaError::UnknownSchemaVersion {
            item: SYSTEM_ACCOUNT.to_string(),
            type_hash: format!("none (no balance storage in runtime {})", runtime.spec_version),
        });
    }
    Ok(Representation::Split { free, reserved })
}

/// Reads authoritative balances for a set of accounts at one block.
pub struct BalanceFetcher<'a, S: ?Sized> {
    source: &'a S,
    storage: &'a SchemaTable<StorageSchema>,
}

impl<'a, S: ChainSource + ?Sized> BalanceFetcher<'a, S> {
    pub fn new(source: &'a S, storage: &'a SchemaTable<StorageSchema>) -> Self {
        Self { source, storage }
    }

    /// Balances aligned with `accounts`. Accounts without storage are zero.
    pub async fn fetch(
        &self,
        block_hash: &str,
        runtime: &RuntimeFingerprint,
        accounts: &[AccountId],
    ) -> Result<Vec<AccountBalance>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        match select_representation(self.storage, runtime)? {
            Representation::SystemAccount(schema) => {
                self.read_records(block_hash, runtime, SYSTEM_ACCOUNT, schema, accounts).await
            }
            Representation::BalancesAccount(schema) => {
                self.read_records(block_hash, runtime, BALANCES_ACCOUNT, schema, accounts).await
            }
            Representation::Split { free, reserved } => {
                let (free, reserved) = tokio::try_join!(
                    self.read_amounts(block_hash, runtime, FREE_BALANCE, free, accounts),
                    self.read_amounts(block_hash, runtime, RESERVED_BALANCE, reserved, accounts),
                )?;
                Ok(free
                    .into_iter()
                    .zip(reserved)
                    .map(|(free, reserved)| AccountBalance { free, reserved })
                    .collect())
            }
        }
    }

    async fn read_records(
        &self,
        block_hash: &str,
        runtime: &RuntimeFingerprint,
        item: &str,
        schema: &StorageSchema,
        accounts: &[AccountId],
    ) -> Result<Vec<AccountBalance>> {
        let values = self.read(block_hash, runtime, item, schema, accounts).await?;
        values
            .into_iter()
            .map(|value| -> Result<AccountBalance> {
                match value {
                    Some(bytes) => Ok(schema.decode_balance(item, &bytes)?),
                    None => Ok(AccountBalance::default()),
                }
            })
            .collect()
    }

    async fn read_amounts(
        &self,
        block_hash: &str,
        runtime: &RuntimeFingerprint,
        item: &str,
        schema: Option<&StorageSchema>,
        accounts: &[AccountId],
    ) -> Result<Vec<u128>> {
        let Some(schema) = schema else {
            return Ok(vec![0; accounts.len()]);
        };
        let values = self.read(block_hash, runtime, item, schema, accounts).await?;
        values
            .into_iter()
            .map(|value| -> Result<u128> {
                match value {
                    Some(bytes) => Ok(schema.decode_amount(item, &bytes)?),
                    None => Ok(0),
                }
            })
            .collect()
    }

    async fn read(
        &self,
        block_hash: &str,
        runtime: &RuntimeFingerprint,
        item: &str,
        schema: &StorageSchema,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<Vec<u8>>>> {
        let hasher = runtime
            .storage_hashers
            .get(item)
            .copied()
            .or(schema.hasher)
            .unwrap_or(StorageHasher::Blake2_128Concat);

        let values = self
            .source
            .storage_map(block_hash, item, hasher, accounts)
            .await
            .with_context(|| format!("Failed to read {} for {} accounts", item, accounts.len()))?;

        anyhow::ensure!(
            values.len() == accounts.len(),
            "{} returned {} values for {} accounts",
            item,
            values.len(),
            accounts.len()
        );
        Ok(values)
    }
}
