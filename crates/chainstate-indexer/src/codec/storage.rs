//! Storage items read by the balance fetcher and the snapshotter.

use parity_scale_codec::{Decode, Encode};

use super::events::AccountWidth;
use super::{decode_exact, AccountBalance, AccountId, SchemaError, StorageHasher};

#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct AccountData {
    pub free: u128,
    pub reserved: u128,
    pub misc_frozen: u128,
    pub fee_frozen: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AccountInfoRefCountU8 {
    pub nonce: u32,
    pub refcount: u8,
    pub data: AccountData,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AccountInfoRefCountU32 {
    pub nonce: u32,
    pub refcount: u32,
    pub data: AccountData,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AccountInfoDualRefCount {
    pub nonce: u32,
    pub consumers: u32,
    pub providers: u32,
    pub data: AccountData,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AccountInfoTripleRefCount {
    pub nonce: u32,
    pub consumers: u32,
    pub providers: u32,
    pub sufficients: u32,
    pub data: AccountData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageShape {
    AccountInfoRefCountU8,
    AccountInfoRefCountU32,
    AccountInfoDualRefCount,
    AccountInfoTripleRefCount,
    AccountData,
    /// A bare `u128` balance.
    Balance,
    /// `Vec<AccountId>`
    Members,
    /// A `u32` counter.
    Count,
}

/// Decoded value of a storage entry in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRecord {
    Balance(AccountBalance),
    Amount(u128),
    Members(Vec<AccountId>),
    Count(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSchema {
    pub shape: StorageShape,
    /// Key hasher for maps; `None` for plain values.
    pub hasher: Option<StorageHasher>,
    pub width: AccountWidth,
}

impl StorageSchema {
    pub const fn value(shape: StorageShape, width: AccountWidth) -> Self {
        Self { shape, hasher: None, width }
    }

    pub const fn map(shape: StorageShape, hasher: StorageHasher, width: AccountWidth) -> Self {
        Self { shape, hasher: Some(hasher), width }
    }

    pub fn decode(&self, item: &str, bytes: &[u8]) -> Result<StorageRecord, SchemaError> {
        let record = match self.shape {
            StorageShape::AccountInfoRefCountU8 => {
                balance_of(&decode_exact::<AccountInfoRefCountU8>(item, bytes)?.data)
            }
            StorageShape::AccountInfoRefCountU32 => {
                balance_of(&decode_exact::<AccountInfoRefCountU32>(item, bytes)?.data)
            }
            StorageShape::AccountInfoDualRefCount => {
                balance_of(&decode_exact::<AccountInfoDualRefCount>(item, bytes)?.data)
            }
            StorageShape::AccountInfoTripleRefCount => {
                balance_of(&decode_exact::<AccountInfoTripleRefCount>(item, bytes)?.data)
            }
            StorageShape::AccountData => balance_of(&decode_exact::<AccountData>(item, bytes)?),
            StorageShape::Balance => StorageRecord::Amount(decode_exact::<u128>(item, bytes)?),
            StorageShape::Count => StorageRecord::Count(decode_exact::<u32>(item, bytes)?),
            StorageShape::Members => StorageRecord::Members(match self.width {
                AccountWidth::Id32 => members::<[u8; 32]>(item, bytes)?,
                AccountWidth::Id20 => members::<[u8; 20]>(item, bytes)?,
            }),
        };
        Ok(record)
    }

    /// Decode an entry that must carry free and reserved balance.
    pub fn decode_balance(&self, item: &str, bytes: &[u8]) -> Result<AccountBalance, SchemaError> {
        match self.decode(item, bytes)? {
            StorageRecord::Balance(balance) => Ok(balance),
            other => Err(shape_mismatch(item, "account balance", &other)),
        }
    }

    /// Decode a plain `u128` amount.
    pub fn decode_amount(&self, item: &str, bytes: &[u8]) -> Result<u128, SchemaError> {
        match self.decode(item, bytes)? {
            StorageRecord::Amount(amount) => Ok(amount),
            other => Err(shape_mismatch(item, "amount", &other)),
        }
    }

    /// Decode a counter, or the length of a member list.
    pub fn decode_count(&self, item: &str, bytes: &[u8]) -> Result<u32, SchemaError> {
        match self.decode(item, bytes)? {
            StorageRecord::Count(count) => Ok(count),
            StorageRecord::Members(members) => Ok(members.len() as u32),
            other => Err(shape_mismatch(item, "count", &other)),
        }
    }
}

fn balance_of(data: &AccountData) -> StorageRecord {
    StorageRecord::Balance(AccountBalance {
        free: data.free,
        reserved: data.reserved,
    })
}

fn members<A: Decode + Into<AccountId>>(item: &str, bytes: &[u8]) -> Result<Vec<AccountId>, SchemaError> {
    Ok(decode_exact::<Vec<A>>(item, bytes)?
        .into_iter()
        .map(Into::into)
        .collect())
}

fn shape_mismatch(item: &str, expected: &str, got: &StorageRecord) -> SchemaError {
    SchemaError::Malformed {
        item: item.to_string(),
        reason: format!("expected {}, schema yields {:?}", expected, got),
    }
}
