//! Storage key derivation for Substrate state queries.

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Digest};
use serde::Deserialize;
use xxhash_rust::xxh64::xxh64;

type Blake2b128 = Blake2b<U16>;
type Blake2b256 = Blake2b<U32>;

pub fn twox_64(data: &[u8]) -> [u8; 8] {
    xxh64(data, 0).to_le_bytes()
}

pub fn twox_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&xxh64(data, 0).to_le_bytes());
    out[8..].copy_from_slice(&xxh64(data, 1).to_le_bytes());
    out
}

pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    Blake2b128::digest(data).into()
}

pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// Hasher applied to a storage map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StorageHasher {
    #[serde(alias = "blake2_128Concat")]
    Blake2_128Concat,
    #[serde(alias = "blake2_256")]
    Blake2_256,
    #[serde(alias = "twox64Concat")]
    Twox64Concat,
}

impl StorageHasher {
    pub fn hash(&self, key: &[u8]) -> Vec<u8> {
        match self {
            StorageHasher::Blake2_128Concat => [&blake2_128(key)[..], key].concat(),
            StorageHasher::Blake2_256 => blake2_256(key).to_vec(),
            StorageHasher::Twox64Concat => [&twox_64(key)[..], key].concat(),
        }
    }
}

/// `twox128(pallet) ++ twox128(item)` for an item named `Pallet.Item`.
pub fn storage_prefix(item: &str) -> Vec<u8> {
    let (pallet, name) = item.split_once('.').unwrap_or((item, ""));
    [twox_128(pallet.as_bytes()), twox_128(name.as_bytes())].concat()
}

/// Full key of one storage map entry. Account ids are fixed-size arrays, so
/// their SCALE encoding is the raw bytes.
pub fn map_key(item: &str, hasher: StorageHasher, account: &[u8]) -> Vec<u8> {
    let mut key = storage_prefix(item);
    key.extend_from_slice(&hasher.hash(account));
    key
}

pub fn to_hex(key: &[u8]) -> String {
    format!("0x{}", hex::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twox_128_known_prefixes() {
        assert_eq!(hex::encode(twox_128(b"System")), "26aa394eea5630e07c48ae0c9558cef7");
        assert_eq!(hex::encode(twox_128(b"Account")), "b99d880ec681799c0cf30e8886371da9");
        assert_eq!(hex::encode(twox_128(b"Balances")), "c2261276cc9d1f8598ea4b6a74b15c2f");
        assert_eq!(hex::encode(twox_128(b"TotalIssuance")), "57c875e4cff74148e4628f264b974c80");
    }

    #[test]
    fn test_system_account_key_for_alice() {
        let alice =
            hex::decode("d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d").unwrap();
        let key = map_key("System.Account", StorageHasher::Blake2_128Concat, &alice);
        assert_eq!(
            to_hex(&key),
            "0x26aa394eea5630e07c48ae0c9558cef7b99d880ec681799c0cf30e8886371da9\
             de1e86a9a8c739864cf3cc5ec2bea59fd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d"
        );
    }

    #[test]
    fn test_total_issuance_value_key() {
        assert_eq!(
            to_hex(&storage_prefix("Balances.TotalIssuance")),
            "0xc2261276cc9d1f8598ea4b6a74b15c2f57c875e4cff74148e4628f264b974c80"
        );
    }

    #[test]
    fn test_hasher_output_lengths() {
        let key = [7u8; 20];
        assert_eq!(StorageHasher::Blake2_128Concat.hash(&key).len(), 36);
        assert_eq!(StorageHasher::Blake2_256.hash(&key).len(), 32);
        assert_eq!(StorageHasher::Twox64Concat.hash(&key).len(), 28);
    }
}
