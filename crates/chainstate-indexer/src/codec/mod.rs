//! Version-aware decoding of runtime events and storage items.
//!
//! Every event or storage item a runtime exposes is identified by its name
//! (`Pallet.Item`) and the hash of its type definition. The archive reports
//! that hash per runtime version; a [`SchemaTable`] maps each hash we know to
//! the record layout that decodes it. Matching is exact: a hash we have not
//! registered is an error, never a guess.

pub mod events;
pub mod hashing;
pub mod storage;

use parity_scale_codec::{Decode, DecodeAll};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

pub use hashing::StorageHasher;

/// Raw account identifier bytes (32 bytes on relay chains, 20 on EVM parachains).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(Vec<u8>);

impl AccountId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a `0x`-prefixed (or bare) hex account id.
    pub fn from_hex(item: &str, value: &str) -> Result<Self, SchemaError> {
        let bytes = hex::decode(value.trim_start_matches("0x")).map_err(|e| SchemaError::InvalidAccount {
            item: item.to_string(),
            reason: e.to_string(),
        })?;
        match bytes.len() {
            20 | 32 => Ok(Self(bytes)),
            n => Err(SchemaError::InvalidAccount {
                item: item.to_string(),
                reason: format!("unexpected account length {}", n),
            }),
        }
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId(0x{})", hex::encode(&self.0))
    }
}

impl<const N: usize> From<[u8; N]> for AccountId {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Free and reserved balance of one account, in the chain's smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountBalance {
    pub free: u128,
    pub reserved: u128,
}

/// Items declared by one runtime version, with the type hash of each.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeFingerprint {
    pub spec_name: String,
    pub spec_version: u32,
    #[serde(default)]
    pub events: HashMap<String, String>,
    #[serde(default)]
    pub storage: HashMap<String, String>,
    /// Key hashers of storage maps, when the archive reports them.
    #[serde(default)]
    pub storage_hashers: HashMap<String, StorageHasher>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Event,
    Storage,
}

impl RuntimeFingerprint {
    pub fn type_hash(&self, kind: ItemKind, name: &str) -> Option<&str> {
        let items = match kind {
            ItemKind::Event => &self.events,
            ItemKind::Storage => &self.storage,
        };
        items.get(name).map(|hash| normalize_hash(hash))
    }
}

fn normalize_hash(hash: &str) -> &str {
    hash.trim_start_matches("0x")
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Unknown schema version for {item}: type hash {type_hash}")]
    UnknownSchemaVersion { item: String, type_hash: String },

    #[error("{item} is not declared by runtime {spec_version}")]
    ItemNotDeclared { item: String, spec_version: u32 },

    #[error("Malformed {item} payload: {reason}")]
    Malformed { item: String, reason: String },

    #[error("Invalid account in {item}: {reason}")]
    InvalidAccount { item: String, reason: String },
}

/// Decode a complete SCALE payload. Trailing bytes are an error.
pub(crate) fn decode_exact<T: Decode>(item: &str, bytes: &[u8]) -> Result<T, SchemaError> {
    T::decode_all(&mut &bytes[..]).map_err(|e| SchemaError::Malformed {
        item: item.to_string(),
        reason: e.to_string(),
    })
}

/// Known layouts of every tracked item, keyed by name then type hash.
#[derive(Debug)]
pub struct SchemaTable<S> {
    kind: ItemKind,
    entries: HashMap<&'static str, Vec<(&'static str, S)>>,
}

impl<S> SchemaTable<S> {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    pub fn register(mut self, name: &'static str, type_hash: &'static str, schema: S) -> Self {
        self.entries.entry(name).or_default().push((type_hash, schema));
        self
    }

    /// Register the same layout for several items sharing one type hash.
    pub fn register_all(mut self, names: &[&'static str], type_hash: &'static str, schema: S) -> Self
    where
        S: Clone,
    {
        for name in names {
            self = self.register(name, type_hash, schema.clone());
        }
        self
    }

    pub fn knows(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Select the layout for `name` under the given runtime.
    ///
    /// `Ok(None)` means the runtime does not have the item at all; callers
    /// decide whether that means "try a legacy name" or "value is zero".
    pub fn resolve(&self, name: &str, runtime: &RuntimeFingerprint) -> Result<Option<&S>, SchemaError> {
        let Some(type_hash) = runtime.type_hash(self.kind, name) else {
            return Ok(None);
        };

        self.entries
            .get(name)
            .and_then(|versions| {
                versions
                    .iter()
                    .find(|(known, _)| known.eq_ignore_ascii_case(type_hash))
            })
            .map(|(_, schema)| Some(schema))
            .ok_or_else(|| SchemaError::UnknownSchemaVersion {
                item: name.to_string(),
                type_hash: type_hash.to_string(),
            })
    }

    /// Walk `names` in precedence order and return the first one the runtime has.
    pub fn resolve_first<'n>(
        &self,
        names: &[&'n str],
        runtime: &RuntimeFingerprint,
    ) -> Result<Option<(&'n str, &S)>, SchemaError> {
        for &name in names {
            if let Some(schema) = self.resolve(name, runtime)? {
                return Ok(Some((name, schema)));
            }
        }
        Ok(None)
    }
}
