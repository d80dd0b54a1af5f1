use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::address::{hex_encode, ss58_encode};
use crate::error::ChainStateError;

/// Chains the indexer ships schema tables for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainName {
    Kusama,
    Polkadot,
    Karura,
    Moonriver,
    Moonbeam,
}

impl ChainName {
    pub const ALL: [ChainName; 5] = [
        ChainName::Kusama,
        ChainName::Polkadot,
        ChainName::Karura,
        ChainName::Moonriver,
        ChainName::Moonbeam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainName::Kusama => "kusama",
            ChainName::Polkadot => "polkadot",
            ChainName::Karura => "karura",
            ChainName::Moonriver => "moonriver",
            ChainName::Moonbeam => "moonbeam",
        }
    }

    pub fn descriptor(&self) -> &'static ChainDescriptor {
        match self {
            ChainName::Kusama => &KUSAMA,
            ChainName::Polkadot => &POLKADOT,
            ChainName::Karura => &KARURA,
            ChainName::Moonriver => &MOONRIVER,
            ChainName::Moonbeam => &MOONBEAM,
        }
    }
}

impl fmt::Display for ChainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainName {
    type Err = ChainStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ChainName::ALL
            .into_iter()
            .find(|chain| chain.as_str() == lower)
            .ok_or_else(|| ChainStateError::Config(format!("Unsupported chain {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayChain {
    Polkadot,
    Kusama,
}

#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Static description of a chain. Never written by the indexer.
#[derive(Debug, Clone, Serialize)]
pub struct ChainDescriptor {
    pub name: ChainName,
    pub display_name: &'static str,
    pub ss58_prefix: Option<u16>,
    pub tokens: &'static [Token],
    pub para_id: Option<u32>,
    pub relay_chain: Option<RelayChain>,
}

impl ChainDescriptor {
    /// Native token (first listed).
    pub fn native_token(&self) -> &Token {
        &self.tokens[0]
    }

    /// Encode raw account bytes the way this chain displays them.
    pub fn encode_account(&self, raw: &[u8]) -> String {
        match self.ss58_prefix {
            Some(prefix) if raw.len() == 32 => ss58_encode(prefix, raw),
            _ => hex_encode(raw),
        }
    }
}

static KUSAMA: ChainDescriptor = ChainDescriptor {
    name: ChainName::Kusama,
    display_name: "Kusama",
    ss58_prefix: Some(2),
    tokens: &[Token { symbol: "KSM", decimals: 12 }],
    para_id: None,
    relay_chain: None,
};

static POLKADOT: ChainDescriptor = ChainDescriptor {
    name: ChainName::Polkadot,
    display_name: "Polkadot",
    ss58_prefix: Some(0),
    tokens: &[Token { symbol: "DOT", decimals: 10 }],
    para_id: None,
    relay_chain: None,
};

static KARURA: ChainDescriptor = ChainDescriptor {
    name: ChainName::Karura,
    display_name: "Karura",
    ss58_prefix: Some(8),
    tokens: &[Token { symbol: "KAR", decimals: 12 }],
    para_id: Some(2000),
    relay_chain: Some(RelayChain::Kusama),
};

static MOONRIVER: ChainDescriptor = ChainDescriptor {
    name: ChainName::Moonriver,
    display_name: "Moonriver",
    ss58_prefix: None,
    tokens: &[Token { symbol: "MOVR", decimals: 18 }],
    para_id: Some(2023),
    relay_chain: Some(RelayChain::Kusama),
};

static MOONBEAM: ChainDescriptor = ChainDescriptor {
    name: ChainName::Moonbeam,
    display_name: "Moonbeam",
    ss58_prefix: None,
    tokens: &[Token { symbol: "GLMR", decimals: 18 }],
    para_id: Some(2004),
    relay_chain: Some(RelayChain::Polkadot),
};
