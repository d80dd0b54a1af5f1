//! Per-chain schema tables. The indexing engine is chain-agnostic; everything
//! that differs between chains lives here.

mod karura;
mod moonbeam;
mod relay;

use chainstate_common::ChainName;

use crate::codec::events::EventSchema;
use crate::codec::storage::StorageSchema;
use crate::codec::SchemaTable;

pub const SYSTEM_ACCOUNT: &str = "System.Account";
pub const BALANCES_ACCOUNT: &str = "Balances.Account";
pub const FREE_BALANCE: &str = "Balances.FreeBalance";
pub const RESERVED_BALANCE: &str = "Balances.ReservedBalance";
pub const TOTAL_ISSUANCE: &str = "Balances.TotalIssuance";
pub const DEMOCRACY_PROPOSALS: &str = "Democracy.PublicPropCount";

pub struct ChainSchema {
    pub chain: ChainName,
    pub events: SchemaTable<EventSchema>,
    pub storage: SchemaTable<StorageSchema>,
    /// Council membership items, canonical name first.
    pub council_members: &'static [&'static str],
    /// Council proposal counters, canonical name first.
    pub council_proposals: &'static [&'static str],
}

pub fn for_chain(chain: ChainName) -> ChainSchema {
    match chain {
        ChainName::Kusama | ChainName::Polkadot => relay::schema(chain),
        ChainName::Karura => karura::schema(),
        ChainName::Moonbeam | ChainName::Moonriver => moonbeam::schema(chain),
    }
}
