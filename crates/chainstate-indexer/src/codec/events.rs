//! Balances pallet events across runtime versions.
//!
//! Older runtimes emit positional (tuple) payloads, newer ones named fields.
//! Both encode identically in SCALE but have different type hashes, so each
//! gets its own record. Every record converts straight into [`BalanceEvent`].

use parity_scale_codec::{Decode, Encode};

use super::{decode_exact, AccountId, SchemaError};

/// Width of account ids inside event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountWidth {
    Id32,
    Id20,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum BalanceStatus {
    Free,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WhoAmountTuple<A>(pub A, pub u128);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WhoAmount<A> {
    pub who: A,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Endowed<A> {
    pub account: A,
    pub free_balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BalanceSetTuple<A>(pub A, pub u128, pub u128);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BalanceSet<A> {
    pub who: A,
    pub free: u128,
    pub reserved: u128,
}

/// Earliest transfer event, which also carried the fee.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferWithFeeTuple<A>(pub A, pub A, pub u128, pub u128);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferTuple<A>(pub A, pub A, pub u128);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Transfer<A> {
    pub from: A,
    pub to: A,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ReserveRepatriatedTuple<A>(pub A, pub A, pub u128, pub BalanceStatus);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ReserveRepatriated<A> {
    pub from: A,
    pub to: A,
    pub amount: u128,
    pub destination_status: BalanceStatus,
}

/// Record layout of one event version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    WhoAmountTuple,
    WhoAmount,
    Endowed,
    BalanceSetTuple,
    BalanceSet,
    TransferWithFeeTuple,
    TransferTuple,
    Transfer,
    ReserveRepatriatedTuple,
    ReserveRepatriated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchema {
    pub shape: EventShape,
    pub width: AccountWidth,
}

impl EventSchema {
    pub const fn new(shape: EventShape, width: AccountWidth) -> Self {
        Self { shape, width }
    }

    pub fn decode(&self, item: &str, payload: &[u8]) -> Result<BalanceEvent, SchemaError> {
        match self.width {
            AccountWidth::Id32 => self.shape.decode::<[u8; 32]>(item, payload),
            AccountWidth::Id20 => self.shape.decode::<[u8; 20]>(item, payload),
        }
    }
}

impl EventShape {
    fn decode<A>(&self, item: &str, payload: &[u8]) -> Result<BalanceEvent, SchemaError>
    where
        A: Decode + Into<AccountId>,
    {
        let event = match self {
            EventShape::WhoAmountTuple => {
                let WhoAmountTuple(who, amount) = decode_exact::<WhoAmountTuple<A>>(item, payload)?;
                BalanceEvent::Amount { who: who.into(), amount }
            }
            EventShape::WhoAmount => {
                let e = decode_exact::<WhoAmount<A>>(item, payload)?;
                BalanceEvent::Amount { who: e.who.into(), amount: e.amount }
            }
            EventShape::Endowed => {
                let e = decode_exact::<Endowed<A>>(item, payload)?;
                BalanceEvent::Amount { who: e.account.into(), amount: e.free_balance }
            }
            EventShape::BalanceSetTuple => {
                let BalanceSetTuple(who, free, reserved) = decode_exact::<BalanceSetTuple<A>>(item, payload)?;
                BalanceEvent::BalanceSet { who: who.into(), free, reserved }
            }
            EventShape::BalanceSet => {
                let e = decode_exact::<BalanceSet<A>>(item, payload)?;
                BalanceEvent::BalanceSet { who: e.who.into(), free: e.free, reserved: e.reserved }
            }
            EventShape::TransferWithFeeTuple => {
                let TransferWithFeeTuple(from, to, amount, _fee) =
                    decode_exact::<TransferWithFeeTuple<A>>(item, payload)?;
                BalanceEvent::Transfer { from: from.into(), to: to.into(), amount }
            }
            EventShape::TransferTuple => {
                let TransferTuple(from, to, amount) = decode_exact::<TransferTuple<A>>(item, payload)?;
                BalanceEvent::Transfer { from: from.into(), to: to.into(), amount }
            }
            EventShape::Transfer => {
                let e = decode_exact::<Transfer<A>>(item, payload)?;
                BalanceEvent::Transfer { from: e.from.into(), to: e.to.into(), amount: e.amount }
            }
            EventShape::ReserveRepatriatedTuple => {
                let ReserveRepatriatedTuple(from, to, amount, _) =
                    decode_exact::<ReserveRepatriatedTuple<A>>(item, payload)?;
                BalanceEvent::Transfer { from: from.into(), to: to.into(), amount }
            }
            EventShape::ReserveRepatriated => {
                let e = decode_exact::<ReserveRepatriated<A>>(item, payload)?;
                BalanceEvent::Transfer { from: e.from.into(), to: e.to.into(), amount: e.amount }
            }
        };
        Ok(event)
    }
}

/// Version-independent view of a balance event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceEvent {
    /// One account's balance moved by `amount`.
    Amount { who: AccountId, amount: u128 },
    BalanceSet { who: AccountId, free: u128, reserved: u128 },
    /// Value moved between two accounts (transfers and repatriated reserves).
    Transfer { from: AccountId, to: AccountId, amount: u128 },
}

impl BalanceEvent {
    pub fn accounts(&self) -> Vec<&AccountId> {
        match self {
            BalanceEvent::Amount { who, .. } | BalanceEvent::BalanceSet { who, .. } => vec![who],
            BalanceEvent::Transfer { from, to, .. } => vec![from, to],
        }
    }
}
