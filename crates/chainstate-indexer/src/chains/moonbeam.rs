//! Moonbeam and Moonriver: 20-byte (Ethereum style) account ids.
//!
//! Both runtimes come from the same codebase and share every layout.
//! Moonriver launched before the council was renamed, so its early blocks
//! only carry `Instance1Collective`.

use chainstate_common::ChainName;

use super::*;
use crate::codec::events::{AccountWidth::Id20, EventSchema, EventShape};
use crate::codec::storage::{StorageSchema, StorageShape};
use crate::codec::{ItemKind, StorageHasher};

/// `(AccountId20, u128)`
const WHO_AMOUNT_TUPLE: &str = "e4f02aa7cee015102b6cbc171f5d7e84370e60deba2166a27195187adde0407f";
/// `{who: AccountId20, amount: u128}`
const WHO_AMOUNT: &str = "43e3321e3408ebd2b7d4c70d42ffa076463495043e47ddb0fb1fbe3e105f5b2f";

const AMOUNT_EVENTS: &[&str] = &[
    "Balances.Deposit",
    "Balances.Reserved",
    "Balances.Unreserved",
    "Balances.Slashed",
    "Balances.Withdraw",
];

const MEMBERS: &str = "d14508def9da76532021b53d553e9048fd079e2e735d2393e6d531e6d1fd29ca";
const COUNT: &str = "81bbbe8e62451cbcc227306706c919527aa2538970bd6d67a9969dd52c257d02";

const COUNCIL_MEMBERS: &[&str] = &["CouncilCollective.Members", "Instance1Collective.Members"];
const COUNCIL_PROPOSALS: &[&str] = &["CouncilCollective.ProposalCount", "Instance1Collective.ProposalCount"];

pub(super) fn schema(chain: ChainName) -> ChainSchema {
    let event = |shape| EventSchema::new(shape, Id20);
    let events = SchemaTable::new(ItemKind::Event)
        .register_all(AMOUNT_EVENTS, WHO_AMOUNT_TUPLE, event(EventShape::WhoAmountTuple))
        .register_all(AMOUNT_EVENTS, WHO_AMOUNT, event(EventShape::WhoAmount))
        .register("Balances.Endowed", WHO_AMOUNT_TUPLE, event(EventShape::WhoAmountTuple))
        .register(
            "Balances.Endowed",
            "a773a5c0921f3b97243d311c28ce9bb596c8cc3eacae83e0b616a49c6784a35a",
            event(EventShape::Endowed),
        )
        .register(
            "Balances.BalanceSet",
            "7d53ab304de2c1ff2ac70be085ea6ab305e3a4df52dde9c25829171c7376cebc",
            event(EventShape::BalanceSetTuple),
        )
        .register(
            "Balances.BalanceSet",
            "3a56bc33dc87c1d425edfb16edf3f26eafed9ed9c0e8e6831221be938919d2bd",
            event(EventShape::BalanceSet),
        )
        .register(
            "Balances.Transfer",
            "dfcae516f053c47e7cb49e0718f01587efcb64cea4e3baf4c6973a29891f7841",
            event(EventShape::TransferTuple),
        )
        .register(
            "Balances.Transfer",
            "23222c59f2992c12387568241620899d2d399ab9027595daca8255637f62ece3",
            event(EventShape::Transfer),
        )
        .register(
            "Balances.ReserveRepatriated",
            "aed9aad67fe073fb38bb01741f1200b1f5f3aa52006f4669a1004d648cdb6e5d",
            event(EventShape::ReserveRepatriatedTuple),
        )
        .register(
            "Balances.ReserveRepatriated",
            "daa0192df4c75cafc52e847a38b276d53a6330bf4083906b38c0d1eb5166d98a",
            event(EventShape::ReserveRepatriated),
        );

    let storage = SchemaTable::new(ItemKind::Storage)
        .register(
            SYSTEM_ACCOUNT,
            "a83a7372c51978aa017bd09db5672f3ea3957f0882455abd9726ac2b6d4b61dc",
            StorageSchema::map(
                StorageShape::AccountInfoTripleRefCount,
                StorageHasher::Blake2_128Concat,
                Id20,
            ),
        )
        .register(
            BALANCES_ACCOUNT,
            "17669917f628c38832645ae9b39d0bab5a99964e3446b9b2ef904cad2f4bd653",
            StorageSchema::map(StorageShape::AccountData, StorageHasher::Blake2_128Concat, Id20),
        )
        .register(
            TOTAL_ISSUANCE,
            "f8ebe28eb30158172c0ccf672f7747c46a244f892d08ef2ebcbaadde34a26bc0",
            StorageSchema::value(StorageShape::Balance, Id20),
        )
        .register_all(COUNCIL_MEMBERS, MEMBERS, StorageSchema::value(StorageShape::Members, Id20))
        .register_all(COUNCIL_PROPOSALS, COUNT, StorageSchema::value(StorageShape::Count, Id20))
        .register(DEMOCRACY_PROPOSALS, COUNT, StorageSchema::value(StorageShape::Count, Id20));

    ChainSchema {
        chain,
        events,
        storage,
        council_members: COUNCIL_MEMBERS,
        council_proposals: COUNCIL_PROPOSALS,
    }
}
