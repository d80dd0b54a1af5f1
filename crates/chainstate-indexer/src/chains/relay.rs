//! Kusama and Polkadot.
//!
//! Type hashes are structural, so both relay chains share one table. Kusama
//! reached each layout at a different spec version than Polkadot, but the
//! layouts themselves (and therefore the hashes) are identical.

use chainstate_common::ChainName;

use super::*;
use crate::codec::events::{AccountWidth::Id32, EventSchema, EventShape};
use crate::codec::storage::{StorageSchema, StorageShape};
use crate::codec::{ItemKind, StorageHasher};

/// `(AccountId32, u128)`
const WHO_AMOUNT_TUPLE: &str = "23bebce4ca9ed37548947d07d4dc50e772f07401b9a416b6aa2f3e9cb5adcaf4";
/// `{who: AccountId32, amount: u128}`
const WHO_AMOUNT: &str = "e84a34a6a3d577b31f16557bd304282f4fe4cbd7115377f4687635dc48e52ba5";

const AMOUNT_EVENTS: &[&str] = &[
    "Balances.Deposit",
    "Balances.Reserved",
    "Balances.Unreserved",
    "Balances.Slashed",
    "Balances.Withdraw",
];

const MEMBERS: &str = "f5df25eadcdffaa0d2a68b199d671d3921ca36a7b70d22d57506dca52b4b5895";
const COUNT: &str = "81bbbe8e62451cbcc227306706c919527aa2538970bd6d67a9969dd52c257d02";
const BALANCE: &str = "0bac40afaf72ceea5a87ae2baaa5fe7f69915323f3293bdd970e7790a9d968c0";

pub(super) fn schema(chain: ChainName) -> ChainSchema {
    let event = |shape| EventSchema::new(shape, Id32);
    let events = SchemaTable::new(ItemKind::Event)
        .register_all(AMOUNT_EVENTS, WHO_AMOUNT_TUPLE, event(EventShape::WhoAmountTuple))
        .register_all(AMOUNT_EVENTS, WHO_AMOUNT, event(EventShape::WhoAmount))
        .register("Balances.Endowed", WHO_AMOUNT_TUPLE, event(EventShape::WhoAmountTuple))
        .register(
            "Balances.Endowed",
            "75951f685df19cbb5fdda09cf928a105518ceca9576d95bd18d4fac8802730ca",
            event(EventShape::Endowed),
        )
        .register(
            "Balances.BalanceSet",
            "0f263bfdefa394edfb38d20d33662423a2e0902235b599f9b2b0292f157f0902",
            event(EventShape::BalanceSetTuple),
        )
        .register(
            "Balances.BalanceSet",
            "1e2b5d5a07046e6d6e5507661d3f3feaddfb41fc609a2336b24957322080ca77",
            event(EventShape::BalanceSet),
        )
        .register(
            "Balances.Transfer",
            "72e6f0d399a72f77551d560f52df25d757e0643d0192b3bc837cbd91b6f36b27",
            event(EventShape::TransferWithFeeTuple),
        )
        .register(
            "Balances.Transfer",
            "dad2bcdca357505fa3c7832085d0db53ce6f902bd9f5b52823ee8791d351872c",
            event(EventShape::TransferTuple),
        )
        .register(
            "Balances.Transfer",
            "0ffdf35c495114c2d42a8bf6c241483fd5334ca0198662e14480ad040f1e3a66",
            event(EventShape::Transfer),
        )
        .register(
            "Balances.ReserveRepatriated",
            "68e9ec5664c8ffe977da0c890bac43122a5cf13565c1c936e2120ba4980bcf31",
            event(EventShape::ReserveRepatriatedTuple),
        )
        .register(
            "Balances.ReserveRepatriated",
            "6232d50d422cea3a6fd21da36387df36d1d366405d0c589566c6de85c9cf541f",
            event(EventShape::ReserveRepatriated),
        );

    let account = |shape| StorageSchema::map(shape, StorageHasher::Blake2_128Concat, Id32);
    let storage = SchemaTable::new(ItemKind::Storage)
        .register(
            SYSTEM_ACCOUNT,
            "2208f857b7cd6fecf78ca393cf3d17ec424773727d0028f07c9f0dc608fc1b7a",
            account(StorageShape::AccountInfoRefCountU8),
        )
        .register(
            SYSTEM_ACCOUNT,
            "eb40f1d91f26d72e29c60e034d53a72b9b529014c7e108f422d8ad5f03f0c902",
            account(StorageShape::AccountInfoRefCountU32),
        )
        .register(
            SYSTEM_ACCOUNT,
            "73070b537f1805475b37167271b33ac7fd6ffad8ba62da08bc14937a017b8bb2",
            account(StorageShape::AccountInfoDualRefCount),
        )
        .register(
            SYSTEM_ACCOUNT,
            "1ddc7ade926221442c388ee4405a71c9428e548fab037445aaf4b3a78f4735c1",
            account(StorageShape::AccountInfoTripleRefCount),
        )
        .register(
            BALANCES_ACCOUNT,
            "0b3b4bf0dd7388459eba461bc7c3226bf58608c941710a714e02f33ec0f91e78",
            account(StorageShape::AccountData),
        )
        .register_all(
            &[FREE_BALANCE, RESERVED_BALANCE],
            BALANCE,
            StorageSchema::map(StorageShape::Balance, StorageHasher::Blake2_256, Id32),
        )
        .register(
            TOTAL_ISSUANCE,
            "f8ebe28eb30158172c0ccf672f7747c46a244f892d08ef2ebcbaadde34a26bc0",
            StorageSchema::value(StorageShape::Balance, Id32),
        )
        .register_all(
            &["Council.Members", "Instance1Collective.Members"],
            MEMBERS,
            StorageSchema::value(StorageShape::Members, Id32),
        )
        .register_all(
            &[
                "Council.ProposalCount",
                "Instance1Collective.ProposalCount",
                DEMOCRACY_PROPOSALS,
            ],
            COUNT,
            StorageSchema::value(StorageShape::Count, Id32),
        );

    ChainSchema {
        chain,
        events,
        storage,
        council_members: &["Council.Members", "Instance1Collective.Members"],
        council_proposals: &["Council.ProposalCount", "Instance1Collective.ProposalCount"],
    }
}
