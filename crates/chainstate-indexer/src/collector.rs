use std::collections::BTreeSet;

use crate::codec::events::EventSchema;
use crate::codec::{AccountId, RuntimeFingerprint, SchemaError, SchemaTable};
use crate::source::{Block, BlockItem};

/// Balance-affecting events. Anything else in a block is ignored.
pub const TRACKED_EVENTS: &[&str] = &[
    "Balances.Endowed",
    "Balances.Transfer",
    "Balances.Deposit",
    "Balances.Withdraw",
    "Balances.Reserved",
    "Balances.Unreserved",
    "Balances.Slashed",
    "Balances.BalanceSet",
    "Balances.ReserveRepatriated",
];

/// Finds the accounts whose balance a block may have changed.
pub struct TouchedAccountCollector<'a> {
    events: &'a SchemaTable<EventSchema>,
}

impl<'a> TouchedAccountCollector<'a> {
    pub fn new(events: &'a SchemaTable<EventSchema>) -> Self {
        Self { events }
    }

    pub fn collect(&self, block: &Block, runtime: &RuntimeFingerprint) -> Result<BTreeSet<AccountId>, SchemaError> {
        let mut touched = BTreeSet::new();
        self.collect_into(block, runtime, &mut touched)?;
        Ok(touched)
    }

    /// Add the block's touched accounts to an existing set.
    pub fn collect_into(
        &self,
        block: &Block,
        runtime: &RuntimeFingerprint,
        touched: &mut BTreeSet<AccountId>,
    ) -> Result<(), SchemaError> {
        for item in &block.items {
            match item {
                BlockItem::Event { name, args } => {
                    if !TRACKED_EVENTS.contains(&name.as_str()) {
                        continue;
                    }
                    let schema = self.events.resolve(name, runtime)?.ok_or_else(|| SchemaError::ItemNotDeclared {
                        item: name.clone(),
                        spec_version: runtime.spec_version,
                    })?;
                    let payload = hex::decode(args.trim_start_matches("0x")).map_err(|e| SchemaError::Malformed {
                        item: name.clone(),
                        reason: e.to_string(),
                    })?;
                    let event = schema.decode(name, &payload)?;
                    touched.extend(event.accounts().into_iter().cloned());
                }
                BlockItem::Call { name, parent: None, origin: Some(origin) } => {
                    if let Some(signer) = signed_origin(name, origin)? {
                        touched.insert(signer);
                    }
                }
                BlockItem::Call { .. } => {}
            }
        }
        Ok(())
    }
}

/// The signer of a call whose origin is `system / Signed(account)`.
fn signed_origin(call: &str, origin: &serde_json::Value) -> Result<Option<AccountId>, SchemaError> {
    if origin.get("__kind").and_then(|k| k.as_str()) != Some("system") {
        return Ok(None);
    }
    let Some(inner) = origin.get("value") else {
        return Ok(None);
    };
    if inner.get("__kind").and_then(|k| k.as_str()) != Some("Signed") {
        return Ok(None);
    }
    match inner.get("value").and_then(|v| v.as_str()) {
        Some(account) => AccountId::from_hex(call, account).map(Some),
        None => Err(SchemaError::InvalidAccount {
            item: call.to_string(),
            reason: "signed origin without account".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::{self, ChainSchema};
    use crate::codec::events::{Transfer, TransferTuple, WhoAmount, WhoAmountTuple};
    use crate::source::BlockHeader;
    use chainstate_common::ChainName;
    use parity_scale_codec::Encode;

    const TRANSFER_V1050: &str = "dad2bcdca357505fa3c7832085d0db53ce6f902bd9f5b52823ee8791d351872c";
    const TRANSFER_V9130: &str = "0ffdf35c495114c2d42a8bf6c241483fd5334ca0198662e14480ad040f1e3a66";
    const ALICE: [u8; 32] = [1; 32];
    const BOB: [u8; 32] = [2; 32];
    const CHARLIE: [u8; 32] = [3; 32];

    fn kusama() -> ChainSchema {
        chains::for_chain(ChainName::Kusama)
    }

    fn runtime(version: u32, events: &[(&str, &str)]) -> RuntimeFingerprint {
        RuntimeFingerprint {
            spec_name: "kusama".into(),
            spec_version: version,
            events: events.iter().map(|(n, h)| (n.to_string(), h.to_string())).collect(),
            ..Default::default()
        }
    }

    fn block(items: Vec<BlockItem>) -> Block {
        Block {
            header: BlockHeader {
                height: 1,
                hash: "0x01".into(),
                timestamp: 0,
                spec_version: 1,
            },
            items,
        }
    }

    fn event(name: &str, payload: Vec<u8>) -> BlockItem {
        BlockItem::Event {
            name: name.into(),
            args: format!("0x{}", hex::encode(payload)),
        }
    }

    fn signed_call(parent: Option<u32>, signer: &[u8]) -> BlockItem {
        BlockItem::Call {
            name: "Balances.transfer".into(),
            parent,
            origin: Some(serde_json::json!({
                "__kind": "system",
                "value": {"__kind": "Signed", "value": format!("0x{}", hex::encode(signer))}
            })),
        }
    }

    #[test]
    fn test_transfer_tuple_and_named_eras_touch_same_accounts() {
        let schema = kusama();
        let collector = TouchedAccountCollector::new(&schema.events);

        let old = collector
            .collect(
                &block(vec![event("Balances.Transfer", TransferTuple(ALICE, BOB, 5).encode())]),
                &runtime(1050, &[("Balances.Transfer", TRANSFER_V1050)]),
            )
            .unwrap();
        let new = collector
            .collect(
                &block(vec![event("Balances.Transfer", Transfer { from: ALICE, to: BOB, amount: 9 }.encode())]),
                &runtime(9130, &[("Balances.Transfer", TRANSFER_V9130)]),
            )
            .unwrap();

        let expected: BTreeSet<AccountId> = [ALICE.into(), BOB.into()].into_iter().collect();
        assert_eq!(old, expected);
        assert_eq!(new, expected);
    }

    #[test]
    fn test_signed_top_level_calls_add_signer() {
        let schema = kusama();
        let collector = TouchedAccountCollector::new(&schema.events);
        let touched = collector
            .collect(
                &block(vec![signed_call(None, &CHARLIE), signed_call(Some(0), &ALICE)]),
                &runtime(9130, &[]),
            )
            .unwrap();
        assert_eq!(touched.into_iter().collect::<Vec<_>>(), vec![AccountId::from(CHARLIE)]);
    }

    #[test]
    fn test_unsigned_and_untracked_items_are_ignored() {
        let schema = kusama();
        let collector = TouchedAccountCollector::new(&schema.events);
        let root_call = BlockItem::Call {
            name: "Timestamp.set".into(),
            parent: None,
            origin: Some(serde_json::json!({"__kind": "system", "value": {"__kind": "None"}})),
        };
        let touched = collector
            .collect(
                &block(vec![root_call, event("System.ExtrinsicSuccess", vec![0xff])]),
                &runtime(9130, &[("System.ExtrinsicSuccess", "ab")]),
            )
            .unwrap();
        assert!(touched.is_empty());
    }

    #[test]
    fn test_unknown_event_version_is_fatal() {
        let schema = kusama();
        let collector = TouchedAccountCollector::new(&schema.events);
        let err = collector
            .collect(
                &block(vec![event("Balances.Deposit", WhoAmount { who: ALICE, amount: 1 }.encode())]),
                &runtime(9999, &[("Balances.Deposit", "00ff")]),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownSchemaVersion { .. }));
    }

    #[test]
    fn test_undeclared_tracked_event_is_fatal() {
        let schema = kusama();
        let collector = TouchedAccountCollector::new(&schema.events);
        let err = collector
            .collect(
                &block(vec![event("Balances.Deposit", WhoAmount { who: ALICE, amount: 1 }.encode())]),
                &runtime(9130, &[]),
            )
            .unwrap_err();
        assert!(matches!(err, SchemaError::ItemNotDeclared { .. }));
    }

    #[test]
    fn test_touched_set_is_deduplicated() {
        let schema = kusama();
        let collector = TouchedAccountCollector::new(&schema.events);
        let touched = collector
            .collect(
                &block(vec![
                    event("Balances.Transfer", Transfer { from: ALICE, to: BOB, amount: 1 }.encode()),
                    event("Balances.Transfer", Transfer { from: BOB, to: ALICE, amount: 1 }.encode()),
                    signed_call(None, &ALICE),
                ]),
                &runtime(9130, &[("Balances.Transfer", TRANSFER_V9130)]),
            )
            .unwrap();
        assert_eq!(touched.len(), 2);
    }

    #[test]
    fn test_karura_launch_era_events() {
        let schema = chains::for_chain(ChainName::Karura);
        let collector = TouchedAccountCollector::new(&schema.events);
        let rt = runtime(
            1000,
            &[
                ("Balances.Endowed", "23bebce4ca9ed37548947d07d4dc50e772f07401b9a416b6aa2f3e9cb5adcaf4"),
                ("Balances.Transfer", TRANSFER_V1050),
            ],
        );
        let touched = collector
            .collect(
                &block(vec![
                    event("Balances.Endowed", WhoAmountTuple(CHARLIE, 10).encode()),
                    event("Balances.Transfer", TransferTuple(ALICE, BOB, 5).encode()),
                ]),
                &rt,
            )
            .unwrap();
        let expected: BTreeSet<AccountId> = [ALICE.into(), BOB.into(), CHARLIE.into()].into_iter().collect();
        assert_eq!(touched, expected);
    }

    #[test]
    fn test_moonriver_events_carry_20_byte_accounts() {
        let alith = [0xf2u8; 20];
        let baltathar = [0x3cu8; 20];
        let schema = chains::for_chain(ChainName::Moonriver);
        let collector = TouchedAccountCollector::new(&schema.events);
        let rt = runtime(
            1201,
            &[
                ("Balances.Deposit", "43e3321e3408ebd2b7d4c70d42ffa076463495043e47ddb0fb1fbe3e105f5b2f"),
                ("Balances.Transfer", "23222c59f2992c12387568241620899d2d399ab9027595daca8255637f62ece3"),
            ],
        );
        let touched = collector
            .collect(
                &block(vec![
                    event("Balances.Deposit", WhoAmount { who: alith, amount: 1 }.encode()),
                    event("Balances.Transfer", Transfer { from: alith, to: baltathar, amount: 2 }.encode()),
                ]),
                &rt,
            )
            .unwrap();
        let expected: BTreeSet<AccountId> = [alith.into(), baltathar.into()].into_iter().collect();
        assert_eq!(touched, expected);

        // A 32-byte payload under a 20-byte layout does not decode
        let err = collector
            .collect(&block(vec![event("Balances.Deposit", WhoAmount { who: ALICE, amount: 1 }.encode())]), &rt)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { .. }));
    }
}
