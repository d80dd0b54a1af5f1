use anyhow::{Context, Result};
use chainstate_common::{block_id, to_numeric, ChainStateSnapshot};
use chrono::{DateTime, Duration, Utc};

use crate::chains::{ChainSchema, DEMOCRACY_PROPOSALS, TOTAL_ISSUANCE};
use crate::codec::storage::StorageSchema;
use crate::codec::RuntimeFingerprint;
use crate::source::{BlockHeader, ChainSource};
use crate::store::Store;

/// Decides when a snapshot is due, in chain time.
#[derive(Debug, Clone)]
pub struct SnapshotClock {
    period: Duration,
    last: Option<DateTime<Utc>>,
}

impl SnapshotClock {
    pub fn new(period: Duration, last: Option<DateTime<Utc>>) -> Self {
        Self { period, last }
    }

    /// Restore the clock from the newest persisted snapshot.
    pub async fn recover<S: Store + ?Sized>(period: Duration, store: &S) -> Result<Self> {
        let last = store
            .latest_snapshot()
            .await
            .context("Failed to load latest snapshot")?
            .map(|s| s.timestamp);
        Ok(Self::new(period, last))
    }

    pub fn is_due(&self, timestamp: DateTime<Utc>) -> bool {
        match self.last {
            None => true,
            Some(last) => timestamp - last >= self.period,
        }
    }

    pub fn record(&mut self, timestamp: DateTime<Utc>) {
        self.last = Some(timestamp);
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }
}

/// Block time of a header, from the archive's millisecond timestamp.
pub fn block_time(header: &BlockHeader) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(header.timestamp)
        .with_context(|| format!("Block {} has invalid timestamp {}", header.height, header.timestamp))
}

/// Chain-wide metrics read from storage at one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainMetrics {
    pub council_members: u32,
    pub council_proposals: u32,
    pub democracy_proposals: u32,
    pub token_supply: u128,
}

/// Computes and persists chain state snapshots.
pub struct Snapshotter<'a, C: ?Sized, S: ?Sized> {
    source: &'a C,
    store: &'a S,
    schema: &'a ChainSchema,
}

impl<'a, C: ChainSource + ?Sized, S: Store + ?Sized> Snapshotter<'a, C, S> {
    pub fn new(source: &'a C, store: &'a S, schema: &'a ChainSchema) -> Self {
        Self { source, store, schema }
    }

    pub async fn metrics(&self, block_hash: &str, runtime: &RuntimeFingerprint) -> Result<ChainMetrics> {
        let council_members = self.first_count(block_hash, runtime, self.schema.council_members).await?;
        let council_proposals = self.first_count(block_hash, runtime, self.schema.council_proposals).await?;
        let democracy_proposals = self.first_count(block_hash, runtime, &[DEMOCRACY_PROPOSALS]).await?;

        let token_supply = match self.schema.storage.resolve(TOTAL_ISSUANCE, runtime)? {
            Some(schema) => match self.read(block_hash, TOTAL_ISSUANCE).await? {
                Some(bytes) => schema.decode_amount(TOTAL_ISSUANCE, &bytes)?,
                None => 0,
            },
            None => 0,
        };

        Ok(ChainMetrics {
            council_members,
            council_proposals,
            democracy_proposals,
            token_supply,
        })
    }

    /// Compute, persist and return the snapshot for `header`.
    pub async fn take(&self, header: &BlockHeader, runtime: &RuntimeFingerprint) -> Result<ChainStateSnapshot> {
        let metrics = self.metrics(&header.hash, runtime).await?;
        let token_holders = self.store.count_holders().await.context("Failed to count holders")?;

        let snapshot = ChainStateSnapshot {
            id: block_id(header.height, &header.hash),
            block_number: header.height as i64,
            block_hash: header.hash.clone(),
            timestamp: block_time(header)?,
            council_members: metrics.council_members as i32,
            council_proposals: metrics.council_proposals as i32,
            democracy_proposals: metrics.democracy_proposals as i32,
            token_supply: to_numeric(metrics.token_supply),
            token_holders,
        };

        self.store
            .save_snapshot(&snapshot)
            .await
            .with_context(|| format!("Failed to save snapshot {}", snapshot.id))?;

        tracing::info!(
            "Snapshot at block {}: supply {}, {} holders, council {}/{} proposals, {} democracy proposals",
            header.height,
            snapshot.token_supply,
            token_holders,
            snapshot.council_members,
            snapshot.council_proposals,
            snapshot.democracy_proposals
        );
        metrics::counter!("chainstate_snapshots_total").increment(1);

        Ok(snapshot)
    }

    /// Value of the first present item in `names`, or 0 if none is present.
    async fn first_count(&self, block_hash: &str, runtime: &RuntimeFingerprint, names: &[&str]) -> Result<u32> {
        let Some((name, schema)) = self.schema.storage.resolve_first(names, runtime)? else {
            return Ok(0);
        };
        self.count(block_hash, name, schema).await
    }

    async fn count(&self, block_hash: &str, name: &str, schema: &StorageSchema) -> Result<u32> {
        match self.read(block_hash, name).await? {
            Some(bytes) => Ok(schema.decode_count(name, &bytes)?),
            None => Ok(0),
        }
    }

    async fn read(&self, block_hash: &str, name: &str) -> Result<Option<Vec<u8>>> {
        self.source
            .storage_value(block_hash, name)
            .await
            .with_context(|| format!("Failed to read {} at {}", name, block_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains;
    use crate::testing::{MemoryStore, ScriptedSource};
    use chainstate_common::{Account, ChainName};
    use chrono::TimeZone;
    use parity_scale_codec::Encode;

    const MEMBERS: &str = "f5df25eadcdffaa0d2a68b199d671d3921ca36a7b70d22d57506dca52b4b5895";
    const COUNT: &str = "81bbbe8e62451cbcc227306706c919527aa2538970bd6d67a9969dd52c257d02";
    const ISSUANCE: &str = "f8ebe28eb30158172c0ccf672f7747c46a244f892d08ef2ebcbaadde34a26bc0";

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn runtime(storage: &[(&str, &str)]) -> RuntimeFingerprint {
        RuntimeFingerprint {
            spec_name: "kusama".into(),
            spec_version: 1,
            storage: storage.iter().map(|(n, h)| (n.to_string(), h.to_string())).collect(),
            ..Default::default()
        }
    }

    fn header(height: u64, secs: i64) -> BlockHeader {
        BlockHeader {
            height,
            hash: format!("0x{:064x}", height),
            timestamp: secs * 1000,
            spec_version: 1,
        }
    }

    #[test]
    fn test_clock_first_block_always_due() {
        let clock = SnapshotClock::new(Duration::hours(12), None);
        assert!(clock.is_due(at(0)));
    }

    #[test]
    fn test_clock_cadence_uses_block_time() {
        let period = Duration::hours(12);
        let mut clock = SnapshotClock::new(period, None);
        let hour = 3600;
        let times = [0, 6 * hour, 12 * hour - 1, 12 * hour, 20 * hour, 24 * hour, 36 * hour + 5];

        let mut taken = Vec::new();
        for t in times {
            if clock.is_due(at(t)) {
                clock.record(at(t));
                taken.push(t);
            }
        }
        assert_eq!(taken, vec![0, 12 * hour, 24 * hour, 36 * hour + 5]);
    }

    #[tokio::test]
    async fn test_clock_recovers_from_store() {
        let store = MemoryStore::default();
        let schema = chains::for_chain(ChainName::Kusama);
        let source = ScriptedSource::default();
        Snapshotter::new(&source, &store, &schema)
            .take(&header(5, 1_000), &runtime(&[]))
            .await
            .unwrap();

        let clock = SnapshotClock::recover(Duration::hours(12), &store).await.unwrap();
        assert_eq!(clock.last(), Some(at(1_000)));
        assert!(!clock.is_due(at(1_000 + 3600)));
    }

    #[tokio::test]
    async fn test_metrics_fall_back_to_legacy_council() {
        let schema = chains::for_chain(ChainName::Kusama);
        let source = ScriptedSource::default();
        source.set_value("Instance1Collective.Members", vec![[1u8; 32], [2u8; 32]].encode());
        source.set_value("Instance1Collective.ProposalCount", 7u32.encode());
        source.set_value(DEMOCRACY_PROPOSALS, 3u32.encode());
        source.set_value(TOTAL_ISSUANCE, 1_000u128.encode());
        let store = MemoryStore::default();

        let legacy = runtime(&[
            ("Instance1Collective.Members", MEMBERS),
            ("Instance1Collective.ProposalCount", COUNT),
            (DEMOCRACY_PROPOSALS, COUNT),
            (TOTAL_ISSUANCE, ISSUANCE),
        ]);
        let metrics = Snapshotter::new(&source, &store, &schema)
            .metrics("0x01", &legacy)
            .await
            .unwrap();

        assert_eq!(
            metrics,
            ChainMetrics {
                council_members: 2,
                council_proposals: 7,
                democracy_proposals: 3,
                token_supply: 1_000,
            }
        );
    }

    #[tokio::test]
    async fn test_karura_general_council_metrics() {
        let schema = chains::for_chain(ChainName::Karura);
        let source = ScriptedSource::default();
        source.set_value("GeneralCouncil.Members", vec![[1u8; 32], [2u8; 32], [3u8; 32]].encode());
        source.set_value("GeneralCouncil.ProposalCount", 11u32.encode());
        let store = MemoryStore::default();

        let rt = runtime(&[
            ("GeneralCouncil.Members", MEMBERS),
            ("GeneralCouncil.ProposalCount", COUNT),
        ]);
        let metrics = Snapshotter::new(&source, &store, &schema).metrics("0x01", &rt).await.unwrap();
        assert_eq!(metrics.council_members, 3);
        assert_eq!(metrics.council_proposals, 11);
    }

    #[tokio::test]
    async fn test_moonriver_falls_back_to_instance1_council() {
        const MEMBERS_20: &str = "d14508def9da76532021b53d553e9048fd079e2e735d2393e6d531e6d1fd29ca";
        let schema = chains::for_chain(ChainName::Moonriver);
        let source = ScriptedSource::default();
        source.set_value("Instance1Collective.Members", vec![[1u8; 20], [2u8; 20]].encode());
        let store = MemoryStore::default();

        let rt = runtime(&[("Instance1Collective.Members", MEMBERS_20)]);
        let metrics = Snapshotter::new(&source, &store, &schema).metrics("0x01", &rt).await.unwrap();
        assert_eq!(metrics.council_members, 2);
    }

    #[tokio::test]
    async fn test_metrics_prefer_canonical_council() {
        let schema = chains::for_chain(ChainName::Kusama);
        let source = ScriptedSource::default();
        source.set_value("Council.Members", vec![[1u8; 32]].encode());
        source.set_value("Instance1Collective.Members", vec![[1u8; 32], [2u8; 32]].encode());
        let store = MemoryStore::default();

        let rt = runtime(&[("Council.Members", MEMBERS), ("Instance1Collective.Members", MEMBERS)]);
        let metrics = Snapshotter::new(&source, &store, &schema).metrics("0x01", &rt).await.unwrap();
        assert_eq!(metrics.council_members, 1);
    }

    #[tokio::test]
    async fn test_absent_metrics_are_zero() {
        let schema = chains::for_chain(ChainName::Kusama);
        let source = ScriptedSource::default();
        let store = MemoryStore::default();
        let metrics = Snapshotter::new(&source, &store, &schema)
            .metrics("0x01", &runtime(&[]))
            .await
            .unwrap();
        assert_eq!(metrics, ChainMetrics::default());
    }

    #[tokio::test]
    async fn test_unknown_council_version_is_fatal() {
        let schema = chains::for_chain(ChainName::Kusama);
        let source = ScriptedSource::default();
        let store = MemoryStore::default();
        let rt = runtime(&[("Council.Members", "deadbeef")]);
        assert!(Snapshotter::new(&source, &store, &schema).metrics("0x01", &rt).await.is_err());
    }

    #[tokio::test]
    async fn test_zero_balance_accounts_count_as_holders() {
        let schema = chains::for_chain(ChainName::Kusama);
        let source = ScriptedSource::default();
        let store = MemoryStore::default();
        store
            .upsert_accounts(&[
                Account::observed("a".into(), 0, 0, 1).unwrap(),
                Account::observed("b".into(), 5, 0, 1).unwrap(),
            ])
            .await
            .unwrap();

        let snapshot = Snapshotter::new(&source, &store, &schema)
            .take(&header(9, 60), &runtime(&[]))
            .await
            .unwrap();

        assert_eq!(snapshot.token_holders, 2);
        assert_eq!(snapshot.id, block_id(9, &header(9, 60).hash));
        assert_eq!(store.current_snapshot().unwrap(), snapshot);
    }
}
