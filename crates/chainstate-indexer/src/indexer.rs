use anyhow::{Context, Result};
use chainstate_common::ChainDescriptor;
use chrono::Duration as ChainDuration;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::accounts::AccountStore;
use crate::balances::BalanceFetcher;
use crate::batch::FlushWindow;
use crate::chains::ChainSchema;
use crate::codec::RuntimeFingerprint;
use crate::collector::TouchedAccountCollector;
use crate::config::Config;
use crate::snapshot::{block_time, SnapshotClock, Snapshotter};
use crate::source::{Block, BlockHeader, ChainSource};
use crate::store::Store;

/// How long to wait for new finalized blocks once caught up.
const POLL_INTERVAL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone)]
pub struct IndexerOptions {
    pub start_block: u64,
    pub batch_size: u64,
    pub reindex: bool,
    pub snapshot_period: ChainDuration,
}

impl IndexerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_block: config.start_block,
            batch_size: config.batch_size.max(1),
            reindex: config.reindex,
            snapshot_period: ChainDuration::seconds(config.snapshot_period_secs),
        }
    }
}

/// State carried from block to block within one run.
pub(crate) struct PipelineState {
    clock: SnapshotClock,
    window: FlushWindow,
    runtimes: HashMap<u32, Arc<RuntimeFingerprint>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BatchStats {
    pub(crate) blocks: u64,
    pub(crate) accounts_flushed: usize,
    pub(crate) snapshots: usize,
}

struct FetchedBatch {
    from: u64,
    to: u64,
    blocks: Vec<Block>,
}

pub struct Indexer<C, S> {
    source: C,
    store: S,
    schema: ChainSchema,
    chain: &'static ChainDescriptor,
    options: IndexerOptions,
    reindex_pending: AtomicBool,
}

impl<C: ChainSource, S: Store> Indexer<C, S> {
    pub fn new(source: C, store: S, schema: ChainSchema, options: IndexerOptions) -> Self {
        let chain = schema.chain.descriptor();
        let reindex_pending = AtomicBool::new(options.reindex);
        Self {
            source,
            store,
            schema,
            chain,
            options,
            reindex_pending,
        }
    }

    pub async fn run(&self) -> Result<()> {
        // Truncate once per process, not on every restart of the run loop
        if self.reindex_pending.swap(false, Ordering::SeqCst) {
            tracing::warn!("Reindex flag set - truncating all tables");
            self.store.truncate().await?;
        }

        let mut next = self.get_start_block().await?;
        let mut state = self.initial_state().await?;
        tracing::info!(
            "Starting {} indexing from block {} (last snapshot: {:?})",
            self.chain.display_name,
            next,
            state.clock.last()
        );

        let mut head = self.source.finalized_height().await?;
        let mut pending: Option<FetchedBatch> = None;
        let mut last_log_time = Instant::now();

        loop {
            let batch = match pending.take() {
                Some(batch) => batch,
                None => {
                    if next > head {
                        head = self.source.finalized_height().await?;
                        tracing::debug!("Finalized head: {}, next: {}", head, next);
                        if next > head {
                            tokio::time::sleep(POLL_INTERVAL).await;
                            continue;
                        }
                    }
                    self.fetch(next, self.batch_end(next, head)).await?
                }
            };

            // Fetch the following batch while this one is processed.
            let prefetch = (batch.to < head).then(|| (batch.to + 1, self.batch_end(batch.to + 1, head)));
            let (processed, prefetched) = tokio::join!(self.process_batch(batch.from, &batch.blocks, &mut state), async {
                match prefetch {
                    Some((from, to)) => self.fetch(from, to).await.map(Some),
                    None => Ok(None),
                }
            });

            let stats = processed?;
            self.store.set_last_indexed_block(batch.to).await?;
            pending = match prefetched {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!("Prefetch failed, will refetch: {:#}", e);
                    None
                }
            };
            next = batch.to + 1;

            metrics::counter!("chainstate_blocks_processed_total").increment(stats.blocks);
            metrics::counter!("chainstate_accounts_flushed_total").increment(stats.accounts_flushed as u64);
            metrics::gauge!("chainstate_indexed_height").set(batch.to as f64);

            let elapsed = last_log_time.elapsed();
            let blocks_per_sec = stats.blocks as f64 / elapsed.as_secs_f64();
            let progress = (batch.to as f64 / head.max(1) as f64) * 100.0;

            tracing::info!(
                "Batch complete: {} to {} ({} blocks in {:.2}s = {:.1} blocks/sec, {} accounts, {} snapshots) | Progress: {:.2}%",
                batch.from, batch.to, stats.blocks, elapsed.as_secs_f64(), blocks_per_sec, stats.accounts_flushed, stats.snapshots, progress
            );

            last_log_time = Instant::now();
        }
    }

    pub(crate) async fn initial_state(&self) -> Result<PipelineState> {
        Ok(PipelineState {
            clock: SnapshotClock::recover(self.options.snapshot_period, &self.store).await?,
            window: FlushWindow::new(),
            runtimes: HashMap::new(),
        })
    }

    fn batch_end(&self, from: u64, head: u64) -> u64 {
        (from + self.options.batch_size - 1).min(head)
    }

    async fn fetch(&self, from: u64, to: u64) -> Result<FetchedBatch> {
        let blocks = self
            .source
            .blocks(from, to)
            .await
            .with_context(|| format!("Failed to fetch blocks {} to {}", from, to))?;
        Ok(FetchedBatch { from, to, blocks })
    }

    /// Process blocks in order starting at `from`, then flush whatever is left
    /// in the window.
    pub(crate) async fn process_batch(&self, from: u64, blocks: &[Block], state: &mut PipelineState) -> Result<BatchStats> {
        let collector = TouchedAccountCollector::new(&self.schema.events);
        let snapshotter = Snapshotter::new(&self.source, &self.store, &self.schema);
        let mut stats = BatchStats::default();

        for (expected, block) in (from..).zip(blocks) {
            let header = &block.header;
            anyhow::ensure!(
                header.height == expected,
                "Block {} out of order, expected {}",
                header.height,
                expected
            );

            let runtime = self.runtime(&mut state.runtimes, header.spec_version).await?;
            collector
                .collect_into(block, &runtime, &mut state.window.touched)
                .with_context(|| format!("Failed to collect accounts at block {}", header.height))?;
            state.window.blocks += 1;
            stats.blocks += 1;

            let timestamp = block_time(header)?;
            if state.clock.is_due(timestamp) {
                // Balances must be current as of this block before aggregates are read
                stats.accounts_flushed += self.flush(&mut state.window, header, &runtime).await?;
                snapshotter.take(header, &runtime).await?;
                state.clock.record(timestamp);
                stats.snapshots += 1;
            }
        }

        if let Some(last) = blocks.last() {
            if !state.window.is_empty() {
                let runtime = self.runtime(&mut state.runtimes, last.header.spec_version).await?;
                stats.accounts_flushed += self.flush(&mut state.window, &last.header, &runtime).await?;
            }
        }

        Ok(stats)
    }

    async fn flush(&self, window: &mut FlushWindow, header: &BlockHeader, runtime: &RuntimeFingerprint) -> Result<usize> {
        if window.is_empty() {
            return Ok(0);
        }
        let blocks = window.blocks;
        let accounts = window.take();

        let balances = BalanceFetcher::new(&self.source, &self.schema.storage)
            .fetch(&header.hash, runtime, &accounts)
            .await
            .with_context(|| format!("Failed to fetch balances at block {}", header.height))?;

        let observations: Vec<_> = accounts.into_iter().zip(balances).collect();
        let written = AccountStore::new(&self.store, self.chain)
            .save(header.height, &observations)
            .await
            .with_context(|| format!("Failed to save accounts at block {}", header.height))?;

        tracing::debug!(
            "Flushed {} accounts touched in {} blocks at block {}",
            written,
            blocks,
            header.height
        );
        Ok(written)
    }

    async fn runtime(
        &self,
        cache: &mut HashMap<u32, Arc<RuntimeFingerprint>>,
        spec_version: u32,
    ) -> Result<Arc<RuntimeFingerprint>> {
        if let Some(runtime) = cache.get(&spec_version) {
            return Ok(Arc::clone(runtime));
        }
        let runtime = Arc::new(
            self.source
                .runtime(spec_version)
                .await
                .with_context(|| format!("Failed to load runtime {}", spec_version))?,
        );
        tracing::info!("Loaded runtime {} v{}", runtime.spec_name, runtime.spec_version);
        cache.insert(spec_version, Arc::clone(&runtime));
        Ok(runtime)
    }

    async fn get_start_block(&self) -> Result<u64> {
        match self.store.last_indexed_block().await? {
            Some(last_block) => Ok(last_block + 1),
            None => Ok(self.options.start_block),
        }
    }
}
