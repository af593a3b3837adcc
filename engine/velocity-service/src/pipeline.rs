//! Sharded line pipeline: requests in, ordered responses out
//!
//! Topology: one reader task (decode, stamp a sequence number, shard
//! by customer) feeding N worker tasks (evaluate-and-persist, FIFO per
//! shard) feeding one sink (sequence-keyed reorder buffer). A customer
//! always hashes to the same shard, so its requests are evaluated in
//! input order; the sink writes responses in global input order no
//! matter which worker finished first. Duplicate and malformed
//! requests still consume a sequence slot — the sink skips the slot
//! silently, which is how "no response line" falls out without
//! reordering anything.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use load_gateway::{decode_request, LoadHandler};
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use velocity_core::LoadRequest;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of worker tasks (and shards)
    pub workers: usize,

    /// Bound on each inter-task channel
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: 4, channel_capacity: 256 }
    }
}

/// Running counters for one pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    lines_read: AtomicU64,
    malformed: AtomicU64,
    duplicates: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    responses_written: AtomicU64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            responses_written: self.responses_written.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub lines_read: u64,
    pub malformed: u64,
    pub duplicates: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub responses_written: u64,
}

// Fixed keys keep customer placement stable across runs and hosts.
const SHARD_KEY_0: u64 = 0x76656c6f63697479;
const SHARD_KEY_1: u64 = 0x6c696d6974730000;

/// Deterministic customer-to-shard mapping
fn shard_for_customer(customer_id: &str, num_shards: usize) -> usize {
    let mut hasher = SipHasher13::new_with_keys(SHARD_KEY_0, SHARD_KEY_1);
    customer_id.hash(&mut hasher);
    (hasher.finish() % num_shards as u64) as usize
}

/// What the sink does with one sequence slot
enum Slot {
    /// Write this encoded response line
    Line(String),
    /// Advance past the slot without writing (duplicate or malformed)
    Suppressed,
}

/// One end-to-end pipeline run over a request stream
pub struct Pipeline {
    handler: LoadHandler,
    config: PipelineConfig,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    pub fn new(handler: LoadHandler, config: PipelineConfig) -> Self {
        Self { handler, config, stats: Arc::new(PipelineStats::default()) }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Drive the stream to completion and return the final counters.
    ///
    /// Terminates at end of input once every in-flight request has
    /// been evaluated and every writable response flushed.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<StatsSnapshot>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let num_shards = self.config.workers;
        let (sink_tx, mut sink_rx) = mpsc::channel::<(u64, Slot)>(self.config.channel_capacity);

        let mut shard_txs = Vec::with_capacity(num_shards);
        let mut worker_handles = Vec::with_capacity(num_shards);
        for shard in 0..num_shards {
            let (tx, mut rx) = mpsc::channel::<(u64, LoadRequest)>(self.config.channel_capacity);
            shard_txs.push(tx);

            let handler = self.handler.clone();
            let stats = self.stats.clone();
            let sink_tx = sink_tx.clone();
            worker_handles.push(tokio::spawn(async move {
                while let Some((seq, request)) = rx.recv().await {
                    let slot = match handler.handle(&request) {
                        Some(response) => {
                            if response.accepted {
                                stats.accepted.fetch_add(1, Ordering::Relaxed);
                            } else {
                                stats.rejected.fetch_add(1, Ordering::Relaxed);
                            }
                            match response.to_json() {
                                Ok(line) => Slot::Line(line),
                                Err(e) => {
                                    warn!(error = %e, load_id = %response.id, "failed to encode response");
                                    Slot::Suppressed
                                }
                            }
                        }
                        None => {
                            stats.duplicates.fetch_add(1, Ordering::Relaxed);
                            Slot::Suppressed
                        }
                    };
                    if sink_tx.send((seq, slot)).await.is_err() {
                        break;
                    }
                }
                debug!(shard, "worker drained");
            }));
        }

        let janitor = self.spawn_janitor();

        let reader_stats = self.stats.clone();
        let reader_sink_tx = sink_tx.clone();
        drop(sink_tx);
        let reader = tokio::spawn(async move {
            let mut lines = input.lines();
            let mut seq: u64 = 0;
            while let Some(line) = lines.next_line().await.context("Failed to read input line")? {
                if line.trim().is_empty() {
                    continue;
                }
                reader_stats.lines_read.fetch_add(1, Ordering::Relaxed);
                match decode_request(&line) {
                    Ok(request) => {
                        let shard = shard_for_customer(&request.customer_id, num_shards);
                        if shard_txs[shard].send((seq, request)).await.is_err() {
                            anyhow::bail!("Worker {shard} stopped accepting requests");
                        }
                    }
                    Err(e) => {
                        reader_stats.malformed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "dropping malformed request line");
                        if reader_sink_tx.send((seq, Slot::Suppressed)).await.is_err() {
                            anyhow::bail!("Response sink stopped accepting slots");
                        }
                    }
                }
                seq += 1;
            }
            Ok::<(), anyhow::Error>(())
        });

        // Sink runs on this task: the reorder buffer holds any slot
        // that arrives before its predecessors have been written.
        let mut pending: BTreeMap<u64, Slot> = BTreeMap::new();
        let mut next_seq: u64 = 0;
        while let Some((seq, slot)) = sink_rx.recv().await {
            pending.insert(seq, slot);
            while let Some(slot) = pending.remove(&next_seq) {
                if let Slot::Line(line) = slot {
                    output.write_all(line.as_bytes()).await.context("Failed to write response")?;
                    output.write_all(b"\n").await.context("Failed to write response")?;
                    self.stats.responses_written.fetch_add(1, Ordering::Relaxed);
                }
                next_seq += 1;
            }
        }
        output.flush().await.context("Failed to flush responses")?;
        debug_assert!(pending.is_empty());

        if let Some(handle) = janitor {
            handle.abort();
        }
        reader.await.context("Reader task panicked")??;
        for handle in worker_handles {
            handle.await.context("Worker task panicked")?;
        }

        Ok(self.stats.snapshot())
    }

    /// Periodic sweep of expired store entries, if sweeping is enabled
    fn spawn_janitor(&self) -> Option<tokio::task::JoinHandle<()>> {
        let every = self.handler.store().config().purge_interval()?;
        let store = self.handler.store().clone();
        Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.tick().await; // first tick fires immediately
            loop {
                tick.tick().await;
                let evicted = store.purge_expired();
                debug!(evicted, "account store janitor sweep");
            }
        }))
    }
}
