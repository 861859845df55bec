//! The append-only historical ledger and its query surface.

use reservoir_amm::{MintPolicy, PoolState, TransitionEngine, TransitionError};
use reservoir_types::{EventMeta, PoolDescriptor, PoolEvent, TxHash, ValidationError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Ledger-level failures. Every failure leaves the ledger untouched; no
/// partial entries, no silent drops or reorders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(
        "out-of-order event: timestamp {timestamp_ns} / block {block_number} \
         behind last entry at timestamp {last_timestamp_ns} / block {last_block_number}"
    )]
    OutOfOrderEvent {
        timestamp_ns: u64,
        block_number: u64,
        last_timestamp_ns: u64,
        last_block_number: u64,
    },

    #[error("transition rejected: {0}")]
    Transition(#[from] TransitionError),

    /// A persisted descriptor failed the same validation construction
    /// enforces. Serde bypasses `PoolDescriptor::new`, so loading re-checks.
    #[error("invalid pool descriptor: {0}")]
    Descriptor(#[from] ValidationError),

    /// A persisted snapshot disagreed with the recomputed state during
    /// verification. Unlike every other failure this one calls for
    /// full-ledger reconstruction from the raw event source, not a retry.
    #[error("persisted ledger corrupted at sequence {sequence_index}: {reason}")]
    Corrupted {
        sequence_index: u64,
        reason: &'static str,
    },
}

/// One recorded transition: the event, where it sat in the stream, and the
/// state it produced. Immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalEntry {
    sequence_index: u64,
    meta: EventMeta,
    event: PoolEvent,
    state: PoolState,
}

impl HistoricalEntry {
    /// Position in the ledger; strictly increasing and contiguous from 0.
    pub fn sequence_index(&self) -> u64 {
        self.sequence_index
    }

    pub fn timestamp_ns(&self) -> u64 {
        self.meta.timestamp_ns
    }

    pub fn block_number(&self) -> u64 {
        self.meta.block_number
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        self.meta.tx_hash
    }

    pub fn meta(&self) -> EventMeta {
        self.meta
    }

    pub fn event(&self) -> &PoolEvent {
        &self.event
    }

    /// The state after applying this entry's event.
    pub fn state(&self) -> &PoolState {
        &self.state
    }
}

/// Ordered, append-only history of one pool.
///
/// The ledger exclusively owns its entries; queries hand out borrowed
/// views of immutable snapshots. All writes go through [`PoolLedger::append`],
/// which either records a fully-applied transition or changes nothing.
#[derive(Debug, Clone)]
pub struct PoolLedger {
    engine: TransitionEngine,
    genesis: PoolState,
    entries: Vec<HistoricalEntry>,
}

impl PoolLedger {
    /// Empty ledger with the default (strict) mint policy.
    pub fn new(descriptor: PoolDescriptor) -> Self {
        Self::with_policy(descriptor, MintPolicy::default())
    }

    pub fn with_policy(descriptor: PoolDescriptor, mint_policy: MintPolicy) -> Self {
        Self {
            engine: TransitionEngine::new(mint_policy),
            genesis: PoolState::uninitialized(descriptor),
            entries: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> PoolDescriptor {
        self.genesis.descriptor()
    }

    pub fn mint_policy(&self) -> MintPolicy {
        self.engine.mint_policy()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[HistoricalEntry] {
        &self.entries
    }

    /// State after the most recent entry, or the uninitialized genesis
    /// state for an empty ledger.
    pub fn last_state(&self) -> &PoolState {
        self.entries
            .last()
            .map(|entry| &entry.state)
            .unwrap_or(&self.genesis)
    }

    /// Apply `event` to the current state and record the result.
    ///
    /// Timestamps and block numbers must be non-decreasing across appends;
    /// a violation is rejected with [`LedgerError::OutOfOrderEvent`] and
    /// the ledger is left exactly as it was.
    pub fn append(
        &mut self,
        meta: EventMeta,
        event: PoolEvent,
    ) -> Result<&HistoricalEntry, LedgerError> {
        if let Some(last) = self.entries.last() {
            if meta.timestamp_ns < last.meta.timestamp_ns
                || meta.block_number < last.meta.block_number
            {
                warn!(
                    timestamp_ns = meta.timestamp_ns,
                    block_number = meta.block_number,
                    last_timestamp_ns = last.meta.timestamp_ns,
                    last_block_number = last.meta.block_number,
                    "rejecting out-of-order event"
                );
                return Err(LedgerError::OutOfOrderEvent {
                    timestamp_ns: meta.timestamp_ns,
                    block_number: meta.block_number,
                    last_timestamp_ns: last.meta.timestamp_ns,
                    last_block_number: last.meta.block_number,
                });
            }
        }

        let state = self.engine.apply(self.last_state(), &event)?;
        let sequence_index = self.entries.len() as u64;
        debug!(
            sequence_index,
            block_number = meta.block_number,
            kind = %event.kind(),
            reserve0 = state.reserve0(),
            reserve1 = state.reserve1(),
            "appended pool event"
        );
        self.entries.push(HistoricalEntry {
            sequence_index,
            meta,
            event,
            state,
        });
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// State of the latest entry with `timestamp_ns' <= timestamp_ns`
    /// (last-known-value semantics), or `None` if the query precedes the
    /// first entry.
    pub fn state_at(&self, timestamp_ns: u64) -> Option<&PoolState> {
        let idx = self
            .entries
            .partition_point(|entry| entry.meta.timestamp_ns <= timestamp_ns);
        idx.checked_sub(1).map(|i| &self.entries[i].state)
    }

    /// Analogous lookup keyed by block number; several entries in one block
    /// resolve to the last entry recorded for that block.
    pub fn state_at_block(&self, block_number: u64) -> Option<&PoolState> {
        let idx = self
            .entries
            .partition_point(|entry| entry.meta.block_number <= block_number);
        idx.checked_sub(1).map(|i| &self.entries[i].state)
    }

    /// Entries with timestamp in `[from_ts, to_ts]`, ascending. Borrowed
    /// and restartable; never mutates the ledger.
    pub fn range(&self, from_ts: u64, to_ts: u64) -> impl Iterator<Item = &HistoricalEntry> {
        let start = self
            .entries
            .partition_point(|entry| entry.meta.timestamp_ns < from_ts);
        let end = self
            .entries
            .partition_point(|entry| entry.meta.timestamp_ns <= to_ts);
        self.entries[start..end.max(start)].iter()
    }

    /// Reconstruct a ledger from scratch by applying every event in order,
    /// starting from the uninitialized state.
    pub fn replay_from<I>(
        descriptor: PoolDescriptor,
        mint_policy: MintPolicy,
        events: I,
    ) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (EventMeta, PoolEvent)>,
    {
        let mut ledger = Self::with_policy(descriptor, mint_policy);
        for (meta, event) in events {
            ledger.append(meta, event)?;
        }
        info!(
            pool = %descriptor.pool_address(),
            entries = ledger.len(),
            "replayed event stream into fresh ledger"
        );
        Ok(ledger)
    }

    /// Drop every entry at index `len` and beyond. Exclusive operation:
    /// callers must ensure no concurrent readers hold entry borrows (the
    /// borrow checker enforces this within one thread).
    pub fn truncate(&mut self, len: usize) {
        if len < self.entries.len() {
            warn!(
                from = self.entries.len(),
                to = len,
                "truncating ledger tail"
            );
        }
        self.entries.truncate(len);
    }
}
