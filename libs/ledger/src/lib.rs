//! # Reservoir Ledger - Append-Only Pool History
//!
//! ## Purpose
//!
//! The historical ledger for one constant-product pool: an ordered,
//! append-only arena of `(sequence, time, block, event, resulting state)`
//! entries built by replaying decoded events through the pure transition
//! engine. Supports point-in-time and range queries over the timeline,
//! verified reconstruction from persisted rows, and checksummed binary
//! snapshots.
//!
//! ## Integration Points
//!
//! - **Input Sources**: decoded `PoolEvent` streams (one ordered stream per
//!   ledger; multi-pool setups compose independent ledgers)
//! - **Output Destinations**: routing/research queries via `state_at` /
//!   `state_at_block` / `range`; persistence adapters via the stable
//!   `LedgerRow` column contract
//! - **Validation**: loading persisted rows always replays the events and
//!   cross-checks the stored states; snapshots are a cache, never truth
//!
//! ## Concurrency Model
//!
//! Single-threaded and synchronous. `append` reads the last state and
//! writes the next entry non-atomically, so concurrent producers must
//! serialize through one writer. Entries are immutable once appended and
//! only ever added at the tail (apart from the explicit, exclusive
//! `truncate`), so shared read access is safe whenever no writer runs.

pub mod history;
pub mod rows;
pub mod snapshot;

pub use history::{HistoricalEntry, LedgerError, PoolLedger};
pub use rows::LedgerRow;
pub use snapshot::SnapshotError;
