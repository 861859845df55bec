//! # Reservoir Types - Pool Identity and Event Model
//!
//! ## Purpose
//!
//! Shared vocabulary for the Reservoir pool-state reconstruction engine:
//! chain-level identifiers (token, pool, and transaction addresses), the
//! validated pool descriptor with canonical token ordering, and the tagged
//! event union (Mint/Burn/Swap) that drives every state transition.
//!
//! ## Integration Points
//!
//! - **Consumed by**: `reservoir-amm` (transition engine input), `reservoir-ledger`
//!   (historical entries and the persistence row contract)
//! - **Produced by**: event decoders upstream of the core; this crate only
//!   defines the already-decoded record shapes
//! - **Serialization**: every type derives serde so the ledger's persistence
//!   boundary can carry them without lossy conversion
//!
//! ## Design Notes
//!
//! Events are a tagged union rather than a trait hierarchy so the transition
//! engine can dispatch exhaustively and the compiler proves every event kind
//! is handled. All amounts are `u128`: wide enough for 18-decimal token
//! reserves, and narrow enough that the AMM math can run intermediates
//! through a 256-bit integer without ever wrapping.

pub mod events;
pub mod identifiers;

pub use events::{
    EventKind, EventMeta, PoolBurnEvent, PoolEvent, PoolMintEvent, PoolSwapEvent, TokenSide,
};
pub use identifiers::{
    PoolAddress, PoolDescriptor, TokenAddress, TxHash, ValidationError, FEE_DENOMINATOR_BPS,
};
