//! # Reservoir AMM - Deterministic Constant-Product Engine
//!
//! ## Purpose
//!
//! Pure, integer-only mathematics and state transitions for a single
//! Uniswap-V2-style constant-product pool. Every operation is a total
//! function over well-formed inputs: the same `(state, event)` pair always
//! produces the same new state or the same error, which is what makes
//! historical replay bit-exact and reserve timelines trustworthy.
//!
//! ## Integration Points
//!
//! - **Input Sources**: decoded `PoolEvent` records from `reservoir-types`
//! - **Output Destinations**: `reservoir-ledger`, which owns the sequence of
//!   resulting `PoolState` values
//! - **Precision**: reserves and liquidity are `u128`; intermediate products
//!   run through 256-bit integers so `reserve0 * reserve1` never wraps
//! - **Purity**: no logging, no I/O, no interior mutability anywhere in this
//!   crate; the engine returns new values instead of mutating in place
//!
//! ## Architecture Role
//!
//! ```text
//! PoolEvent ──▶ [TransitionEngine::apply] ──▶ new PoolState
//!                      │
//!                      └── v2_math: floor mul-div, integer sqrt,
//!                          fee-adjusted constant-product output
//! ```

pub mod pool_state;
pub mod transition;
pub mod v2_math;

pub use pool_state::PoolState;
pub use transition::{MintPolicy, TransitionEngine, TransitionError, MINIMUM_LIQUIDITY};
pub use v2_math::{ArithmeticOverflow, V2Math};
