//! The state-transition engine: `apply(state, event) -> new state`.
//!
//! Pure and total for well-formed inputs. Every failure leaves the caller's
//! state untouched (the engine never mutates, it returns), and identical
//! inputs always reproduce the identical result or error.

use crate::pool_state::PoolState;
use crate::v2_math::{ArithmeticOverflow, V2Math};
use reservoir_types::{
    PoolBurnEvent, PoolEvent, PoolMintEvent, PoolSwapEvent, TokenSide, FEE_DENOMINATOR_BPS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share floor for an initializing mint, matching Uniswap V2's
/// MINIMUM_LIQUIDITY constant. Bootstrapping below it is rejected.
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Domain-level transition failures. Each is surfaced as a normal result
/// and leaves the pool state unchanged; retrying the same input reproduces
/// the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("zero amount where a positive amount is required")]
    ZeroInput,

    #[error("initial mint creates {minted} shares, below the minimum of {MINIMUM_LIQUIDITY}")]
    InsufficientInitialLiquidity { minted: u128 },

    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },

    #[error("slippage exceeded: output {amount_out} below required minimum {amount_out_min}")]
    SlippageExceeded {
        amount_out: u128,
        amount_out_min: u128,
    },

    #[error("imbalanced mint: {amount1_optimal} of token1 matches the pool ratio for the supplied token0")]
    ImbalancedMint { amount1_optimal: u128 },

    #[error("arithmetic overflow beyond 128-bit reserve bounds")]
    ArithmeticOverflow,
}

impl From<ArithmeticOverflow> for TransitionError {
    fn from(_: ArithmeticOverflow) -> Self {
        TransitionError::ArithmeticOverflow
    }
}

/// How a non-initializing mint whose amounts deviate from the current
/// reserve ratio is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MintPolicy {
    /// Reject deposits whose token1 amount deviates from the ratio-optimal
    /// counterpart by more than `tolerance_bps`; within tolerance both full
    /// amounts enter the reserves.
    Reject { tolerance_bps: u32 },
    /// Accept any deposit but only consume the ratio-matching prefix; the
    /// excess on the rich side stays with the caller.
    Truncate,
}

impl Default for MintPolicy {
    fn default() -> Self {
        // Strict by default: a reconstruction tool that silently absorbed
        // ratio-shifting deposits would mask upstream decoding bugs.
        MintPolicy::Reject { tolerance_bps: 0 }
    }
}

/// Applies events to pool states. Stateless apart from the configured mint
/// policy; cheap to copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionEngine {
    mint_policy: MintPolicy,
}

impl TransitionEngine {
    pub fn new(mint_policy: MintPolicy) -> Self {
        Self { mint_policy }
    }

    pub fn mint_policy(&self) -> MintPolicy {
        self.mint_policy
    }

    /// Compute the state after `event`. Never mutates `current`.
    pub fn apply(
        &self,
        current: &PoolState,
        event: &PoolEvent,
    ) -> Result<PoolState, TransitionError> {
        match event {
            PoolEvent::Mint(mint) => self.apply_mint(current, mint),
            PoolEvent::Burn(burn) => Self::apply_burn(current, burn),
            PoolEvent::Swap(swap) => Self::apply_swap(current, swap),
        }
    }

    fn apply_mint(
        &self,
        current: &PoolState,
        mint: &PoolMintEvent,
    ) -> Result<PoolState, TransitionError> {
        if mint.amount0_in == 0 || mint.amount1_in == 0 {
            return Err(TransitionError::ZeroInput);
        }

        if !current.is_initialized() {
            let minted = V2Math::initial_liquidity(mint.amount0_in, mint.amount1_in);
            if minted < MINIMUM_LIQUIDITY {
                return Err(TransitionError::InsufficientInitialLiquidity { minted });
            }
            return Ok(PoolState::with_balances(
                current.descriptor(),
                mint.amount0_in,
                mint.amount1_in,
                minted,
            ));
        }

        let (reserve0, reserve1) = (current.reserve0(), current.reserve1());
        let total = current.total_liquidity();

        let amount1_optimal = V2Math::mul_div_floor(mint.amount0_in, reserve1, reserve0)?;
        let (used0, used1) = match self.mint_policy {
            MintPolicy::Reject { tolerance_bps } => {
                if deviation_bps(mint.amount1_in, amount1_optimal) > u128::from(tolerance_bps) {
                    return Err(TransitionError::ImbalancedMint { amount1_optimal });
                }
                (mint.amount0_in, mint.amount1_in)
            }
            MintPolicy::Truncate => {
                if mint.amount1_in >= amount1_optimal {
                    (mint.amount0_in, amount1_optimal)
                } else {
                    let amount0_optimal =
                        V2Math::mul_div_floor(mint.amount1_in, reserve0, reserve1)?;
                    (amount0_optimal, mint.amount1_in)
                }
            }
        };

        let minted = V2Math::mul_div_floor(used0, total, reserve0)?
            .min(V2Math::mul_div_floor(used1, total, reserve1)?);
        if minted == 0 {
            // Deposit too small to mint a single share; accepting it would
            // break the strict-increase invariant on total_liquidity.
            return Err(TransitionError::ZeroInput);
        }

        let new_reserve0 = reserve0
            .checked_add(used0)
            .ok_or(TransitionError::ArithmeticOverflow)?;
        let new_reserve1 = reserve1
            .checked_add(used1)
            .ok_or(TransitionError::ArithmeticOverflow)?;
        let new_total = total
            .checked_add(minted)
            .ok_or(TransitionError::ArithmeticOverflow)?;

        Ok(PoolState::with_balances(
            current.descriptor(),
            new_reserve0,
            new_reserve1,
            new_total,
        ))
    }

    fn apply_burn(current: &PoolState, burn: &PoolBurnEvent) -> Result<PoolState, TransitionError> {
        if burn.liquidity_burned == 0 {
            return Err(TransitionError::ZeroInput);
        }
        let total = current.total_liquidity();
        if burn.liquidity_burned > total {
            return Err(TransitionError::InsufficientLiquidity {
                requested: burn.liquidity_burned,
                available: total,
            });
        }

        let amount0 = V2Math::proportional_amount(burn.liquidity_burned, current.reserve0(), total)?;
        let amount1 = V2Math::proportional_amount(burn.liquidity_burned, current.reserve1(), total)?;

        // Floor division keeps the redemption within reserves; burning the
        // entire supply drains them exactly and the pool returns to the
        // uninitialized state.
        Ok(PoolState::with_balances(
            current.descriptor(),
            current.reserve0() - amount0,
            current.reserve1() - amount1,
            total - burn.liquidity_burned,
        ))
    }

    fn apply_swap(current: &PoolState, swap: &PoolSwapEvent) -> Result<PoolState, TransitionError> {
        if swap.amount_in == 0 {
            return Err(TransitionError::ZeroInput);
        }
        if !current.is_initialized() {
            return Err(TransitionError::InsufficientLiquidity {
                requested: swap.amount_in,
                available: 0,
            });
        }

        let fee_bps = current.descriptor().fee_bps();
        debug_assert!(fee_bps < FEE_DENOMINATOR_BPS);
        let (reserve_in, reserve_out) = match swap.token_in {
            TokenSide::Token0 => (current.reserve0(), current.reserve1()),
            TokenSide::Token1 => (current.reserve1(), current.reserve0()),
        };

        let after_fee = V2Math::amount_in_after_fee(swap.amount_in, fee_bps);
        let amount_out = V2Math::amount_out(after_fee, reserve_in, reserve_out);
        if let Some(amount_out_min) = swap.amount_out_min {
            if amount_out < amount_out_min {
                return Err(TransitionError::SlippageExceeded {
                    amount_out,
                    amount_out_min,
                });
            }
        }

        // The full input lands in the pool; the fee portion accrues to the
        // reserves.
        let new_reserve_in = reserve_in
            .checked_add(swap.amount_in)
            .ok_or(TransitionError::ArithmeticOverflow)?;
        let new_reserve_out = reserve_out - amount_out;

        let next = match swap.token_in {
            TokenSide::Token0 => PoolState::with_balances(
                current.descriptor(),
                new_reserve_in,
                new_reserve_out,
                current.total_liquidity(),
            ),
            TokenSide::Token1 => PoolState::with_balances(
                current.descriptor(),
                new_reserve_out,
                new_reserve_in,
                current.total_liquidity(),
            ),
        };

        // Floor rounding on the retained product can over-credit the output
        // by one unit when the trade dwarfs a near-empty pool; the product
        // must never shrink, so such trades are rejected as too large for
        // the available depth.
        if next.k() < current.k() {
            return Err(TransitionError::InsufficientLiquidity {
                requested: swap.amount_in,
                available: reserve_out,
            });
        }

        Ok(next)
    }
}

/// Relative deviation of `actual` from `optimal` in basis points.
fn deviation_bps(actual: u128, optimal: u128) -> u128 {
    if optimal == 0 {
        return if actual == 0 { 0 } else { u128::MAX };
    }
    let diff = actual.abs_diff(optimal);
    // diff / optimal in bps, rounded up so a tolerance of zero means exact.
    diff.saturating_mul(u128::from(FEE_DENOMINATOR_BPS))
        .div_ceil(optimal)
}
