//! Uniswap V2 AMM math with exact integer arithmetic.
//!
//! All values are `u128` in the token's native decimals; every intermediate
//! product is computed in 256 bits so nothing wraps, and every division
//! floors, matching on-chain fixed-point behavior bit for bit.

use ethereum_types::U256;
use reservoir_types::FEE_DENOMINATOR_BPS;
use thiserror::Error;

/// A result exceeded the 128-bit reserve bound.
///
/// Wrapping silently would corrupt every downstream historical entry, so
/// narrowing is always checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("arithmetic overflow beyond 128-bit bounds")]
pub struct ArithmeticOverflow;

/// V2 AMM math functions with zero precision loss.
pub struct V2Math;

impl V2Math {
    /// `floor(a * b / denominator)` without intermediate overflow.
    ///
    /// Callers guarantee `denominator > 0`; every call site divides by a
    /// reserve or liquidity total already checked to be positive.
    pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128, ArithmeticOverflow> {
        debug_assert!(denominator > 0, "mul_div_floor denominator must be positive");
        let wide = U256::from(a) * U256::from(b) / U256::from(denominator);
        Self::narrow(wide)
    }

    /// Constant product `reserve0 * reserve1` at full width.
    pub fn constant_product(reserve0: u128, reserve1: u128) -> U256 {
        U256::from(reserve0) * U256::from(reserve1)
    }

    /// Bootstrap liquidity for an initializing mint: the integer square
    /// root (geometric mean) of the two deposits.
    pub fn initial_liquidity(amount0: u128, amount1: u128) -> u128 {
        let product = U256::from(amount0) * U256::from(amount1);
        // isqrt of a 256-bit value always fits in 128 bits.
        product.integer_sqrt().as_u128()
    }

    /// Apply the fee multiplier `(FEE_DENOM - fee_bps) / FEE_DENOM` to an
    /// input amount, flooring. The result never exceeds `amount_in`.
    pub fn amount_in_after_fee(amount_in: u128, fee_bps: u32) -> u128 {
        debug_assert!(fee_bps < FEE_DENOMINATOR_BPS);
        let numerator = U256::from(amount_in) * U256::from(FEE_DENOMINATOR_BPS - fee_bps);
        (numerator / U256::from(FEE_DENOMINATOR_BPS)).as_u128()
    }

    /// Output drawn from the opposite reserve for a fee-adjusted input:
    /// `reserve_out - floor(reserve_in * reserve_out / (reserve_in + amount_in_after_fee))`.
    ///
    /// Callers guarantee both reserves are positive. The result is at most
    /// `reserve_out`, so it always fits.
    pub fn amount_out(amount_in_after_fee: u128, reserve_in: u128, reserve_out: u128) -> u128 {
        debug_assert!(reserve_in > 0 && reserve_out > 0);
        let k = U256::from(reserve_in) * U256::from(reserve_out);
        let denominator = U256::from(reserve_in) + U256::from(amount_in_after_fee);
        let retained = (k / denominator).as_u128();
        reserve_out - retained.min(reserve_out)
    }

    /// Proportional share of a reserve for `liquidity` of `total_liquidity`
    /// shares, flooring. Used by both mint accounting and burn redemption.
    pub fn proportional_amount(
        liquidity: u128,
        reserve: u128,
        total_liquidity: u128,
    ) -> Result<u128, ArithmeticOverflow> {
        Self::mul_div_floor(liquidity, reserve, total_liquidity)
    }

    fn narrow(wide: U256) -> Result<u128, ArithmeticOverflow> {
        if wide > U256::from(u128::MAX) {
            Err(ArithmeticOverflow)
        } else {
            Ok(wide.as_u128())
        }
    }
}
