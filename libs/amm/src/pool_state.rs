//! Immutable pool state value.

use crate::v2_math::V2Math;
use ethereum_types::U256;
use reservoir_types::PoolDescriptor;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Complete state of one pool at one instant.
///
/// Values of this type are never mutated: the transition engine consumes a
/// state and returns a new one, and the historical ledger owns the ordered
/// sequence. Fields are private so the only way to produce a non-empty
/// state is through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    descriptor: PoolDescriptor,
    reserve0: u128,
    reserve1: u128,
    total_liquidity: u128,
}

impl PoolState {
    /// The empty pre-first-mint state. Only an initializing mint is a valid
    /// transition out of it.
    pub fn uninitialized(descriptor: PoolDescriptor) -> Self {
        Self {
            descriptor,
            reserve0: 0,
            reserve1: 0,
            total_liquidity: 0,
        }
    }

    pub(crate) fn with_balances(
        descriptor: PoolDescriptor,
        reserve0: u128,
        reserve1: u128,
        total_liquidity: u128,
    ) -> Self {
        Self {
            descriptor,
            reserve0,
            reserve1,
            total_liquidity,
        }
    }

    pub fn descriptor(&self) -> PoolDescriptor {
        self.descriptor
    }

    pub fn reserve0(&self) -> u128 {
        self.reserve0
    }

    pub fn reserve1(&self) -> u128 {
        self.reserve1
    }

    /// Outstanding liquidity-share supply.
    pub fn total_liquidity(&self) -> u128 {
        self.total_liquidity
    }

    /// A pool is initialized once both reserves are funded; before that it
    /// only accepts an initializing mint.
    pub fn is_initialized(&self) -> bool {
        self.reserve0 > 0 && self.reserve1 > 0
    }

    /// The constant product `reserve0 * reserve1` at full 256-bit width.
    pub fn k(&self) -> U256 {
        V2Math::constant_product(self.reserve0, self.reserve1)
    }

    /// Spot price of token0 quoted in token1 (reserve1 / reserve0).
    ///
    /// Research convenience only: the quote is decimal and approximate for
    /// extreme reserves, and never feeds back into state math.
    pub fn spot_price(&self) -> Option<Decimal> {
        if !self.is_initialized() {
            return None;
        }
        let r0 = Decimal::from_u128(self.reserve0)?;
        let r1 = Decimal::from_u128(self.reserve1)?;
        r1.checked_div(r0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_types::{PoolAddress, TokenAddress};
    use rust_decimal_macros::dec;

    fn descriptor() -> PoolDescriptor {
        PoolDescriptor::new(
            PoolAddress::from_bytes([0xAA; 20]),
            TokenAddress::from_bytes([1; 20]),
            TokenAddress::from_bytes([2; 20]),
            30,
        )
        .unwrap()
    }

    #[test]
    fn uninitialized_state_is_empty() {
        let state = PoolState::uninitialized(descriptor());
        assert!(!state.is_initialized());
        assert_eq!(state.total_liquidity(), 0);
        assert_eq!(state.k(), ethereum_types::U256::zero());
        assert_eq!(state.spot_price(), None);
    }

    #[test]
    fn spot_price_quotes_token1_per_token0() {
        let state = PoolState::with_balances(descriptor(), 1000, 4000, 2000);
        assert_eq!(state.spot_price(), Some(dec!(4)));
    }

    #[test]
    fn k_uses_full_width() {
        let state = PoolState::with_balances(descriptor(), u128::MAX, u128::MAX, 1);
        let expected = ethereum_types::U256::from(u128::MAX) * ethereum_types::U256::from(u128::MAX);
        assert_eq!(state.k(), expected);
    }
}
