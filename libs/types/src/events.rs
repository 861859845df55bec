//! Decoded pool events and their stream metadata.
//!
//! These are the already-decoded records the transition engine consumes;
//! how they were sourced from a chain is outside the core. Every payload
//! field is an exact integer in the token's native decimals.

use crate::identifiers::TxHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the pair a swap sells into the pool; the output is drawn
/// from the opposite reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSide {
    Token0,
    Token1,
}

/// Liquidity deposit. The first mint on an empty pool initializes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMintEvent {
    pub amount0_in: u128,
    pub amount1_in: u128,
}

/// Redemption of liquidity shares for the underlying reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBurnEvent {
    pub liquidity_burned: u128,
}

/// Constant-product trade of one token for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSwapEvent {
    pub amount_in: u128,
    pub token_in: TokenSide,
    /// Minimum acceptable output; the transition fails if the computed
    /// output lands below it.
    pub amount_out_min: Option<u128>,
}

/// Tagged union over everything that can mutate pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    Mint(PoolMintEvent),
    Burn(PoolBurnEvent),
    Swap(PoolSwapEvent),
}

impl PoolEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PoolEvent::Mint(_) => EventKind::Mint,
            PoolEvent::Burn(_) => EventKind::Burn,
            PoolEvent::Swap(_) => EventKind::Swap,
        }
    }
}

/// Discriminant tag, used as a column value by the persistence contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Mint,
    Burn,
    Swap,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Mint => "mint",
            EventKind::Burn => "burn",
            EventKind::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// Stream position of an event: when it happened and where on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub timestamp_ns: u64,
    pub block_number: u64,
    /// Transaction the event was observed in, when the decoder knows it.
    pub tx_hash: Option<TxHash>,
}

impl EventMeta {
    pub fn new(timestamp_ns: u64, block_number: u64) -> Self {
        Self {
            timestamp_ns,
            block_number,
            tx_hash: None,
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: TxHash) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_tags() {
        let mint = PoolEvent::Mint(PoolMintEvent {
            amount0_in: 1,
            amount1_in: 2,
        });
        let burn = PoolEvent::Burn(PoolBurnEvent { liquidity_burned: 3 });
        let swap = PoolEvent::Swap(PoolSwapEvent {
            amount_in: 4,
            token_in: TokenSide::Token0,
            amount_out_min: None,
        });
        assert_eq!(mint.kind(), EventKind::Mint);
        assert_eq!(burn.kind(), EventKind::Burn);
        assert_eq!(swap.kind(), EventKind::Swap);
        assert_eq!(swap.kind().to_string(), "swap");
    }

    #[test]
    fn events_serialize_with_full_precision() {
        let swap = PoolEvent::Swap(PoolSwapEvent {
            amount_in: u128::MAX,
            token_in: TokenSide::Token1,
            amount_out_min: Some(u128::MAX - 1),
        });
        let json = serde_json::to_string(&swap).unwrap();
        let back: PoolEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, swap);
    }
}
