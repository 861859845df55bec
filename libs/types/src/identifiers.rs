//! Chain-level identifiers and the validated pool descriptor.
//!
//! Addresses are fixed-width byte arrays, never strings: 20 bytes for
//! tokens and pools, 32 bytes for transaction hashes. Hex formatting is a
//! display concern only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fee denominator: fees are expressed in basis points (1 bps = 0.01%).
pub const FEE_DENOMINATOR_BPS: u32 = 10_000;

/// Malformed construction input. Rejected before any state exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("token0 and token1 must differ, both are {0}")]
    IdenticalTokens(TokenAddress),

    #[error("fee tier {fee_bps} bps is out of bounds (must be < {FEE_DENOMINATOR_BPS})")]
    FeeOutOfBounds { fee_bps: u32 },

    #[error("invalid hex identifier {input:?}: expected {expected_len} bytes")]
    InvalidHex { input: String, expected_len: usize },
}

macro_rules! fixed_bytes_id {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name([u8; $len]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let stripped = s.strip_prefix("0x").unwrap_or(s);
                let invalid = || ValidationError::InvalidHex {
                    input: s.to_string(),
                    expected_len: $len,
                };
                let bytes = hex::decode(stripped).map_err(|_| invalid())?;
                let bytes: [u8; $len] = bytes.try_into().map_err(|_| invalid())?;
                Ok(Self(bytes))
            }
        }
    };
}

fixed_bytes_id!(
    /// 20-byte ERC-20 token contract address.
    TokenAddress,
    20
);
fixed_bytes_id!(
    /// 20-byte pool contract address.
    PoolAddress,
    20
);
fixed_bytes_id!(
    /// 32-byte transaction hash of the chain event a ledger entry was decoded from.
    TxHash,
    32
);

/// Immutable identity of one constant-product pool.
///
/// Construction normalizes token order (lexicographic over the raw address
/// bytes) so a pool's identity is independent of the order the caller named
/// the tokens in, and validates the fee tier once so the transition engine
/// never has to re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolDescriptor {
    pool_address: PoolAddress,
    token0: TokenAddress,
    token1: TokenAddress,
    fee_bps: u32,
}

impl PoolDescriptor {
    /// Build a descriptor, sorting the token pair into canonical order.
    pub fn new(
        pool_address: PoolAddress,
        token_a: TokenAddress,
        token_b: TokenAddress,
        fee_bps: u32,
    ) -> Result<Self, ValidationError> {
        if token_a == token_b {
            return Err(ValidationError::IdenticalTokens(token_a));
        }
        if fee_bps >= FEE_DENOMINATOR_BPS {
            return Err(ValidationError::FeeOutOfBounds { fee_bps });
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Ok(Self {
            pool_address,
            token0,
            token1,
            fee_bps,
        })
    }

    pub fn pool_address(&self) -> PoolAddress {
        self.pool_address
    }

    /// Canonically first token of the pair.
    pub fn token0(&self) -> TokenAddress {
        self.token0
    }

    /// Canonically second token of the pair.
    pub fn token1(&self) -> TokenAddress {
        self.token1
    }

    /// Fee tier in basis points, fixed at pool creation.
    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }
}
