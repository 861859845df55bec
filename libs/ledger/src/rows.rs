//! The stable row contract consumed by persistence adapters.
//!
//! A [`LedgerRow`] is the flat, full-precision projection of one
//! [`HistoricalEntry`](crate::HistoricalEntry): stream position, event
//! payload columns, and the resulting reserves. Column order and integer
//! width are part of the contract; adapters map rows to a concrete
//! columnar container without ever downcasting the numbers.

use crate::history::{HistoricalEntry, LedgerError, PoolLedger};
use reservoir_amm::MintPolicy;
use reservoir_types::{
    EventKind, EventMeta, PoolBurnEvent, PoolDescriptor, PoolEvent, PoolMintEvent, PoolSwapEvent,
    TokenSide, TxHash,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// One ledger entry, flattened to columns.
///
/// Payload columns not applicable to the row's event kind are zero / `None`
/// and ignored on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub sequence_index: u64,
    pub timestamp_ns: u64,
    pub block_number: u64,
    pub tx_hash: Option<TxHash>,
    pub kind: EventKind,
    // Mint payload
    pub amount0_in: u128,
    pub amount1_in: u128,
    // Burn payload
    pub liquidity_burned: u128,
    // Swap payload
    pub amount_in: u128,
    pub token_in: Option<TokenSide>,
    pub amount_out_min: Option<u128>,
    // Resulting state snapshot (cache; re-validated on load)
    pub reserve0: u128,
    pub reserve1: u128,
    pub total_liquidity: u128,
}

impl LedgerRow {
    pub fn from_entry(entry: &HistoricalEntry) -> Self {
        let mut row = Self {
            sequence_index: entry.sequence_index(),
            timestamp_ns: entry.timestamp_ns(),
            block_number: entry.block_number(),
            tx_hash: entry.tx_hash(),
            kind: entry.event().kind(),
            amount0_in: 0,
            amount1_in: 0,
            liquidity_burned: 0,
            amount_in: 0,
            token_in: None,
            amount_out_min: None,
            reserve0: entry.state().reserve0(),
            reserve1: entry.state().reserve1(),
            total_liquidity: entry.state().total_liquidity(),
        };
        match *entry.event() {
            PoolEvent::Mint(mint) => {
                row.amount0_in = mint.amount0_in;
                row.amount1_in = mint.amount1_in;
            }
            PoolEvent::Burn(burn) => {
                row.liquidity_burned = burn.liquidity_burned;
            }
            PoolEvent::Swap(swap) => {
                row.amount_in = swap.amount_in;
                row.token_in = Some(swap.token_in);
                row.amount_out_min = swap.amount_out_min;
            }
        }
        row
    }

    /// Reassemble the event payload from the columns.
    pub fn event(&self) -> Result<PoolEvent, LedgerError> {
        match self.kind {
            EventKind::Mint => Ok(PoolEvent::Mint(PoolMintEvent {
                amount0_in: self.amount0_in,
                amount1_in: self.amount1_in,
            })),
            EventKind::Burn => Ok(PoolEvent::Burn(PoolBurnEvent {
                liquidity_burned: self.liquidity_burned,
            })),
            EventKind::Swap => {
                let token_in = self.token_in.ok_or(LedgerError::Corrupted {
                    sequence_index: self.sequence_index,
                    reason: "swap row carries no token_in column",
                })?;
                Ok(PoolEvent::Swap(PoolSwapEvent {
                    amount_in: self.amount_in,
                    token_in,
                    amount_out_min: self.amount_out_min,
                }))
            }
        }
    }

    pub fn meta(&self) -> EventMeta {
        EventMeta {
            timestamp_ns: self.timestamp_ns,
            block_number: self.block_number,
            tx_hash: self.tx_hash,
        }
    }
}

impl PoolLedger {
    /// Ordered projection of every entry onto the row contract.
    pub fn rows(&self) -> impl Iterator<Item = LedgerRow> + '_ {
        self.entries().iter().map(LedgerRow::from_entry)
    }

    /// Rebuild a ledger from persisted rows.
    ///
    /// The event columns are replayed through the transition engine and
    /// every recomputed state is compared against the row's persisted
    /// reserve columns; the persisted values are never trusted on their
    /// own. Any disagreement, or a gap in `sequence_index`, reports
    /// [`LedgerError::Corrupted`]. The descriptor itself is re-validated
    /// first; a malformed one reports [`LedgerError::Descriptor`].
    pub fn from_rows<I>(
        descriptor: PoolDescriptor,
        mint_policy: MintPolicy,
        rows: I,
    ) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = LedgerRow>,
    {
        // Deserialized descriptor bytes bypass construction, so the
        // invariants (distinct tokens, canonical order, fee bounds) must be
        // re-established before anything is replayed.
        let descriptor = PoolDescriptor::new(
            descriptor.pool_address(),
            descriptor.token0(),
            descriptor.token1(),
            descriptor.fee_bps(),
        )?;
        let mut ledger = Self::with_policy(descriptor, mint_policy);
        for (expected, row) in rows.into_iter().enumerate() {
            if row.sequence_index != expected as u64 {
                error!(
                    sequence_index = row.sequence_index,
                    expected, "sequence gap in persisted ledger"
                );
                return Err(LedgerError::Corrupted {
                    sequence_index: row.sequence_index,
                    reason: "sequence_index not contiguous",
                });
            }
            let event = row.event()?;
            let entry = ledger.append(row.meta(), event)?;
            let state = entry.state();
            if state.reserve0() != row.reserve0
                || state.reserve1() != row.reserve1
                || state.total_liquidity() != row.total_liquidity
            {
                error!(
                    sequence_index = row.sequence_index,
                    recomputed_reserve0 = state.reserve0(),
                    persisted_reserve0 = row.reserve0,
                    "persisted state disagrees with replay"
                );
                return Err(LedgerError::Corrupted {
                    sequence_index: row.sequence_index,
                    reason: "persisted state disagrees with recomputed state",
                });
            }
        }
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_types::{PoolAddress, TokenAddress, ValidationError};

    fn descriptor() -> PoolDescriptor {
        PoolDescriptor::new(
            PoolAddress::from_bytes([0xAA; 20]),
            TokenAddress::from_bytes([1; 20]),
            TokenAddress::from_bytes([2; 20]),
            30,
        )
        .unwrap()
    }

    fn seeded() -> PoolLedger {
        let mut ledger = PoolLedger::new(descriptor());
        ledger
            .append(
                EventMeta::new(1_000, 100).with_tx_hash(TxHash::from_bytes([9; 32])),
                PoolEvent::Mint(PoolMintEvent {
                    amount0_in: 1000,
                    amount1_in: 4000,
                }),
            )
            .unwrap();
        ledger
            .append(
                EventMeta::new(2_000, 101),
                PoolEvent::Swap(PoolSwapEvent {
                    amount_in: 1000,
                    token_in: TokenSide::Token0,
                    amount_out_min: Some(1),
                }),
            )
            .unwrap();
        ledger
    }

    #[test]
    fn rows_carry_stable_columns() {
        let ledger = seeded();
        let rows: Vec<LedgerRow> = ledger.rows().collect();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].kind, EventKind::Mint);
        assert_eq!(rows[0].amount0_in, 1000);
        assert_eq!(rows[0].tx_hash, Some(TxHash::from_bytes([9; 32])));
        assert_eq!(rows[0].reserve0, 1000);
        assert_eq!(rows[0].total_liquidity, 2000);

        assert_eq!(rows[1].kind, EventKind::Swap);
        assert_eq!(rows[1].token_in, Some(TokenSide::Token0));
        assert_eq!(rows[1].amount_out_min, Some(1));
        assert_eq!(rows[1].reserve0, 2000);
        assert_eq!(rows[1].reserve1, 2003);
    }

    #[test]
    fn from_rows_round_trips() {
        let ledger = seeded();
        let rows: Vec<LedgerRow> = ledger.rows().collect();
        let rebuilt =
            PoolLedger::from_rows(descriptor(), ledger.mint_policy(), rows).unwrap();
        assert_eq!(rebuilt.entries(), ledger.entries());
    }

    #[test]
    fn from_rows_detects_tampered_state() {
        let ledger = seeded();
        let mut rows: Vec<LedgerRow> = ledger.rows().collect();
        rows[1].reserve1 += 1;
        let err = PoolLedger::from_rows(descriptor(), ledger.mint_policy(), rows).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Corrupted {
                sequence_index: 1,
                ..
            }
        ));
    }

    #[test]
    fn from_rows_detects_sequence_gap() {
        let ledger = seeded();
        let mut rows: Vec<LedgerRow> = ledger.rows().collect();
        rows[1].sequence_index = 5;
        let err = PoolLedger::from_rows(descriptor(), ledger.mint_policy(), rows).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Corrupted {
                sequence_index: 5,
                ..
            }
        ));
    }

    /// Rebuild a descriptor from raw field bytes the way a deserializer
    /// would, skipping `PoolDescriptor::new`.
    fn forged_descriptor(
        token_a: TokenAddress,
        token_b: TokenAddress,
        fee_bps: u32,
    ) -> PoolDescriptor {
        let bytes = bincode::serialize(&(
            PoolAddress::from_bytes([0xAA; 20]),
            token_a,
            token_b,
            fee_bps,
        ))
        .unwrap();
        bincode::deserialize(&bytes).unwrap()
    }

    #[test]
    fn from_rows_rejects_out_of_bounds_fee() {
        let ledger = seeded();
        let rows: Vec<LedgerRow> = ledger.rows().collect();
        let forged = forged_descriptor(
            TokenAddress::from_bytes([1; 20]),
            TokenAddress::from_bytes([2; 20]),
            20_000,
        );
        let err = PoolLedger::from_rows(forged, ledger.mint_policy(), rows).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Descriptor(ValidationError::FeeOutOfBounds { fee_bps: 20_000 })
        );
    }

    #[test]
    fn from_rows_rejects_identical_tokens() {
        let ledger = seeded();
        let rows: Vec<LedgerRow> = ledger.rows().collect();
        let token = TokenAddress::from_bytes([1; 20]);
        let forged = forged_descriptor(token, token, 30);
        let err = PoolLedger::from_rows(forged, ledger.mint_policy(), rows).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Descriptor(ValidationError::IdenticalTokens(token))
        );
    }

    #[test]
    fn swap_row_without_token_in_is_corrupt() {
        let ledger = seeded();
        let mut rows: Vec<LedgerRow> = ledger.rows().collect();
        rows[1].token_in = None;
        let err = PoolLedger::from_rows(descriptor(), ledger.mint_policy(), rows).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupted { .. }));
    }
}
