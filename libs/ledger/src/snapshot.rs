//! Checksummed binary snapshots of a ledger.
//!
//! Layout: a bincode-encoded body (descriptor, mint policy, rows) followed
//! by a 4-byte little-endian crc32 trailer over the body. Restoring always
//! replays the rows through [`PoolLedger::from_rows`], so a snapshot that
//! passes the checksum can still be rejected as corrupted if its persisted
//! states disagree with recomputation.

use crate::history::{LedgerError, PoolLedger};
use crate::rows::LedgerRow;
use reservoir_amm::MintPolicy;
use reservoir_types::PoolDescriptor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("snapshot too short to carry a checksum trailer")]
    Truncated,

    #[error("snapshot checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    descriptor: PoolDescriptor,
    mint_policy: MintPolicy,
    rows: Vec<LedgerRow>,
}

impl PoolLedger {
    /// Serialize the full ledger to a checksummed byte buffer.
    pub fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        let data = SnapshotData {
            descriptor: self.descriptor(),
            mint_policy: self.mint_policy(),
            rows: self.rows().collect(),
        };
        let mut bytes = bincode::serialize(&data)?;
        let crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        Ok(bytes)
    }

    /// Rebuild a ledger from snapshot bytes, verifying the checksum and
    /// replaying every event.
    pub fn restore(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() < 4 {
            return Err(SnapshotError::Truncated);
        }
        let body_len = bytes.len() - 4;
        let body = &bytes[..body_len];
        let stored = u32::from_le_bytes([
            bytes[body_len],
            bytes[body_len + 1],
            bytes[body_len + 2],
            bytes[body_len + 3],
        ]);
        let computed = crc32fast::hash(body);
        if stored != computed {
            return Err(SnapshotError::ChecksumMismatch { stored, computed });
        }

        let data: SnapshotData = bincode::deserialize(body)?;
        info!(
            pool = %data.descriptor.pool_address(),
            rows = data.rows.len(),
            "restoring ledger snapshot"
        );
        let ledger = PoolLedger::from_rows(data.descriptor, data.mint_policy, data.rows)?;
        Ok(ledger)
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        fs::write(path, self.snapshot()?)?;
        Ok(())
    }

    pub fn read_snapshot(path: &Path) -> Result<Self, SnapshotError> {
        Self::restore(&fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_types::{
        EventMeta, PoolAddress, PoolEvent, PoolMintEvent, PoolSwapEvent, TokenAddress, TokenSide,
    };

    fn seeded() -> PoolLedger {
        let descriptor = PoolDescriptor::new(
            PoolAddress::from_bytes([0xAA; 20]),
            TokenAddress::from_bytes([1; 20]),
            TokenAddress::from_bytes([2; 20]),
            30,
        )
        .unwrap();
        let mut ledger = PoolLedger::new(descriptor);
        ledger
            .append(
                EventMeta::new(1_000, 100),
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
                    amount_out_min: None,
                }),
            )
            .unwrap();
        ledger
    }

    #[test]
    fn snapshot_round_trips() {
        let ledger = seeded();
        let bytes = ledger.snapshot().unwrap();
        let restored = PoolLedger::restore(&bytes).unwrap();
        assert_eq!(restored.entries(), ledger.entries());
        assert_eq!(restored.descriptor(), ledger.descriptor());
        assert_eq!(restored.mint_policy(), ledger.mint_policy());
    }

    #[test]
    fn empty_ledger_snapshots() {
        let descriptor = seeded().descriptor();
        let ledger = PoolLedger::new(descriptor);
        let restored = PoolLedger::restore(&ledger.snapshot().unwrap()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn bit_flip_fails_the_checksum() {
        let ledger = seeded();
        let mut bytes = ledger.snapshot().unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0x01;
        assert!(matches!(
            PoolLedger::restore(&bytes),
            Err(SnapshotError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn checksum_valid_snapshot_with_forged_descriptor_is_rejected() {
        // Field bytes that never went through PoolDescriptor::new, like a
        // snapshot whose descriptor was patched and the trailer resealed.
        let forged: PoolDescriptor = bincode::deserialize(
            &bincode::serialize(&(
                PoolAddress::from_bytes([0xAA; 20]),
                TokenAddress::from_bytes([1; 20]),
                TokenAddress::from_bytes([2; 20]),
                20_000u32,
            ))
            .unwrap(),
        )
        .unwrap();
        let ledger = PoolLedger::new(forged);
        let err = PoolLedger::restore(&ledger.snapshot().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Ledger(LedgerError::Descriptor(_))
        ));
    }

    #[test]
    fn short_buffer_is_truncated() {
        assert!(matches!(
            PoolLedger::restore(&[0u8; 3]),
            Err(SnapshotError::Truncated)
        ));
    }
}
