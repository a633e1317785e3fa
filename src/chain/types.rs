//! # Chain Read Models
//!
//! Flattened views of blocks and receipts.
//!
//! RPC payloads carry many optional fields because the same shapes serve
//! pending and mined objects. The summaries here are the mined-only
//! projections the demos actually consume, with the `Option` handling done
//! once at the conversion boundary.

use crate::chain::error::{ChainError, ChainResult};
use chrono::{DateTime, Utc};
use ethers::types::{Address, Block, H256, TransactionReceipt, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a mined transaction, decoded from the receipt status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Receipt status 1: execution succeeded.
    Success,
    /// Receipt status 0: execution reverted; gas was still consumed.
    Failed,
}

impl TxStatus {
    /// Decodes the receipt `status` field.
    ///
    /// Anything other than an explicit `1` counts as failed.
    #[must_use]
    pub fn from_status_field(status: Option<u64>) -> Self {
        match status {
            Some(1) => Self::Success,
            _ => Self::Failed,
        }
    }

    /// Returns true for [`TxStatus::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Summary of a mined block.
///
/// Built from a block fetched with transaction hashes only; the demos
/// never need full transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Block height.
    pub number: u64,
    /// Block hash.
    pub hash: H256,
    /// Parent block hash.
    pub parent_hash: H256,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Number of transactions in the block.
    pub tx_count: usize,
    /// Total gas consumed by the block.
    pub gas_used: U256,
    /// Block gas limit.
    pub gas_limit: U256,
    /// Base fee per gas, absent on pre-London chains.
    pub base_fee_per_gas: Option<U256>,
}

impl BlockSummary {
    /// Builds a summary from a mined block.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Parse`] if the block has no number or hash,
    /// which means the node returned a pending block.
    pub fn try_from_block(block: &Block<H256>) -> ChainResult<Self> {
        let number = block
            .number
            .ok_or_else(|| ChainError::parse("block has no number, still pending"))?
            .as_u64();
        let hash = block
            .hash
            .ok_or_else(|| ChainError::parse("block has no hash, still pending"))?;

        let timestamp = u64::try_from(block.timestamp)
            .map_err(|_| ChainError::parse("block timestamp exceeds u64"))?;

        Ok(Self {
            number,
            hash,
            parent_hash: block.parent_hash,
            timestamp,
            tx_count: block.transactions.len(),
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            base_fee_per_gas: block.base_fee_per_gas,
        })
    }

    /// Returns the block timestamp as a UTC datetime.
    ///
    /// `None` if the timestamp does not fit a chrono datetime, which no
    /// real chain produces.
    #[must_use]
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block #{} ({:#x}, timestamp {}, {} txs)",
            self.number, self.hash, self.timestamp, self.tx_count
        )
    }
}

/// Summary of a mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    /// Transaction hash.
    pub tx_hash: H256,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Gas consumed by this transaction.
    pub gas_used: Option<U256>,
    /// Actual per-gas price paid.
    pub effective_gas_price: Option<U256>,
    /// Execution outcome.
    pub status: TxStatus,
    /// Address of the created contract, for deployment transactions.
    pub contract_address: Option<Address>,
}

impl ReceiptSummary {
    /// Builds a summary from a mined receipt.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Parse`] if the receipt carries no block
    /// number, which means the transaction is not mined yet.
    pub fn try_from_receipt(receipt: &TransactionReceipt) -> ChainResult<Self> {
        let block_number = receipt
            .block_number
            .ok_or_else(|| ChainError::parse("receipt has no block number, not mined yet"))?
            .as_u64();

        Ok(Self {
            tx_hash: receipt.transaction_hash,
            block_number,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            status: TxStatus::from_status_field(receipt.status.map(|s| s.as_u64())),
            contract_address: receipt.contract_address,
        })
    }

    /// Returns true if the transaction executed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the total fee paid in wei, when the receipt reports both
    /// gas used and the effective price.
    #[must_use]
    pub fn fee_paid_wei(&self) -> Option<U256> {
        match (self.gas_used, self.effective_gas_price) {
            (Some(gas), Some(price)) => Some(gas.saturating_mul(price)),
            _ => None,
        }
    }
}

impl fmt::Display for ReceiptSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx {:#x} in block #{}: {}",
            self.tx_hash, self.block_number, self.status
        )
    }
}
