//! # Chain Errors
//!
//! Error types for Ethereum node interaction.
//!
//! This module provides error types for RPC transport failures, transaction
//! assembly and broadcast problems, and on-chain execution failures.
//!
//! # Examples
//!
//! ```
//! use eth_sandbox::chain::error::ChainError;
//!
//! let error = ChainError::timeout("no receipt after 90000ms");
//! assert!(error.is_retryable());
//!
//! let error = ChainError::wallet("private key must be 32 bytes");
//! assert!(!error.is_retryable());
//! ```

use ethers::types::H256;
use thiserror::Error;

/// Error type for chain operations.
///
/// Represents errors that can occur when talking to an Ethereum node,
/// from transport failures through rejected transactions to reverted
/// contract calls.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Network or transport error reaching the node.
    #[error("node connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The node answered with a JSON-RPC error.
    #[error("rpc error: {message}")]
    Rpc {
        /// Error message.
        message: String,
        /// JSON-RPC error code, if the node supplied one.
        code: Option<i64>,
    },

    /// Transaction assembly, signing, or broadcast failed.
    #[error("transaction error: {message}")]
    Transaction {
        /// Error message.
        message: String,
    },

    /// A mined transaction was reverted by the EVM.
    #[error("transaction reverted: {tx_hash:#x}: {message}")]
    Reverted {
        /// Hash of the reverted transaction.
        tx_hash: H256,
        /// Error message.
        message: String,
    },

    /// Gas estimation failed.
    #[error("gas estimation error: {message}")]
    GasEstimation {
        /// Error message.
        message: String,
    },

    /// Sender balance cannot cover value plus maximum fee.
    #[error("insufficient funds: {message}")]
    InsufficientFunds {
        /// Error message.
        message: String,
    },

    /// A bounded wait elapsed without the chain confirming anything.
    #[error("chain timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Timeout duration in milliseconds.
        timeout_ms: Option<u64>,
    },

    /// The node reports a different chain id than the client expects.
    #[error("wrong chain: expected id {expected}, node reports {actual}")]
    WrongChain {
        /// Chain id the client was configured for.
        expected: u64,
        /// Chain id the node reported.
        actual: u64,
    },

    /// Malformed input such as an address, hash, or amount.
    #[error("parse error: {message}")]
    Parse {
        /// Error message.
        message: String,
    },

    /// Key material could not be loaded or used.
    #[error("wallet error: {message}")]
    Wallet {
        /// Error message.
        message: String,
    },
}

impl ChainError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an RPC error.
    #[must_use]
    pub fn rpc(message: impl Into<String>) -> Self {
        Self::Rpc {
            message: message.into(),
            code: None,
        }
    }

    /// Creates an RPC error with the node's error code.
    #[must_use]
    pub fn rpc_with_code(message: impl Into<String>, code: i64) -> Self {
        Self::Rpc {
            message: message.into(),
            code: Some(code),
        }
    }

    /// Creates a transaction error.
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Creates a reverted error for a mined-but-failed transaction.
    #[must_use]
    pub fn reverted(tx_hash: H256, message: impl Into<String>) -> Self {
        Self::Reverted {
            tx_hash,
            message: message.into(),
        }
    }

    /// Creates a gas estimation error.
    #[must_use]
    pub fn gas_estimation(message: impl Into<String>) -> Self {
        Self::GasEstimation {
            message: message.into(),
        }
    }

    /// Creates an insufficient funds error.
    #[must_use]
    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::InsufficientFunds {
            message: message.into(),
        }
    }

    /// Creates a wrong chain error.
    #[must_use]
    pub const fn wrong_chain(expected: u64, actual: u64) -> Self {
        Self::WrongChain { expected, actual }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: None,
        }
    }

    /// Creates a timeout error with the elapsed bound.
    #[must_use]
    pub fn timeout_with_duration(message: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            timeout_ms: Some(timeout_ms),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a wallet error.
    #[must_use]
    pub fn wallet(message: impl Into<String>) -> Self {
        Self::Wallet {
            message: message.into(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Retryable errors are transient and may succeed against the same
    /// node, or another node, without changing the request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Returns true if the chain executed and rejected the transaction.
    ///
    /// Reverts consumed gas on-chain; resubmitting the same call will
    /// fail again until contract state or input changes.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }

    /// Returns the JSON-RPC error code, if any.
    #[must_use]
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns the reverted transaction hash, if any.
    #[must_use]
    pub fn reverted_tx_hash(&self) -> Option<H256> {
        match self {
            Self::Reverted { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_is_retryable() {
        let error = ChainError::connection("dns lookup failed");
        assert!(error.is_retryable());
        assert!(!error.is_revert());
    }

    #[test]
    fn timeout_is_retryable() {
        let error = ChainError::timeout_with_duration("no receipt", 90_000);
        assert!(error.is_retryable());
        match error {
            ChainError::Timeout { timeout_ms, .. } => assert_eq!(timeout_ms, Some(90_000)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn revert_is_not_retryable() {
        let hash = H256::from_low_u64_be(7);
        let error = ChainError::reverted(hash, "status 0");
        assert!(!error.is_retryable());
        assert!(error.is_revert());
        assert_eq!(error.reverted_tx_hash(), Some(hash));
    }

    #[test]
    fn rpc_code_round_trip() {
        let error = ChainError::rpc_with_code("nonce too low", -32000);
        assert_eq!(error.rpc_code(), Some(-32000));
        assert_eq!(ChainError::rpc("generic").rpc_code(), None);
    }

    #[test]
    fn wrong_chain_display() {
        let error = ChainError::wrong_chain(11_155_111, 1);
        let display = error.to_string();
        assert!(display.contains("11155111"));
        assert!(display.contains("node reports 1"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn display_format() {
        let error = ChainError::insufficient_funds("need 1.5 ETH, have 0.2 ETH");
        let display = error.to_string();
        assert!(display.contains("insufficient funds"));
        assert!(display.contains("0.2 ETH"));
    }

    #[test]
    fn reverted_display_includes_hash() {
        let error = ChainError::reverted(H256::from_low_u64_be(0xbeef), "increment failed");
        let display = error.to_string();
        assert!(display.contains("0x"));
        assert!(display.contains("beef"));
        assert!(display.contains("increment failed"));
    }
}
