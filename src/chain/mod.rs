//! # Chain Access
//!
//! Talking to an Ethereum node over JSON-RPC.
//!
//! ## Available Components
//!
//! - [`EthereumClient`]: HTTP JSON-RPC client
//! - [`Network`]: Chain identity and explorer links
//! - [`GasPrice`] / [`GasStrategy`] / [`TxPriority`]: Fee quoting
//! - [`GasEstimator`]: Gas limits with a safety buffer
//! - [`BlockSummary`] / [`ReceiptSummary`]: Mined-object read models
//! - [`ChainError`]: Typed failure surface
//!
//! ## Supported Networks
//!
//! - Ethereum mainnet
//! - Sepolia
//! - Holesky
//! - Local development chains (anvil, hardhat)

pub mod client;
pub mod error;
pub mod gas;
pub mod network;
pub mod types;

pub use client::EthereumClient;
pub use error::{ChainError, ChainResult};
pub use gas::{FeeSnapshot, GasEstimator, GasPrice, GasStrategy, TxPriority};
pub use network::Network;
pub use types::{BlockSummary, ReceiptSummary, TxStatus};
