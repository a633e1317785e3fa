//! # eth-sandbox
//!
//! Ethereum JSON-RPC workflows end to end: block inspection, signed
//! native transfers, and Counter contract round-trips over ethers-rs.
//!
//! ## Architecture
//!
//! - **Chain** (`chain`): JSON-RPC client, networks, gas pricing, typed
//!   errors, and read models for blocks and receipts
//! - **Wallet** (`wallet`): secp256k1 keys, addresses, EIP-155 signing
//! - **Transactions** (`tx`): building, signing, broadcasting, and
//!   confirming native-currency transfers
//! - **Contracts** (`contract`): deploying and calling the bundled
//!   Counter contract through a generated binding
//! - **Configuration** (`config`): file and environment configuration
//!   plus logging setup
//!
//! ## Example
//!
//! ```rust,ignore
//! use eth_sandbox::chain::EthereumClient;
//! use eth_sandbox::tx::{TransferRequest, TransferSender};
//! use eth_sandbox::wallet::Wallet;
//!
//! let client = EthereumClient::connect("http://localhost:8545").await?;
//! let sender = TransferSender::new(client, Wallet::from_hex(&key)?);
//! let outcome = sender.send(&TransferRequest::ether(recipient, "0.05")?).await?;
//! ```

pub mod chain;
pub mod config;
pub mod contract;
pub mod tx;
pub mod wallet;
