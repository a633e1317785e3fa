//! # Transactions
//!
//! Building, signing, and submitting transactions.
//!
//! ## Available Components
//!
//! - [`TransferRequest`]: A native-currency transfer to build
//! - [`TransferSender`]: Signs, broadcasts, and confirms transfers
//! - [`TransferOutcome`]: What was actually put on the wire

pub mod transfer;

pub use transfer::{TransferOutcome, TransferRequest, TransferSender};
