//! # Wallet
//!
//! Secp256k1 key management and signing.
//!
//! [`Wallet`] wraps an ethers in-memory signer. Keys come from hex
//! strings (configuration or environment) or fresh randomness; the
//! derived address and EIP-55 checksum form are exposed for display.
//! `Debug` output never contains key material.

use crate::chain::error::{ChainError, ChainResult};
use crate::chain::network::Network;
use ethers::core::rand;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Signature};
use ethers::utils::to_checksum;
use std::fmt;

/// In-memory signing account.
///
/// Construction binds no chain id; call [`Wallet::with_network`] before
/// signing transactions so signatures carry EIP-155 replay protection.
#[derive(Clone)]
pub struct Wallet {
    signer: LocalWallet,
}

impl Wallet {
    /// Loads a wallet from a hex-encoded private key.
    ///
    /// Accepts the key with or without a `0x` prefix and with
    /// surrounding whitespace.
    ///
    /// # Arguments
    ///
    /// * `key` - 32-byte private key as hex
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Wallet`] if the key is not valid hex, has
    /// the wrong length, or is not a valid secp256k1 scalar.
    pub fn from_hex(key: &str) -> ChainResult<Self> {
        let hex = key.trim().trim_start_matches("0x");
        let signer = hex
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::wallet(format!("invalid private key: {e}")))?;

        Ok(Self { signer })
    }

    /// Generates a wallet from OS randomness.
    #[must_use]
    pub fn random() -> Self {
        Self {
            signer: LocalWallet::new(&mut rand::thread_rng()),
        }
    }

    /// Binds the wallet to a network for EIP-155 signing.
    #[must_use]
    pub fn with_network(self, network: Network) -> Self {
        Self {
            signer: self.signer.with_chain_id(network.as_u64()),
        }
    }

    /// Returns the account address derived from the public key.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Returns the address in EIP-55 checksum form.
    #[must_use]
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address(), None)
    }

    /// Returns the chain id signatures are bound to.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.signer.chain_id()
    }

    /// Returns the underlying ethers signer.
    #[must_use]
    pub const fn inner(&self) -> &LocalWallet {
        &self.signer
    }

    /// Signs a transaction.
    ///
    /// The transaction's own chain id takes precedence; otherwise the
    /// wallet's bound chain id is used.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Wallet`] if signing fails.
    pub async fn sign_transaction(&self, tx: &TypedTransaction) -> ChainResult<Signature> {
        self.signer
            .sign_transaction(tx)
            .await
            .map_err(|e| ChainError::wallet(format!("transaction signing failed: {e}")))
    }

    /// Signs an EIP-191 personal message.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Wallet`] if signing fails.
    pub async fn sign_message(&self, message: &[u8]) -> ChainResult<Signature> {
        self.signer
            .sign_message(message)
            .await
            .map_err(|e| ChainError::wallet(format!("message signing failed: {e}")))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ethers::types::TransactionRequest;

    // anvil's first well-known development account
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn from_hex_derives_known_address() {
        let wallet = Wallet::from_hex(DEV_KEY).unwrap();
        assert_eq!(wallet.checksum_address(), DEV_ADDRESS);
    }

    #[test]
    fn from_hex_accepts_unprefixed_key() {
        let stripped = DEV_KEY.trim_start_matches("0x");
        let wallet = Wallet::from_hex(stripped).unwrap();
        assert_eq!(wallet.checksum_address(), DEV_ADDRESS);

        let padded = format!("  {DEV_KEY}\n");
        assert_eq!(
            Wallet::from_hex(&padded).unwrap().address(),
            wallet.address()
        );
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(Wallet::from_hex("0x1234").is_err());
        assert!(Wallet::from_hex("not hex at all").is_err());
        assert!(Wallet::from_hex("").is_err());
    }

    #[test]
    fn random_wallets_are_distinct() {
        let a = Wallet::random();
        let b = Wallet::random();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn with_network_binds_chain_id() {
        let wallet = Wallet::from_hex(DEV_KEY).unwrap().with_network(Network::Sepolia);
        assert_eq!(wallet.chain_id(), 11_155_111);
    }

    #[test]
    fn debug_redacts_key_material() {
        let wallet = Wallet::from_hex(DEV_KEY).unwrap();
        let debug = format!("{wallet:?}");
        assert!(debug.contains("address"));
        assert!(!debug.to_lowercase().contains("ac0974be"));
    }

    #[tokio::test]
    async fn transaction_signature_uses_eip155_v() {
        let wallet = Wallet::from_hex(DEV_KEY).unwrap().with_network(Network::Sepolia);
        let tx: TypedTransaction = TransactionRequest::new()
            .to(Address::zero())
            .value(1u64)
            .nonce(0u64)
            .gas(21_000u64)
            .gas_price(1_000_000_000u64)
            .chain_id(Network::Sepolia.as_u64())
            .into();

        let signature = wallet.sign_transaction(&tx).await.unwrap();
        // v = chain_id * 2 + 35 or 36
        let base = 11_155_111 * 2 + 35;
        assert!(signature.v == base || signature.v == base + 1);
    }

    #[tokio::test]
    async fn message_signature_recovers_signer() {
        let wallet = Wallet::from_hex(DEV_KEY).unwrap();
        let signature = wallet.sign_message(b"eth-sandbox").await.unwrap();
        let recovered = signature.recover("eth-sandbox").unwrap();
        assert_eq!(recovered, wallet.address());
    }
}
