//! # Counter Contract
//!
//! Deploying and calling the bundled Counter contract.
//!
//! The binding is generated from the checked-in ABI; the creation
//! bytecode ships alongside it, so no Solidity toolchain is needed at
//! build or run time. [`Counter`] wraps the binding with gas handling,
//! bounded confirmation waits, and the crate's error surface.

use crate::chain::client::EthereumClient;
use crate::chain::error::{ChainError, ChainResult};
use crate::chain::gas::GasEstimator;
use crate::chain::types::ReceiptSummary;
use crate::wallet::Wallet;
use ethers::contract::{ContractFactory, abigen};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::to_checksum;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

abigen!(CounterContract, "contracts/Counter.abi");

/// Middleware stack contract writes go through: HTTP provider plus an
/// in-memory signer.
pub type CounterMiddleware = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Creation bytecode produced from `contracts/Counter.sol`.
const COUNTER_BYTECODE: &str = include_str!("../../contracts/Counter.bin");

/// A deployed Counter contract bound to a signing account.
#[derive(Debug, Clone)]
pub struct Counter {
    binding: CounterContract<CounterMiddleware>,
    client: EthereumClient,
}

impl Counter {
    /// Deploys a fresh Counter and waits for the deployment receipt.
    ///
    /// # Arguments
    ///
    /// * `client` - Node connection
    /// * `wallet` - Account that pays for and owns the deployment
    /// * `timeout` - Upper bound on the confirmation wait
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Timeout`] if the deployment is not mined in
    /// time, [`ChainError::Reverted`] if it mined with status 0, or a
    /// transaction error if the node rejects the broadcast.
    pub async fn deploy(
        client: &EthereumClient,
        wallet: &Wallet,
        timeout: Duration,
    ) -> ChainResult<(Self, ReceiptSummary)> {
        let middleware = Arc::new(client.signer(wallet));
        let factory = ContractFactory::new(
            COUNTERCONTRACT_ABI.clone(),
            creation_bytecode()?,
            Arc::clone(&middleware),
        );

        let mut deployer = factory
            .deploy(())
            .map_err(|e| ChainError::transaction(format!("deployment setup failed: {e}")))?;
        deployer.tx.set_gas(GasEstimator::CONTRACT_GAS_LIMIT);

        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let (instance, receipt) = tokio::time::timeout(timeout, deployer.send_with_receipt())
            .await
            .map_err(|_| {
                ChainError::timeout_with_duration(
                    format!("no deployment receipt after {timeout_ms}ms"),
                    timeout_ms,
                )
            })?
            .map_err(|e| ChainError::transaction(format!("deployment failed: {e}")))?;

        let summary = ReceiptSummary::try_from_receipt(&receipt)?;
        if !summary.is_success() {
            return Err(ChainError::reverted(
                summary.tx_hash,
                "deployment mined with status 0",
            ));
        }

        info!(
            address = %to_checksum(&instance.address(), None),
            block = summary.block_number,
            "counter deployed"
        );

        let binding = CounterContract::new(instance.address(), middleware);
        Ok((
            Self {
                binding,
                client: client.clone(),
            },
            summary,
        ))
    }

    /// Binds to an already-deployed Counter.
    #[must_use]
    pub fn attach(client: &EthereumClient, wallet: &Wallet, address: Address) -> Self {
        let middleware = Arc::new(client.signer(wallet));
        Self {
            binding: CounterContract::new(address, middleware),
            client: client.clone(),
        }
    }

    /// Returns the contract address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.binding.address()
    }

    /// Reads the current counter value with `eth_call`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Rpc`] if the call fails.
    pub async fn count(&self) -> ChainResult<U256> {
        self.binding
            .get_count()
            .call()
            .await
            .map_err(|e| ChainError::rpc(format!("getCount call failed: {e}")))
    }

    /// Broadcasts an increment transaction without waiting for it.
    ///
    /// The gas limit is estimated against the node with the client's
    /// buffer applied.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::GasEstimation`] if the node rejects the
    /// estimate or a transaction error if the broadcast fails.
    pub async fn send_increment(&self) -> ChainResult<H256> {
        let mut call = self.binding.increment();
        let gas = self.client.estimate_gas(&call.tx).await?;
        call.tx.set_gas(gas);

        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::transaction(format!("increment broadcast failed: {e}")))?;
        Ok(pending.tx_hash())
    }

    /// Sends an increment transaction and waits for it to be mined.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound on the confirmation wait
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Reverted`] if the transaction mined with
    /// status 0; in that case the counter did not change.
    pub async fn increment(&self, timeout: Duration) -> ChainResult<ReceiptSummary> {
        let tx_hash = self.send_increment().await?;

        let summary = self.client.wait_for_receipt(tx_hash, timeout).await?;
        if !summary.is_success() {
            return Err(ChainError::reverted(tx_hash, "increment mined with status 0"));
        }

        Ok(summary)
    }

    /// Increments the counter and reads the new value back.
    ///
    /// The read-back only happens after a status-1 receipt; a reverted
    /// increment returns the error instead of a stale value.
    ///
    /// # Errors
    ///
    /// Everything [`Self::increment`] and [`Self::count`] return.
    pub async fn increment_and_read(&self, timeout: Duration) -> ChainResult<(ReceiptSummary, U256)> {
        let receipt = self.increment(timeout).await?;
        let value = self.count().await?;
        Ok((receipt, value))
    }
}

/// Decodes the bundled creation bytecode.
fn creation_bytecode() -> ChainResult<Bytes> {
    ethers::utils::hex::decode(COUNTER_BYTECODE.trim())
        .map(Bytes::from)
        .map_err(|e| ChainError::parse(format!("bundled counter bytecode is invalid: {e}")))
}
