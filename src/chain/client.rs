//! # Ethereum Client
//!
//! JSON-RPC client for Ethereum nodes using ethers-rs.
//!
//! [`EthereumClient`] wraps an HTTP provider and exposes the handful of
//! calls the demos need: block reads, balance and nonce queries, gas
//! quoting, raw transaction broadcast, and a bounded receipt wait.

use crate::chain::error::{ChainError, ChainResult};
use crate::chain::gas::{FeeSnapshot, GasEstimator, GasPrice, GasStrategy, TxPriority};
use crate::chain::network::Network;
use crate::chain::types::{BlockSummary, ReceiptSummary};
use crate::config::NodeConfig;
use crate::wallet::Wallet;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockNumber, Bytes, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Number of blocks sampled for an EIP-1559 fee quote.
const FEE_HISTORY_BLOCKS: u64 = 10;

/// Ethereum JSON-RPC client.
///
/// Cheap to clone by callers via the shared provider; all methods take
/// `&self`.
#[derive(Debug, Clone)]
pub struct EthereumClient {
    /// Network this client expects to be talking to.
    network: Network,
    /// HTTP JSON-RPC provider.
    provider: Arc<Provider<Http>>,
    /// Gas limit buffering.
    gas_estimator: GasEstimator,
    /// Fee quoting path.
    strategy: GasStrategy,
}

impl EthereumClient {
    /// Default bound on receipt waits, in milliseconds.
    pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 90_000;

    /// Creates a client for a known network.
    ///
    /// Does not contact the node; pair with [`Self::health_check`] to
    /// verify the endpoint actually serves the expected chain.
    ///
    /// # Arguments
    ///
    /// * `network` - The chain this endpoint is expected to serve
    /// * `rpc_url` - HTTP JSON-RPC endpoint URL
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Connection`] if the URL cannot be parsed.
    pub fn new(network: Network, rpc_url: &str) -> ChainResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::connection(format!("invalid rpc url {rpc_url}: {e}")))?
            .interval(poll_interval(network));

        Ok(Self {
            network,
            provider: Arc::new(provider),
            gas_estimator: GasEstimator::default(),
            strategy: GasStrategy::default(),
        })
    }

    /// Connects to a node and derives the network from `eth_chainId`.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - HTTP JSON-RPC endpoint URL
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the chain id query fails.
    pub async fn connect(rpc_url: &str) -> ChainResult<Self> {
        let probe = Self::new(Network::Dev, rpc_url)?;
        let reported = probe
            .provider
            .get_chainid()
            .await
            .map_err(map_provider_err)?;
        let chain_id = node_u64(reported, "chain id")?;
        let network = Network::from_u64(chain_id);
        info!(%network, chain_id, "connected to node");

        Self::new(network, rpc_url)
    }

    /// Builds a client from node configuration.
    ///
    /// A pinned `chain_id` skips the probe and is later enforced by
    /// [`Self::health_check`]; without one the chain id is detected from
    /// the node.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or chain id detection fails.
    pub async fn from_config(config: &NodeConfig) -> ChainResult<Self> {
        let client = match config.chain_id {
            Some(id) => Self::new(Network::from_u64(id), &config.rpc_url)?,
            None => Self::connect(&config.rpc_url).await?,
        };

        Ok(client
            .with_strategy(config.gas_strategy)
            .with_gas_buffer(config.gas_buffer_percent))
    }

    /// Sets the gas estimate buffer percentage.
    #[must_use]
    pub fn with_gas_buffer(mut self, buffer_percent: u64) -> Self {
        self.gas_estimator = GasEstimator::new(buffer_percent);
        self
    }

    /// Sets the fee quoting strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: GasStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the network this client is bound to.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Returns the configured fee strategy.
    #[must_use]
    pub const fn strategy(&self) -> GasStrategy {
        self.strategy
    }

    /// Returns the gas estimator.
    #[must_use]
    pub const fn gas_estimator(&self) -> &GasEstimator {
        &self.gas_estimator
    }

    /// Returns the shared provider.
    #[must_use]
    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    /// Builds a signing middleware for contract interactions.
    ///
    /// The wallet is re-bound to this client's chain id so every
    /// signature carries EIP-155 replay protection for the right chain.
    #[must_use]
    pub fn signer(&self, wallet: &Wallet) -> SignerMiddleware<Provider<Http>, LocalWallet> {
        let signer = wallet.inner().clone().with_chain_id(self.network.as_u64());
        SignerMiddleware::new(self.provider.as_ref().clone(), signer)
    }

    /// Verifies the node serves the chain this client was built for.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::WrongChain`] on a chain id mismatch, or a
    /// connection error if the node is unreachable.
    pub async fn health_check(&self) -> ChainResult<()> {
        let reported = self
            .provider
            .get_chainid()
            .await
            .map_err(map_provider_err)?;
        let actual = node_u64(reported, "chain id")?;

        let expected = self.network.as_u64();
        if actual != expected {
            return Err(ChainError::wrong_chain(expected, actual));
        }

        Ok(())
    }

    /// Returns the latest block number.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    pub async fn block_number(&self) -> ChainResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map(|n| n.as_u64())
            .map_err(map_provider_err)
    }

    /// Fetches the latest block as a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or the node returns no
    /// latest block.
    pub async fn latest_block(&self) -> ChainResult<BlockSummary> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(map_provider_err)?
            .ok_or_else(|| ChainError::rpc("node returned no latest block"))?;

        BlockSummary::try_from_block(&block)
    }

    /// Fetches a block by height as a summary.
    ///
    /// # Arguments
    ///
    /// * `number` - Block height to fetch
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Rpc`] if the block does not exist.
    pub async fn block_by_number(&self, number: u64) -> ChainResult<BlockSummary> {
        let block = self
            .provider
            .get_block(number)
            .await
            .map_err(map_provider_err)?
            .ok_or_else(|| ChainError::rpc(format!("block {number} not found")))?;

        BlockSummary::try_from_block(&block)
    }

    /// Returns an address balance in wei.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    pub async fn balance(&self, address: Address) -> ChainResult<U256> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(map_provider_err)
    }

    /// Returns the next usable nonce for an address.
    ///
    /// Queries the pending block tag, so transactions already in the
    /// mempool are counted and back-to-back sends do not collide.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    pub async fn pending_nonce(&self, address: Address) -> ChainResult<u64> {
        let nonce = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(map_provider_err)?;

        node_u64(nonce, "pending nonce")
    }

    /// Quotes a gas price using the configured strategy.
    ///
    /// # Arguments
    ///
    /// * `priority` - How aggressively to bid
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying fee queries fail.
    pub async fn gas_quote(&self, priority: TxPriority) -> ChainResult<GasPrice> {
        match self.strategy {
            GasStrategy::Legacy => self.legacy_quote(priority).await,
            GasStrategy::Eip1559 => Ok(self.fee_snapshot(priority).await?.as_gas_price()),
        }
    }

    /// Fetches an EIP-1559 fee snapshot at the given priority percentile.
    ///
    /// # Errors
    ///
    /// Returns an error if `eth_feeHistory` fails.
    pub async fn fee_snapshot(&self, priority: TxPriority) -> ChainResult<FeeSnapshot> {
        let history = self
            .provider
            .fee_history(
                FEE_HISTORY_BLOCKS,
                BlockNumber::Latest,
                &[priority.reward_percentile()],
            )
            .await
            .map_err(map_provider_err)?;

        let base_fees = history
            .base_fee_per_gas
            .iter()
            .map(|fee| node_u64(*fee, "base fee"))
            .collect::<ChainResult<Vec<u64>>>()?;
        let rewards = history
            .reward
            .iter()
            .map(|block_rewards| {
                block_rewards
                    .iter()
                    .map(|reward| node_u64(*reward, "priority reward"))
                    .collect()
            })
            .collect::<ChainResult<Vec<Vec<u64>>>>()?;

        Ok(FeeSnapshot::from_history(&base_fees, &rewards))
    }

    async fn legacy_quote(&self, priority: TxPriority) -> ChainResult<GasPrice> {
        let quoted = self
            .provider
            .get_gas_price()
            .await
            .map_err(map_provider_err)?;
        let suggested = node_u64(quoted, "gas price")?;

        let adjusted = suggested.saturating_mul(priority.legacy_multiplier_percent()) / 100;
        debug!(suggested, adjusted, %priority, "legacy gas quote");
        Ok(GasPrice::legacy(adjusted))
    }

    /// Estimates gas for a transaction and applies the configured buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::GasEstimation`] if the node rejects the
    /// estimation call, which usually means the transaction would revert.
    pub async fn estimate_gas(&self, tx: &TypedTransaction) -> ChainResult<u64> {
        let estimate = self
            .provider
            .estimate_gas(tx, None)
            .await
            .map_err(|e| ChainError::gas_estimation(e.to_string()))?;

        Ok(self
            .gas_estimator
            .apply_buffer(node_u64(estimate, "gas estimate")?))
    }

    /// Broadcasts a signed raw transaction.
    ///
    /// Returns the transaction hash as soon as the node accepts the
    /// payload into its mempool; pair with [`Self::wait_for_receipt`] for
    /// confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Rpc`] when the node rejects the transaction
    /// (bad nonce, underpriced, insufficient funds).
    pub async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<H256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(map_provider_err)?;

        let tx_hash = pending.tx_hash();
        info!(?tx_hash, "transaction broadcast");
        Ok(tx_hash)
    }

    /// Fetches the receipt for a transaction, if it is mined.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    pub async fn transaction_receipt(&self, tx_hash: H256) -> ChainResult<Option<ReceiptSummary>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(map_provider_err)?;

        receipt
            .as_ref()
            .map(ReceiptSummary::try_from_receipt)
            .transpose()
    }

    /// Waits for a transaction to be mined, up to a deadline.
    ///
    /// Polls the receipt at a fraction of the network block time. The
    /// returned summary carries the execution status; a mined-but-reverted
    /// transaction is a successful wait, and the caller decides whether
    /// status 0 is an error.
    ///
    /// # Arguments
    ///
    /// * `tx_hash` - Transaction to wait for
    /// * `timeout` - Upper bound on the wait
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Timeout`] if the deadline passes without a
    /// mined receipt.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        timeout: Duration,
    ) -> ChainResult<ReceiptSummary> {
        let deadline = Instant::now() + timeout;
        let interval = poll_interval(self.network);

        loop {
            if let Some(summary) = self.transaction_receipt(tx_hash).await? {
                debug!(
                    ?tx_hash,
                    block = summary.block_number,
                    status = %summary.status,
                    "transaction mined"
                );
                return Ok(summary);
            }

            if Instant::now() + interval > deadline {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(ChainError::timeout_with_duration(
                    format!("no receipt for {tx_hash:#x} after {timeout_ms}ms"),
                    timeout_ms,
                ));
            }

            sleep(interval).await;
        }
    }
}

/// Poll interval for receipts and pending transactions: a quarter of
/// the block time, clamped to keep dev chains responsive without
/// hammering public endpoints.
fn poll_interval(network: Network) -> Duration {
    Duration::from_millis((network.block_time_ms() / 4).clamp(250, 3_000))
}

/// Narrows a node-supplied quantity to `u64`.
///
/// Chain ids, nonces, gas figures, and fees all fit in 64 bits on any
/// real network; a wider value means the node is answering garbage, so
/// it surfaces as a parse error instead of a panic.
fn node_u64(value: U256, what: &str) -> ChainResult<u64> {
    u64::try_from(value).map_err(|_| ChainError::parse(format!("{what} {value} exceeds u64")))
}

/// Maps an ethers provider error onto the chain error surface.
///
/// Node-originated JSON-RPC errors keep their code and message;
/// everything else is a transport-level connection failure.
fn map_provider_err(err: ProviderError) -> ChainError {
    match err.as_error_response() {
        Some(rpc) => ChainError::rpc_with_code(rpc.message.clone(), rpc.code),
        None => ChainError::connection(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_url() {
        let error = EthereumClient::new(Network::Sepolia, "not a url").unwrap_err();
        assert!(matches!(error, ChainError::Connection { .. }));
    }

    #[test]
    fn builders_apply() {
        let client = EthereumClient::new(Network::Dev, "http://localhost:8545")
            .unwrap()
            .with_gas_buffer(35)
            .with_strategy(GasStrategy::Legacy);
        assert_eq!(client.gas_estimator().buffer_percent(), 35);
        assert_eq!(client.strategy(), GasStrategy::Legacy);
        assert_eq!(client.network(), Network::Dev);
    }

    #[test]
    fn poll_interval_is_clamped() {
        assert_eq!(poll_interval(Network::Dev), Duration::from_millis(250));
        assert_eq!(poll_interval(Network::Sepolia), Duration::from_millis(3_000));
        assert_eq!(poll_interval(Network::Custom(7)), Duration::from_millis(3_000));
    }

    #[test]
    fn node_u64_rejects_oversized_values() {
        assert_eq!(node_u64(U256::from(42_u64), "nonce").unwrap(), 42);

        let error = node_u64(U256::MAX, "nonce").unwrap_err();
        assert!(matches!(error, ChainError::Parse { .. }));
        assert!(error.to_string().contains("exceeds u64"));
    }
}
