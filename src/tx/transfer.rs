//! # Native Transfers
//!
//! Building, signing, and broadcasting ether transfers.
//!
//! [`TransferSender`] walks the full submission sequence against a node:
//! pending nonce, fee quote, balance pre-flight, EIP-155 signing, raw
//! broadcast, and an optional bounded wait for the receipt.

use crate::chain::client::EthereumClient;
use crate::chain::error::{ChainError, ChainResult};
use crate::chain::gas::{GasEstimator, GasPrice, TxPriority};
use crate::chain::types::ReceiptSummary;
use crate::wallet::Wallet;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, H256, TransactionRequest, U256};
use ethers::utils::{format_ether, parse_ether, to_checksum};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// A native-currency transfer to build and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    to: Address,
    value_wei: U256,
    gas_limit: Option<u64>,
    priority: TxPriority,
}

impl TransferRequest {
    /// Creates a transfer of `value_wei` to `to`.
    #[must_use]
    pub fn new(to: Address, value_wei: U256) -> Self {
        Self {
            to,
            value_wei,
            gas_limit: None,
            priority: TxPriority::default(),
        }
    }

    /// Creates a transfer from a decimal ether amount such as `"0.05"`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Parse`] if the amount is not a valid
    /// decimal ether quantity.
    pub fn ether(to: Address, amount: &str) -> ChainResult<Self> {
        let value_wei = parse_ether(amount)
            .map_err(|e| ChainError::parse(format!("invalid ether amount '{amount}': {e}")))?;
        Ok(Self::new(to, value_wei))
    }

    /// Overrides the gas limit.
    ///
    /// Plain transfers never need this; the default is the exact
    /// transfer cost of 21000.
    #[must_use]
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Sets the fee bidding priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TxPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn to(&self) -> Address {
        self.to
    }

    /// Returns the transfer value in wei.
    #[must_use]
    pub const fn value_wei(&self) -> U256 {
        self.value_wei
    }

    /// Returns the fee priority.
    #[must_use]
    pub const fn priority(&self) -> TxPriority {
        self.priority
    }

    /// Returns the gas limit this transfer will use.
    #[must_use]
    pub fn effective_gas_limit(&self) -> u64 {
        self.gas_limit
            .unwrap_or(GasEstimator::TRANSFER_GAS_LIMIT)
    }
}

/// What was broadcast for a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Hash of the broadcast transaction.
    pub tx_hash: H256,
    /// Sender address.
    pub from: Address,
    /// Recipient address.
    pub to: Address,
    /// Transferred value in wei.
    pub value_wei: U256,
    /// Nonce the transaction was sent with.
    pub nonce: u64,
    /// Price the transaction bids.
    pub gas_price: GasPrice,
    /// Gas limit the transaction carries.
    pub gas_limit: u64,
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ETH from {} to {} (tx {:#x}, nonce {})",
            format_ether(self.value_wei),
            to_checksum(&self.from, None),
            to_checksum(&self.to, None),
            self.tx_hash,
            self.nonce
        )
    }
}

/// Signs and broadcasts transfers for one wallet against one node.
#[derive(Debug, Clone)]
pub struct TransferSender {
    client: EthereumClient,
    wallet: Wallet,
}

impl TransferSender {
    /// Creates a sender, binding the wallet to the client's chain id so
    /// every signature carries EIP-155 replay protection.
    #[must_use]
    pub fn new(client: EthereumClient, wallet: Wallet) -> Self {
        let wallet = wallet.with_network(client.network());
        Self { client, wallet }
    }

    /// Returns the sending address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Returns the client this sender broadcasts through.
    #[must_use]
    pub const fn client(&self) -> &EthereumClient {
        &self.client
    }

    /// Builds, signs, and broadcasts a transfer.
    ///
    /// Returns as soon as the node accepts the transaction; the chain
    /// has not necessarily mined it. Use [`Self::send_and_confirm`] to
    /// also wait for the receipt.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InsufficientFunds`] if the sender balance
    /// cannot cover value plus the worst-case fee, or any RPC error from
    /// the underlying queries and the broadcast itself.
    pub async fn send(&self, request: &TransferRequest) -> ChainResult<TransferOutcome> {
        let from = self.wallet.address();
        if request.to == Address::zero() {
            warn!("transfer recipient is the zero address; funds will be unrecoverable");
        }

        let nonce = self.client.pending_nonce(from).await?;
        let gas_price = self.client.gas_quote(request.priority).await?;
        let gas_limit = request.effective_gas_limit();

        self.check_balance(from, request.value_wei, gas_limit, &gas_price)
            .await?;

        let chain_id = self.client.network().as_u64();
        let tx = assemble(chain_id, from, request, nonce, gas_limit, gas_price);
        let signature = self.wallet.sign_transaction(&tx).await?;
        let raw = tx.rlp_signed(&signature);
        let tx_hash = self.client.send_raw_transaction(raw).await?;

        info!(
            from = %to_checksum(&from, None),
            to = %to_checksum(&request.to, None),
            value_eth = %format_ether(request.value_wei),
            nonce,
            %gas_price,
            "transfer broadcast"
        );

        Ok(TransferOutcome {
            tx_hash,
            from,
            to: request.to,
            value_wei: request.value_wei,
            nonce,
            gas_price,
            gas_limit,
        })
    }

    /// Sends a transfer and waits for it to be mined.
    ///
    /// # Arguments
    ///
    /// * `request` - The transfer to send
    /// * `timeout` - Upper bound on the receipt wait
    ///
    /// # Errors
    ///
    /// Everything [`Self::send`] returns, plus [`ChainError::Timeout`]
    /// if the receipt does not arrive in time and
    /// [`ChainError::Reverted`] if the transfer was mined with status 0.
    pub async fn send_and_confirm(
        &self,
        request: &TransferRequest,
        timeout: Duration,
    ) -> ChainResult<(TransferOutcome, ReceiptSummary)> {
        let outcome = self.send(request).await?;
        let receipt = self.client.wait_for_receipt(outcome.tx_hash, timeout).await?;

        if !receipt.is_success() {
            return Err(ChainError::reverted(
                outcome.tx_hash,
                "transfer mined with status 0",
            ));
        }

        Ok((outcome, receipt))
    }

    /// Fails early when the balance cannot cover value plus worst-case
    /// fee, instead of burning the broadcast on a guaranteed rejection.
    async fn check_balance(
        &self,
        from: Address,
        value_wei: U256,
        gas_limit: u64,
        gas_price: &GasPrice,
    ) -> ChainResult<()> {
        let balance = self.client.balance(from).await?;
        let required = required_wei(value_wei, gas_limit, gas_price);

        if balance < required {
            return Err(ChainError::insufficient_funds(format!(
                "need {} ETH (value {} + max fee), have {} ETH",
                format_ether(required),
                format_ether(value_wei),
                format_ether(balance)
            )));
        }

        Ok(())
    }
}

/// Worst-case wei the sender must hold: value plus limit times ceiling
/// price. Saturates instead of wrapping.
fn required_wei(value_wei: U256, gas_limit: u64, gas_price: &GasPrice) -> U256 {
    U256::from(gas_limit)
        .saturating_mul(U256::from(gas_price.ceiling_price()))
        .saturating_add(value_wei)
}

/// Builds the unsigned transaction for a transfer.
///
/// Legacy quotes produce a legacy transaction, EIP-1559 quotes a
/// dynamic-fee transaction; both carry the chain id explicitly.
fn assemble(
    chain_id: u64,
    from: Address,
    request: &TransferRequest,
    nonce: u64,
    gas_limit: u64,
    gas_price: GasPrice,
) -> TypedTransaction {
    match gas_price {
        GasPrice::Legacy { gas_price } => TransactionRequest::new()
            .from(from)
            .to(request.to)
            .value(request.value_wei)
            .nonce(nonce)
            .gas(gas_limit)
            .gas_price(gas_price)
            .chain_id(chain_id)
            .into(),
        GasPrice::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } => Eip1559TransactionRequest::new()
            .from(from)
            .to(request.to)
            .value(request.value_wei)
            .nonce(nonce)
            .gas(gas_limit)
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(max_priority_fee_per_gas)
            .chain_id(chain_id)
            .into(),
    }
}
