//! # eth-transfer
//!
//! Reads block headers and sends signed native transfers against any
//! JSON-RPC endpoint.
//!
//! ```text
//! eth-transfer block --number 19000000
//! eth-transfer send --to 0x70997970C51812dc3A010C7d01b50e0d17dc79C8 --amount 0.05 --wait
//! ```
//!
//! Connection, wallet key, and defaults come from `eth-sandbox.toml`
//! and `ETH_SANDBOX_*` environment variables; a `.env` file is loaded
//! first if present.

use clap::{Parser, Subcommand};
use eth_sandbox::chain::{EthereumClient, GasStrategy};
use eth_sandbox::config::AppConfig;
use eth_sandbox::tx::{TransferRequest, TransferSender};
use eth_sandbox::wallet::Wallet;
use ethers::types::Address;
use ethers::utils::{format_ether, to_checksum};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "eth-transfer")]
#[command(about = "Read blocks and send signed native transfers over JSON-RPC")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a block header (latest by default)
    Block {
        /// Block number to show instead of the latest
        #[arg(long)]
        number: Option<u64>,
    },
    /// Sign and broadcast a native transfer
    Send {
        /// Recipient address
        #[arg(long)]
        to: Address,
        /// Amount in ETH, e.g. 0.05
        #[arg(long)]
        amount: String,
        /// Wait for the receipt instead of returning after broadcast
        #[arg(long)]
        wait: bool,
        /// Price with gasPrice instead of EIP-1559 fee fields
        #[arg(long)]
        legacy: bool,
        /// Gas limit override (default 21000)
        #[arg(long)]
        gas_limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Command::Send { legacy: true, .. } = cli.command {
        config.node.gas_strategy = GasStrategy::Legacy;
    }
    config.validate()?;
    config.log.init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.node.rpc_url,
        "starting eth-transfer"
    );

    let client = EthereumClient::from_config(&config.node).await?;
    client.health_check().await?;

    match cli.command {
        Command::Block { number } => show_block(&client, number).await,
        Command::Send {
            to,
            amount,
            wait,
            gas_limit,
            ..
        } => send(&client, &config, to, &amount, wait, gas_limit).await,
    }
}

/// The read workflow: fetch one header and print its fields.
async fn show_block(client: &EthereumClient, number: Option<u64>) -> anyhow::Result<()> {
    let summary = match number {
        Some(n) => client.block_by_number(n).await?,
        None => client.latest_block().await?,
    };

    println!("network:    {}", client.network());
    println!("block:      #{}", summary.number);
    println!("hash:       {:#x}", summary.hash);
    println!("parent:     {:#x}", summary.parent_hash);
    match summary.timestamp_utc() {
        Some(utc) => println!("timestamp:  {} ({utc})", summary.timestamp),
        None => println!("timestamp:  {}", summary.timestamp),
    }
    println!("txs:        {}", summary.tx_count);
    println!("gas:        {} / {}", summary.gas_used, summary.gas_limit);
    if let Some(base_fee) = summary.base_fee_per_gas {
        println!("base fee:   {base_fee} wei");
    }

    Ok(())
}

/// The write workflow: preflight, sign, broadcast, optionally confirm.
async fn send(
    client: &EthereumClient,
    config: &AppConfig,
    to: Address,
    amount: &str,
    wait: bool,
    gas_limit: Option<u64>,
) -> anyhow::Result<()> {
    let wallet = Wallet::from_hex(config.wallet.require_key()?)?;
    let sender = TransferSender::new(client.clone(), wallet);

    let balance = client.balance(sender.address()).await?;
    println!("from:       {}", to_checksum(&sender.address(), None));
    println!("balance:    {} ETH", format_ether(balance));

    let mut request = TransferRequest::ether(to, amount)?.with_priority(config.tx.priority);
    if let Some(gas_limit) = gas_limit {
        request = request.with_gas_limit(gas_limit);
    }

    let (outcome, receipt) = if wait {
        let timeout = Duration::from_millis(config.tx.receipt_timeout_ms);
        let (outcome, receipt) = sender.send_and_confirm(&request, timeout).await?;
        (outcome, Some(receipt))
    } else {
        (sender.send(&request).await?, None)
    };

    println!("sent:       {outcome}");
    if let Some(receipt) = receipt {
        println!("block:      #{}", receipt.block_number);
        if let Some(fee) = receipt.fee_paid_wei() {
            println!("fee paid:   {} ETH", format_ether(fee));
        }
    }
    if let Some(url) = client.network().explorer_tx_url(outcome.tx_hash) {
        println!("explorer:   {url}");
    }

    Ok(())
}
