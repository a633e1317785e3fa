//! # eth-counter
//!
//! Deploys and drives the bundled Counter contract.
//!
//! ```text
//! eth-counter deploy
//! eth-counter increment --address 0x5FbDB2315678afecb367f032d93F642f64180aa3
//! eth-counter count --address 0x5FbDB2315678afecb367f032d93F642f64180aa3
//! ```
//!
//! Connection, wallet key, and defaults come from `eth-sandbox.toml`
//! and `ETH_SANDBOX_*` environment variables; a `.env` file is loaded
//! first if present. `count` works without a configured key.

use clap::{Parser, Subcommand};
use eth_sandbox::chain::EthereumClient;
use eth_sandbox::config::AppConfig;
use eth_sandbox::contract::Counter;
use eth_sandbox::wallet::Wallet;
use ethers::types::Address;
use ethers::utils::to_checksum;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "eth-counter")]
#[command(about = "Deploy and call the bundled Counter contract")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a fresh Counter and wait for the receipt
    Deploy,
    /// Send an increment transaction
    Increment {
        /// Deployed contract address
        #[arg(long)]
        address: Address,
        /// Return after broadcast instead of waiting for the receipt
        #[arg(long)]
        no_wait: bool,
    },
    /// Read the current counter value
    Count {
        /// Deployed contract address
        #[arg(long)]
        address: Address,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate()?;
    config.log.init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.node.rpc_url,
        "starting eth-counter"
    );

    let client = EthereumClient::from_config(&config.node).await?;
    client.health_check().await?;

    let timeout = Duration::from_millis(config.tx.receipt_timeout_ms);
    match cli.command {
        Command::Deploy => {
            let wallet = signing_wallet(&config)?;
            deploy(&client, &wallet, timeout).await
        }
        Command::Increment { address, no_wait } => {
            let wallet = signing_wallet(&config)?;
            increment(&client, &wallet, address, no_wait, timeout).await
        }
        Command::Count { address } => {
            // eth_call needs no funds, so a throwaway key is fine here.
            let wallet = match config.wallet.require_key() {
                Ok(key) => Wallet::from_hex(key)?,
                Err(_) => Wallet::random(),
            };
            count(&client, &wallet, address).await
        }
    }
}

fn signing_wallet(config: &AppConfig) -> anyhow::Result<Wallet> {
    Ok(Wallet::from_hex(config.wallet.require_key()?)?)
}

async fn deploy(
    client: &EthereumClient,
    wallet: &Wallet,
    timeout: Duration,
) -> anyhow::Result<()> {
    let (counter, receipt) = Counter::deploy(client, wallet, timeout).await?;

    println!("address:    {}", to_checksum(&counter.address(), None));
    println!("tx:         {:#x}", receipt.tx_hash);
    println!("block:      #{}", receipt.block_number);
    if let Some(url) = client.network().explorer_address_url(counter.address()) {
        println!("explorer:   {url}");
    }

    let value = counter.count().await?;
    println!("count:      {value}");

    Ok(())
}

async fn increment(
    client: &EthereumClient,
    wallet: &Wallet,
    address: Address,
    no_wait: bool,
    timeout: Duration,
) -> anyhow::Result<()> {
    let counter = Counter::attach(client, wallet, address);

    if no_wait {
        let tx_hash = counter.send_increment().await?;
        println!("tx:         {tx_hash:#x}");
        if let Some(url) = client.network().explorer_tx_url(tx_hash) {
            println!("explorer:   {url}");
        }
        return Ok(());
    }

    let (receipt, value) = counter.increment_and_read(timeout).await?;
    println!("tx:         {:#x}", receipt.tx_hash);
    println!("block:      #{}", receipt.block_number);
    println!("count:      {value}");

    Ok(())
}

async fn count(client: &EthereumClient, wallet: &Wallet, address: Address) -> anyhow::Result<()> {
    let counter = Counter::attach(client, wallet, address);
    let value = counter.count().await?;
    println!("count:      {value}");

    Ok(())
}
