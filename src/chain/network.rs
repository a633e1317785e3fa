//! # Network Identity
//!
//! Ethereum networks the demos can talk to.
//!
//! A [`Network`] pins the EIP-155 chain id used for replay-protected
//! signing and knows enough about the chain (block cadence, explorer)
//! to drive receipt polling and human-readable output.

use ethers::types::{Address, H256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ethereum networks with well-known chain ids.
///
/// Unknown ids are preserved as [`Network::Custom`] so a client connected
/// to an arbitrary node still carries the exact chain id it signs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u64", from = "u64")]
pub enum Network {
    /// Ethereum mainnet (chain id 1).
    Mainnet,
    /// Sepolia testnet (chain id 11155111).
    Sepolia,
    /// Holesky testnet (chain id 17000).
    Holesky,
    /// Local development node, anvil/hardhat default (chain id 31337).
    Dev,
    /// Any other chain id.
    Custom(u64),
}

impl Network {
    /// Returns the numeric EIP-155 chain id.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Sepolia => 11_155_111,
            Self::Holesky => 17_000,
            Self::Dev => 31_337,
            Self::Custom(id) => *id,
        }
    }

    /// Maps a chain id to a network.
    ///
    /// Total: ids without a well-known name become [`Network::Custom`],
    /// so `from_u64(n).as_u64() == n` always holds.
    #[must_use]
    pub const fn from_u64(chain_id: u64) -> Self {
        match chain_id {
            1 => Self::Mainnet,
            11_155_111 => Self::Sepolia,
            17_000 => Self::Holesky,
            31_337 => Self::Dev,
            id => Self::Custom(id),
        }
    }

    /// Returns the network name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Sepolia => "sepolia",
            Self::Holesky => "holesky",
            Self::Dev => "dev",
            Self::Custom(_) => "custom",
        }
    }

    /// Returns the average block time in milliseconds.
    ///
    /// Used as the baseline for receipt-poll intervals.
    #[must_use]
    pub const fn block_time_ms(&self) -> u64 {
        match self {
            Self::Mainnet | Self::Sepolia | Self::Holesky => 12_000,
            Self::Dev => 1_000,
            Self::Custom(_) => 12_000,
        }
    }

    /// Returns whether this is a test network.
    ///
    /// Anything other than mainnet counts, including custom chains.
    #[must_use]
    pub const fn is_testnet(&self) -> bool {
        !matches!(self, Self::Mainnet)
    }

    /// Returns the Etherscan-family explorer base URL, if one exists.
    #[must_use]
    pub const fn explorer_base(&self) -> Option<&'static str> {
        match self {
            Self::Mainnet => Some("https://etherscan.io"),
            Self::Sepolia => Some("https://sepolia.etherscan.io"),
            Self::Holesky => Some("https://holesky.etherscan.io"),
            Self::Dev | Self::Custom(_) => None,
        }
    }

    /// Returns the explorer URL for a transaction hash, if the network
    /// has a public explorer.
    #[must_use]
    pub fn explorer_tx_url(&self, hash: H256) -> Option<String> {
        self.explorer_base()
            .map(|base| format!("{base}/tx/{hash:#x}"))
    }

    /// Returns the explorer URL for an address (EIP-55 checksummed), if
    /// the network has a public explorer.
    #[must_use]
    pub fn explorer_address_url(&self, address: Address) -> Option<String> {
        self.explorer_base()
            .map(|base| format!("{base}/address/{}", to_checksum(&address, None)))
    }
}

impl From<Network> for u64 {
    fn from(network: Network) -> Self {
        network.as_u64()
    }
}

impl From<u64> for Network {
    fn from(chain_id: u64) -> Self {
        Self::from_u64(chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(id) => write!(f, "custom({id})"),
            _ => f.write_str(self.name()),
        }
    }
}
