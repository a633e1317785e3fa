//! # Gas Pricing
//!
//! Gas strategies, fee quoting, and cost arithmetic.
//!
//! Supports both legacy gas pricing (`eth_gasPrice`) and EIP-1559 dynamic
//! fees derived from `eth_feeHistory`. All fee arithmetic saturates instead
//! of wrapping so a hostile node cannot overflow a quote.

use crate::chain::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How transaction fees are quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasStrategy {
    /// Single legacy gas price from `eth_gasPrice`.
    Legacy,
    /// Dynamic max/priority fees from `eth_feeHistory`.
    #[default]
    Eip1559,
}

impl GasStrategy {
    /// Returns the strategy name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Eip1559 => "eip1559",
        }
    }
}

impl FromStr for GasStrategy {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "eip1559" | "eip-1559" => Ok(Self::Eip1559),
            other => Err(ChainError::parse(format!(
                "unknown gas strategy '{other}', expected 'legacy' or 'eip1559'"
            ))),
        }
    }
}

impl fmt::Display for GasStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How aggressively a transaction should bid for inclusion.
///
/// Selects the fee-history reward percentile for EIP-1559 quotes and a
/// multiplier on the node's suggested price for legacy quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPriority {
    /// Cheapest bid, may wait several blocks.
    Slow,
    /// Market-rate bid.
    #[default]
    Standard,
    /// Aggressive bid for next-block inclusion.
    Fast,
}

impl TxPriority {
    /// Returns the `eth_feeHistory` reward percentile for this priority.
    #[must_use]
    pub const fn reward_percentile(&self) -> f64 {
        match self {
            Self::Slow => 10.0,
            Self::Standard => 50.0,
            Self::Fast => 90.0,
        }
    }

    /// Returns the percentage applied to a legacy suggested gas price.
    #[must_use]
    pub const fn legacy_multiplier_percent(&self) -> u64 {
        match self {
            Self::Slow => 90,
            Self::Standard => 100,
            Self::Fast => 120,
        }
    }

    /// Returns the priority name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Standard => "standard",
            Self::Fast => "fast",
        }
    }
}

impl FromStr for TxPriority {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "standard" => Ok(Self::Standard),
            "fast" => Ok(Self::Fast),
            other => Err(ChainError::parse(format!(
                "unknown priority '{other}', expected 'slow', 'standard', or 'fast'"
            ))),
        }
    }
}

impl fmt::Display for TxPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete gas price ready to stamp onto a transaction.
///
/// Prices are stored as u64 wei, which covers any realistic per-gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GasPrice {
    /// Legacy gas price in wei.
    Legacy {
        /// Gas price in wei.
        gas_price: u64,
    },
    /// EIP-1559 dynamic fee.
    Eip1559 {
        /// Maximum fee per gas in wei.
        max_fee_per_gas: u64,
        /// Maximum priority fee per gas in wei.
        max_priority_fee_per_gas: u64,
    },
}

impl GasPrice {
    /// Creates a legacy gas price.
    #[must_use]
    pub const fn legacy(gas_price: u64) -> Self {
        Self::Legacy { gas_price }
    }

    /// Creates an EIP-1559 gas price.
    #[must_use]
    pub const fn eip1559(max_fee_per_gas: u64, max_priority_fee_per_gas: u64) -> Self {
        Self::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }

    /// Returns the worst-case per-gas price for cost bounds.
    ///
    /// For legacy this is the gas price itself; for EIP-1559 the max fee.
    #[must_use]
    pub const fn ceiling_price(&self) -> u64 {
        match self {
            Self::Legacy { gas_price } => *gas_price,
            Self::Eip1559 {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
        }
    }

    /// Returns whether this is an EIP-1559 price.
    #[must_use]
    pub const fn is_eip1559(&self) -> bool {
        matches!(self, Self::Eip1559 { .. })
    }

    /// Returns the strategy this price belongs to.
    #[must_use]
    pub const fn strategy(&self) -> GasStrategy {
        match self {
            Self::Legacy { .. } => GasStrategy::Legacy,
            Self::Eip1559 { .. } => GasStrategy::Eip1559,
        }
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy { gas_price } => write!(f, "legacy {gas_price} wei"),
            Self::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => write!(
                f,
                "eip1559 max_fee={max_fee_per_gas} wei priority={max_priority_fee_per_gas} wei"
            ),
        }
    }
}

/// Point-in-time EIP-1559 fee observation.
///
/// Built from `eth_feeHistory`: the pending block's base fee plus a
/// percentile of recent priority fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSnapshot {
    /// Base fee per gas of the next block, in wei.
    pub base_fee_per_gas: u64,
    /// Observed priority fee per gas, in wei.
    pub priority_fee_per_gas: u64,
}

impl FeeSnapshot {
    /// Priority fee used when fee history reports no rewards, e.g. on an
    /// idle development chain.
    pub const DEFAULT_PRIORITY_FEE_WEI: u64 = 1_500_000_000;

    /// Creates a fee snapshot.
    #[must_use]
    pub const fn new(base_fee_per_gas: u64, priority_fee_per_gas: u64) -> Self {
        Self {
            base_fee_per_gas,
            priority_fee_per_gas,
        }
    }

    /// Derives a snapshot from `eth_feeHistory` data.
    ///
    /// `base_fees` carries one entry per sampled block plus the pending
    /// block; the last entry is the base fee the next transaction will
    /// actually pay against. The priority fee is the median of the
    /// requested percentile across sampled blocks, falling back to
    /// [`Self::DEFAULT_PRIORITY_FEE_WEI`] when no block reported rewards.
    #[must_use]
    pub fn from_history(base_fees: &[u64], rewards: &[Vec<u64>]) -> Self {
        let base_fee_per_gas = base_fees.last().copied().unwrap_or(0);

        let mut observed: Vec<u64> = rewards
            .iter()
            .filter_map(|block_rewards| block_rewards.first().copied())
            .filter(|fee| *fee > 0)
            .collect();

        let priority_fee_per_gas = if observed.is_empty() {
            Self::DEFAULT_PRIORITY_FEE_WEI
        } else {
            observed.sort_unstable();
            observed.get(observed.len() / 2).copied().unwrap_or(0)
        };

        Self {
            base_fee_per_gas,
            priority_fee_per_gas,
        }
    }

    /// Returns the max fee per gas to bid.
    ///
    /// Twice the base fee plus the priority fee, so the bid survives six
    /// consecutive fully-utilized blocks. Saturates on overflow.
    #[must_use]
    pub const fn max_fee_per_gas(&self) -> u64 {
        self.base_fee_per_gas
            .saturating_mul(2)
            .saturating_add(self.priority_fee_per_gas)
    }

    /// Converts the snapshot into a concrete EIP-1559 price.
    #[must_use]
    pub const fn as_gas_price(&self) -> GasPrice {
        GasPrice::eip1559(self.max_fee_per_gas(), self.priority_fee_per_gas)
    }
}

/// Gas limit selection and cost arithmetic.
///
/// Applies a percentage buffer to node estimates so a transaction does
/// not run out of gas when state shifts between estimation and inclusion.
#[derive(Debug, Clone)]
pub struct GasEstimator {
    /// Buffer percentage added to estimates.
    buffer_percent: u64,
}

impl GasEstimator {
    /// Exact gas cost of a native-currency transfer to an externally
    /// owned account.
    pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

    /// Gas ceiling for the small contract deployments and calls the
    /// demos issue.
    pub const CONTRACT_GAS_LIMIT: u64 = 300_000;

    /// Default buffer percentage.
    pub const DEFAULT_BUFFER_PERCENT: u64 = 20;

    /// Creates a gas estimator with the given buffer.
    ///
    /// # Arguments
    ///
    /// * `buffer_percent` - Percentage added to estimates (e.g. 20 for 20%)
    #[must_use]
    pub const fn new(buffer_percent: u64) -> Self {
        Self { buffer_percent }
    }

    /// Creates a gas estimator with the default buffer.
    #[must_use]
    pub const fn with_default_buffer() -> Self {
        Self::new(Self::DEFAULT_BUFFER_PERCENT)
    }

    /// Returns the buffer percentage.
    #[must_use]
    pub const fn buffer_percent(&self) -> u64 {
        self.buffer_percent
    }

    /// Applies the buffer to a raw node estimate. Saturates on overflow.
    #[must_use]
    pub const fn apply_buffer(&self, estimate: u64) -> u64 {
        estimate.saturating_add(estimate.saturating_mul(self.buffer_percent) / 100)
    }

    /// Returns the worst-case transaction cost in wei.
    ///
    /// # Arguments
    ///
    /// * `gas_limit` - Gas limit of the transaction
    /// * `gas_price` - The quoted price
    #[must_use]
    pub const fn max_cost_wei(&self, gas_limit: u64, gas_price: &GasPrice) -> u128 {
        gas_limit as u128 * gas_price.ceiling_price() as u128
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::with_default_buffer()
    }
}
