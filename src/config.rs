//! Run configuration
//!
//! Everything the deployment driver needs besides the signing key, which is
//! read separately from the environment by [`crate::wallet::Wallet::from_env`].

use crate::contract::toolchain::{self, SOLC_BINARIES_URL};
use crate::contract::{Solc, SolcInstaller, DEFAULT_SOLC_VERSION};
use crate::core::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE_GWEI, GWEI};
use crate::network::{
    ChainClient, ChainError, RpcChainClient, DEFAULT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT,
};
use semver::Version;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the JSON-RPC endpoint
pub const RPC_URL_VAR: &str = "CARPOOL_RPC_URL";

/// Endpoint used when none is configured
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Contract source compiled by default
pub const DEFAULT_SOURCE_PATH: &str = "./contracts/Carpooling.sol";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid RPC URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// How the gas price of each transaction is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPricePolicy {
    /// Always use this price, in wei
    Fixed(u128),
    /// Ask the node with `eth_gasPrice` before each transaction
    Network,
}

impl GasPricePolicy {
    /// Fixed price given in gwei
    pub fn fixed_gwei(gwei: u64) -> Self {
        Self::Fixed(gwei as u128 * GWEI)
    }

    /// Price in wei for the next transaction
    pub fn resolve<C: ChainClient + ?Sized>(&self, chain: &C) -> Result<u128, ChainError> {
        match self {
            Self::Fixed(price) => Ok(*price),
            Self::Network => chain.gas_price(),
        }
    }
}

impl Default for GasPricePolicy {
    fn default() -> Self {
        Self::fixed_gwei(DEFAULT_GAS_PRICE_GWEI)
    }
}

/// Deployment configuration
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub rpc_url: String,
    pub source_path: PathBuf,
    pub solc_version: Version,
    /// Use this solc binary instead of an installed release
    pub solc_binary: Option<PathBuf>,
    pub solc_cache_dir: PathBuf,
    /// Host (or mirror) serving solc release builds
    pub solc_base_url: String,
    pub gas_limit: u64,
    pub gas_price: GasPricePolicy,
    /// Ride joined after deployment
    pub ride_id: u64,
    pub receipt_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            solc_version: Version::parse(DEFAULT_SOLC_VERSION).unwrap_or(Version::new(0, 8, 0)),
            solc_binary: None,
            solc_cache_dir: toolchain::default_cache_dir(),
            solc_base_url: SOLC_BINARIES_URL.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: GasPricePolicy::default(),
            ride_id: 1,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl DeployConfig {
    /// Check the configuration before any network or compiler activity
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.rpc_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.rpc_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.rpc_url.clone(),
                reason: "only http and https endpoints are supported".to_string(),
            });
        }

        if self.gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gas limit",
                reason: "must be positive".to_string(),
            });
        }
        if self.gas_price == GasPricePolicy::Fixed(0) {
            return Err(ConfigError::InvalidValue {
                field: "gas price",
                reason: "must be positive".to_string(),
            });
        }
        if self.receipt_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "receipt timeout",
                reason: "must be positive".to_string(),
            });
        }
        if self.poll_interval.is_zero() || self.poll_interval > self.receipt_timeout {
            return Err(ConfigError::InvalidValue {
                field: "poll interval",
                reason: format!(
                    "must be positive and at most the receipt timeout ({:?})",
                    self.receipt_timeout
                ),
            });
        }

        Ok(())
    }

    /// Installer for the configured cache directory and release host
    pub fn installer(&self) -> SolcInstaller {
        SolcInstaller::new(&self.solc_cache_dir).with_base_url(self.solc_base_url.as_str())
    }

    /// The compiler this configuration selects
    pub fn compiler(&self) -> Solc {
        match &self.solc_binary {
            Some(path) => Solc::at(path),
            None => Solc::managed(self.installer(), self.solc_version.clone()),
        }
    }

    /// JSON-RPC client for the configured endpoint
    pub fn chain_client(&self) -> Result<RpcChainClient, ChainError> {
        Ok(RpcChainClient::new(&self.rpc_url)?
            .with_receipt_timeout(self.receipt_timeout)
            .with_poll_interval(self.poll_interval))
    }
}
