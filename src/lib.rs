//! Carpool deployer: compile, deploy and call the Carpooling contract
//!
//! This crate drives a short pipeline against an EVM network:
//! - Loads one Solidity source file
//! - Compiles it with `solc --standard-json`, installing the release if needed
//! - Deploys the contract with a locally signed EIP-155 transaction
//! - Calls `joinRide(uint256)` on the new deployment
//!
//! # Example
//!
//! ```no_run
//! use carpool_deploy::config::DeployConfig;
//! use carpool_deploy::driver::Driver;
//! use carpool_deploy::wallet::Wallet;
//!
//! let config = DeployConfig::default();
//! let chain = config.chain_client().unwrap();
//! let wallet = Wallet::from_env().unwrap();
//!
//! let mut driver = Driver::new(chain, config.compiler(), wallet, config);
//! let summary = driver.run().unwrap();
//! println!("Contract at {}", summary.contract_address);
//! ```

pub mod cli;
pub mod config;
pub mod contract;
pub mod core;
pub mod crypto;
pub mod driver;
pub mod network;
pub mod source;
pub mod wallet;

// Re-export commonly used types
pub use config::{DeployConfig, GasPricePolicy};
pub use contract::{CompiledArtifact, ContractHandle, Solc, SolcInstaller, SolidityCompiler};
pub use core::{Receipt, SignedTransaction, TransactionDraft};
pub use driver::{Driver, DriverError, DriverEvent, DriverState, RunSummary};
pub use network::{ChainClient, ChainError, RpcChainClient};
pub use source::ContractSource;
pub use wallet::Wallet;
