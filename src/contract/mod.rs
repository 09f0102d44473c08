//! Smart contract module
//!
//! Compiles Solidity sources and wraps the result in a contract handle.
//!
//! # Overview
//!
//! This module implements:
//! - The `solc --standard-json` input/output types
//! - A `solc` process runner and release installer
//! - Extraction of ABI and bytecode for the contract named after its file
//! - A handle that binds the compiled contract to its deployed address
//!
//! # Example
//!
//! ```no_run
//! use carpool_deploy::contract::{compile_contract, ContractHandle, Solc, SolcInstaller};
//! use carpool_deploy::source;
//! use semver::Version;
//!
//! let source = source::load("./contracts/Carpooling.sol").unwrap();
//! let solc = Solc::managed(SolcInstaller::new(".solc"), Version::new(0, 8, 0));
//!
//! let artifact = compile_contract(&solc, &source).unwrap();
//! let handle = ContractHandle::new(artifact);
//! assert!(!handle.is_deployed());
//! ```

pub mod compiler;
pub mod contract;
pub mod solc;
pub mod standard_json;
pub mod toolchain;

pub use compiler::{compile_contract, CompiledArtifact, CompilerError, SolidityCompiler};
pub use contract::{ContractError, ContractHandle};
pub use solc::Solc;
pub use standard_json::{Diagnostic, StandardJsonInput, StandardJsonOutput};
pub use toolchain::{SolcInstaller, DEFAULT_SOLC_VERSION};
