//! Solidity compiler adapter
//!
//! Turns a [`ContractSource`] into a deployable [`CompiledArtifact`] through
//! any [`SolidityCompiler`], normally [`crate::contract::Solc`].

use crate::contract::standard_json::{StandardJsonInput, StandardJsonOutput};
use crate::source::ContractSource;
use alloy_json_abi::JsonAbi;
use alloy_primitives::Bytes;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Compiler errors
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("Unsupported platform for solc builds: {0}")]
    UnsupportedPlatform(String),
    #[error("Compiler version {0} is not available")]
    VersionUnavailable(String),
    #[error("Invalid compiler version: {0}")]
    InvalidVersion(#[from] semver::Error),
    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("Checksum mismatch for solc {version}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        version: String,
        expected: String,
        actual: String,
    },
    #[error("Failed to run {}: {source}", binary.display())]
    Spawn { binary: PathBuf, source: io::Error },
    #[error("Compiler process failed: {0}")]
    ProcessFailed(String),
    #[error("Output selection must include abi and evm.bytecode")]
    IncompleteOutputSelection,
    #[error("Compilation failed:\n{}", .0.join("\n"))]
    Diagnostics(Vec<String>),
    #[error("Contract {name} not found in compiler output for {path}")]
    ContractNotFound { name: String, path: String },
    #[error("Contract {name} has no {artifact} in compiler output")]
    MissingArtifact { name: String, artifact: &'static str },
    #[error("Invalid bytecode: {0}")]
    InvalidBytecode(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Anything that answers a standard-JSON compilation request
pub trait SolidityCompiler {
    fn compile(&self, input: &StandardJsonInput) -> Result<StandardJsonOutput, CompilerError>;
}

impl<T: SolidityCompiler + ?Sized> SolidityCompiler for &T {
    fn compile(&self, input: &StandardJsonInput) -> Result<StandardJsonOutput, CompilerError> {
        (**self).compile(input)
    }
}

/// ABI and creation bytecode of one compiled contract
#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    name: String,
    abi: JsonAbi,
    bytecode: Bytes,
    metadata: Option<String>,
}

impl CompiledArtifact {
    pub fn new(name: impl Into<String>, abi: JsonAbi, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            abi,
            bytecode,
            metadata: None,
        }
    }

    /// Extract the artifact for `name` declared in `path`.
    ///
    /// Error diagnostics fail the whole compilation even when some artifacts
    /// were produced. Warnings are logged.
    pub fn from_output(
        output: &StandardJsonOutput,
        path: &str,
        name: &str,
    ) -> Result<Self, CompilerError> {
        for warning in output.warnings() {
            log::warn!("{}", warning.render());
        }

        if output.has_errors() {
            let errors = output.errors().map(|d| d.render()).collect();
            return Err(CompilerError::Diagnostics(errors));
        }

        let contract = output
            .contracts
            .get(path)
            .and_then(|contracts| contracts.get(name))
            .ok_or_else(|| CompilerError::ContractNotFound {
                name: name.to_string(),
                path: path.to_string(),
            })?;

        let abi = contract
            .abi
            .clone()
            .ok_or_else(|| CompilerError::MissingArtifact {
                name: name.to_string(),
                artifact: "abi",
            })?;

        let object = contract
            .bytecode_object()
            .map(str::trim)
            .filter(|object| !object.is_empty())
            .ok_or_else(|| CompilerError::MissingArtifact {
                name: name.to_string(),
                artifact: "evm.bytecode",
            })?;

        let object = object.strip_prefix("0x").unwrap_or(object);
        let bytecode =
            hex::decode(object).map_err(|e| CompilerError::InvalidBytecode(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            abi,
            bytecode: bytecode.into(),
            metadata: contract.metadata.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Creation bytecode
    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Compiler metadata JSON, when selected
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Human-readable signatures of the ABI's functions, sorted
    pub fn function_signatures(&self) -> Vec<String> {
        let mut signatures: Vec<String> = self.abi.functions().map(|f| f.signature()).collect();
        signatures.sort();
        signatures
    }
}

/// Compile `source` and extract the contract named after its file
pub fn compile_contract<K: SolidityCompiler + ?Sized>(
    compiler: &K,
    source: &ContractSource,
) -> Result<CompiledArtifact, CompilerError> {
    let input = StandardJsonInput::new(source.key(), source.content());
    if !input.selects_deployables() {
        return Err(CompilerError::IncompleteOutputSelection);
    }

    let output = compiler.compile(&input)?;
    let artifact = CompiledArtifact::from_output(&output, &source.key(), source.contract_name())?;

    log::info!(
        "Compiled {}: {} ABI entries, {} bytes of bytecode",
        artifact.name(),
        artifact.abi().len(),
        artifact.bytecode().len()
    );
    Ok(artifact)
}
