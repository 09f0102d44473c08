//! Local contract handle
//!
//! Binds a compiled artifact to an on-chain address. A handle starts out
//! unaddressed after compilation and receives its address only from a
//! deployment receipt (or an explicit attach to an existing deployment).

use crate::contract::compiler::CompiledArtifact;
use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_primitives::{Address, Bytes, U256};
use thiserror::Error;

/// Contract errors
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Contract {0} has not been deployed")]
    NotDeployed(String),
    #[error("Contract {0} is already deployed at {1}")]
    AlreadyDeployed(String, Address),
    #[error("Function not found: {name} with {args} argument(s)")]
    UnknownFunction { name: String, args: usize },
    #[error("Constructor takes {expected} argument(s), got {got}")]
    ConstructorArguments { expected: usize, got: usize },
    #[error("ABI encoding error: {0}")]
    Encoding(#[from] alloy_dyn_abi::Error),
}

/// A compiled contract, optionally bound to its deployed address
#[derive(Debug, Clone)]
pub struct ContractHandle {
    artifact: CompiledArtifact,
    address: Option<Address>,
}

impl ContractHandle {
    /// Create an unaddressed handle
    pub fn new(artifact: CompiledArtifact) -> Self {
        Self {
            artifact,
            address: None,
        }
    }

    pub fn artifact(&self) -> &CompiledArtifact {
        &self.artifact
    }

    pub fn name(&self) -> &str {
        self.artifact.name()
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn is_deployed(&self) -> bool {
        self.address.is_some()
    }

    /// Bind the handle to its deployed address. A handle is bound once.
    pub fn bind(&mut self, address: Address) -> Result<(), ContractError> {
        if let Some(existing) = self.address {
            return Err(ContractError::AlreadyDeployed(
                self.name().to_string(),
                existing,
            ));
        }
        self.address = Some(address);
        Ok(())
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments
    pub fn deployment_data(&self, args: &[DynSolValue]) -> Result<Bytes, ContractError> {
        let mut data = self.artifact.bytecode().to_vec();

        match self.artifact.abi().constructor() {
            Some(constructor) => {
                if constructor.inputs.len() != args.len() {
                    return Err(ContractError::ConstructorArguments {
                        expected: constructor.inputs.len(),
                        got: args.len(),
                    });
                }
                data.extend(constructor.abi_encode_input(args)?);
            }
            None if !args.is_empty() => {
                return Err(ContractError::ConstructorArguments {
                    expected: 0,
                    got: args.len(),
                });
            }
            None => {}
        }

        Ok(data.into())
    }

    /// Target address and calldata for `name(args...)`.
    /// Overloads are resolved by argument count.
    pub fn encode_call(
        &self,
        name: &str,
        args: &[DynSolValue],
    ) -> Result<(Address, Bytes), ContractError> {
        let address = self
            .address
            .ok_or_else(|| ContractError::NotDeployed(self.name().to_string()))?;

        let function = self
            .artifact
            .abi()
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
            .ok_or_else(|| ContractError::UnknownFunction {
                name: name.to_string(),
                args: args.len(),
            })?;

        let calldata = function.abi_encode_input(args)?;
        Ok((address, calldata.into()))
    }

    /// Calldata for `joinRide(uint256 rideId)`
    pub fn join_ride(&self, ride_id: u64) -> Result<(Address, Bytes), ContractError> {
        self.encode_call("joinRide", &[DynSolValue::Uint(U256::from(ride_id), 256)])
    }
}
