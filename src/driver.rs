//! Deployment driver
//!
//! Runs the pipeline connect → compile → deploy → joinRide as an explicit
//! state machine. Each stage requires the previous one to have succeeded;
//! any failure moves the driver to [`DriverState::Failed`] and stops it.
//! Nothing is retried.

use crate::config::{ConfigError, DeployConfig};
use crate::contract::{
    compile_contract, CompilerError, ContractError, ContractHandle, SolidityCompiler,
};
use crate::core::{Receipt, TransactionDraft, TransactionError};
use crate::network::{ChainClient, ChainError};
use crate::source::{self, SourceError};
use crate::wallet::{Wallet, WalletError};
use alloy_primitives::{Address, Bytes, B256};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Driver errors
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Not connected to the network")]
    NotConnected,
    #[error("Deployment receipt {0} carries no contract address")]
    MissingContractAddress(B256),
    #[error("Transaction reverted: {0}")]
    Reverted(Receipt),
    #[error("Cannot {operation} in state {state}")]
    InvalidState {
        operation: &'static str,
        state: DriverState,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Compiler(#[from] CompilerError),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// States and Events
// =============================================================================

/// Pipeline stage reached so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Disconnected,
    Connected,
    Compiled,
    Deployed,
    RideJoined,
    Failed,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Compiled => "compiled",
            Self::Deployed => "deployed",
            Self::RideJoined => "ride joined",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a transaction is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPurpose {
    Deploy,
    JoinRide(u64),
}

impl fmt::Display for TxPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => f.write_str("deployment"),
            Self::JoinRide(ride_id) => write!(f, "joinRide({})", ride_id),
        }
    }
}

/// Progress reported while the pipeline runs
#[derive(Debug, Clone)]
pub enum DriverEvent {
    Connected {
        chain_id: u64,
        account: Address,
    },
    Compiled {
        name: String,
        functions: Vec<String>,
        bytecode_len: usize,
    },
    Submitted {
        purpose: TxPurpose,
        hash: B256,
        nonce: u64,
    },
    Mined {
        purpose: TxPurpose,
        receipt: Receipt,
    },
    Deployed {
        address: Address,
    },
    Attached {
        address: Address,
    },
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub chain_id: u64,
    pub contract_address: Address,
    pub deploy_receipt: Receipt,
    pub join_receipt: Receipt,
}

type Reporter = Box<dyn FnMut(&DriverEvent)>;

// =============================================================================
// Driver
// =============================================================================

/// Sequential deployment pipeline over a chain client and a compiler
pub struct Driver<C: ChainClient, K: SolidityCompiler> {
    chain: C,
    compiler: K,
    wallet: Wallet,
    config: DeployConfig,
    state: DriverState,
    history: Vec<DriverState>,
    chain_id: Option<u64>,
    contract: Option<ContractHandle>,
    reporter: Option<Reporter>,
}

impl<C: ChainClient, K: SolidityCompiler> Driver<C, K> {
    pub fn new(chain: C, compiler: K, wallet: Wallet, config: DeployConfig) -> Self {
        Self {
            chain,
            compiler,
            wallet,
            config,
            state: DriverState::Disconnected,
            history: vec![DriverState::Disconnected],
            chain_id: None,
            contract: None,
            reporter: None,
        }
    }

    /// Receive every [`DriverEvent`] as it happens
    pub fn on_event(mut self, reporter: impl FnMut(&DriverEvent) + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Every state entered, starting with `Disconnected`
    pub fn history(&self) -> &[DriverState] {
        &self.history
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn contract(&self) -> Option<&ContractHandle> {
        self.contract.as_ref()
    }

    /// Run every stage in order
    pub fn run(&mut self) -> Result<RunSummary, DriverError> {
        let chain_id = self.connect()?;
        self.compile()?;
        let deploy_receipt = self.deploy()?;
        let join_receipt = self.join_ride()?;

        let contract_address = self
            .contract
            .as_ref()
            .and_then(|c| c.address())
            .ok_or(DriverError::MissingContractAddress(deploy_receipt.transaction_hash))?;

        Ok(RunSummary {
            chain_id,
            contract_address,
            deploy_receipt,
            join_receipt,
        })
    }

    /// Disconnected → Connected. Fails with [`DriverError::NotConnected`]
    /// when the endpoint does not answer.
    pub fn connect(&mut self) -> Result<u64, DriverError> {
        self.require("connect", DriverState::Disconnected)?;
        let result = self.try_connect();
        self.finish(result, DriverState::Connected)
    }

    /// Connected → Compiled
    pub fn compile(&mut self) -> Result<&ContractHandle, DriverError> {
        self.require("compile", DriverState::Connected)?;
        let result = self.try_compile();
        self.finish(result, DriverState::Compiled)?;
        self.handle()
    }

    /// Compiled → Deployed. Returns the deployment receipt.
    pub fn deploy(&mut self) -> Result<Receipt, DriverError> {
        self.require("deploy", DriverState::Compiled)?;
        let result = self.try_deploy();
        self.finish(result, DriverState::Deployed)
    }

    /// Compiled → Deployed, using a contract that already lives at `address`
    pub fn attach(&mut self, address: Address) -> Result<(), DriverError> {
        self.require("attach", DriverState::Compiled)?;
        let result = self.try_attach(address);
        self.finish(result, DriverState::Deployed)
    }

    /// Deployed → RideJoined. Returns the call's receipt.
    pub fn join_ride(&mut self) -> Result<Receipt, DriverError> {
        self.require("join a ride", DriverState::Deployed)?;
        let result = self.try_join_ride();
        self.finish(result, DriverState::RideJoined)
    }

    fn try_connect(&mut self) -> Result<u64, DriverError> {
        if !self.chain.is_connected() {
            log::error!("No answer from {}", self.config.rpc_url);
            return Err(DriverError::NotConnected);
        }

        let chain_id = self.chain.chain_id()?;
        self.chain_id = Some(chain_id);
        log::info!("Connected to chain {}", chain_id);

        self.report(DriverEvent::Connected {
            chain_id,
            account: self.wallet.address(),
        });
        Ok(chain_id)
    }

    fn try_compile(&mut self) -> Result<(), DriverError> {
        let source = source::load(&self.config.source_path)?;
        let artifact = compile_contract(&self.compiler, &source)?;

        self.report(DriverEvent::Compiled {
            name: artifact.name().to_string(),
            functions: artifact.function_signatures(),
            bytecode_len: artifact.bytecode().len(),
        });
        self.contract = Some(ContractHandle::new(artifact));
        Ok(())
    }

    fn try_deploy(&mut self) -> Result<Receipt, DriverError> {
        let data = self.handle()?.deployment_data(&[])?;
        let receipt = self.transact(TxPurpose::Deploy, None, data)?;

        let address = receipt
            .contract_address
            .ok_or(DriverError::MissingContractAddress(receipt.transaction_hash))?;
        self.bind(address)?;

        log::info!("Contract deployed at {}", address);
        self.report(DriverEvent::Deployed { address });
        Ok(receipt)
    }

    fn try_attach(&mut self, address: Address) -> Result<(), DriverError> {
        self.bind(address)?;
        self.report(DriverEvent::Attached { address });
        Ok(())
    }

    fn try_join_ride(&mut self) -> Result<Receipt, DriverError> {
        let ride_id = self.config.ride_id;
        let (to, data) = self.handle()?.join_ride(ride_id)?;
        self.transact(TxPurpose::JoinRide(ride_id), Some(to), data)
    }

    /// Build, sign and submit one transaction, then wait for its receipt.
    /// The nonce is read from the chain right before the draft is built.
    fn transact(
        &mut self,
        purpose: TxPurpose,
        to: Option<Address>,
        input: Bytes,
    ) -> Result<Receipt, DriverError> {
        let chain_id = self.chain_id.ok_or(DriverError::NotConnected)?;
        let nonce = self.chain.get_transaction_count(self.wallet.address())?;
        let gas_price = self.config.gas_price.resolve(&self.chain)?;

        let draft = match to {
            Some(to) => TransactionDraft::call(
                chain_id,
                nonce,
                self.config.gas_limit,
                gas_price,
                to,
                input,
            ),
            None => TransactionDraft::deployment(
                chain_id,
                nonce,
                self.config.gas_limit,
                gas_price,
                input,
            ),
        };
        let signed = self.wallet.sign_transaction(&draft)?;

        let hash = self.chain.send_raw_transaction(&signed)?;
        if hash != signed.hash {
            log::warn!(
                "Node reported hash {} for {} transaction {}",
                hash,
                purpose,
                signed.hash
            );
        }
        log::info!("Sent {} transaction {} (nonce {})", purpose, hash, nonce);
        self.report(DriverEvent::Submitted {
            purpose,
            hash,
            nonce,
        });

        let receipt = self.chain.wait_for_receipt(hash)?;
        self.report(DriverEvent::Mined {
            purpose,
            receipt: receipt.clone(),
        });

        if !receipt.status {
            return Err(DriverError::Reverted(receipt));
        }
        Ok(receipt)
    }

    fn handle(&self) -> Result<&ContractHandle, DriverError> {
        self.contract.as_ref().ok_or(DriverError::InvalidState {
            operation: "use the contract",
            state: self.state,
        })
    }

    fn bind(&mut self, address: Address) -> Result<(), DriverError> {
        let state = self.state;
        let contract = self.contract.as_mut().ok_or(DriverError::InvalidState {
            operation: "bind the contract",
            state,
        })?;
        contract.bind(address)?;
        Ok(())
    }

    fn require(&self, operation: &'static str, expected: DriverState) -> Result<(), DriverError> {
        if self.state != expected {
            return Err(DriverError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Move to `next` on success, to `Failed` otherwise
    fn finish<T>(
        &mut self,
        result: Result<T, DriverError>,
        next: DriverState,
    ) -> Result<T, DriverError> {
        let state = if result.is_ok() { next } else { DriverState::Failed };
        log::debug!("Driver state: {} -> {}", self.state, state);
        self.state = state;
        self.history.push(state);
        result
    }

    fn report(&mut self, event: DriverEvent) {
        if let Some(reporter) = self.reporter.as_mut() {
            reporter(&event);
        }
    }
}

impl<C: ChainClient, K: SolidityCompiler> fmt::Debug for Driver<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("state", &self.state)
            .field("account", &self.wallet.address())
            .field("chain_id", &self.chain_id)
            .field("config", &self.config)
            .finish()
    }
}
