//! Chain client interface
//!
//! The blocking view of an EVM node that the deployment driver needs:
//! a liveness probe, account nonces, raw transaction submission and
//! receipt polling.

use crate::core::{Receipt, SignedTransaction};
use alloy_primitives::{Address, B256};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Default time to wait for a transaction to be mined
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default interval between receipt polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Chain client errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid RPC endpoint {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Transaction {hash} not mined within {timeout:?}")]
    Timeout { hash: B256, timeout: Duration },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Operations against a JSON-RPC node. Every call blocks until the node
/// answers.
pub trait ChainClient {
    /// Whether the endpoint answers at all
    fn is_connected(&self) -> bool;

    /// Chain id used for EIP-155 replay protection
    fn chain_id(&self) -> Result<u64, ChainError>;

    /// Number of transactions sent from `address`, i.e. its next nonce
    fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError>;

    /// Current network gas price in wei
    fn gas_price(&self) -> Result<u128, ChainError>;

    /// Submit a signed transaction and return its hash without waiting
    fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, ChainError>;

    /// Block until the transaction `hash` is mined
    fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, ChainError>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory chain that records every call

    use super::*;
    use alloy_primitives::{address, keccak256, TxKind};
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Address the fake assigns to every contract creation
    pub const FAKE_CONTRACT_ADDRESS: Address =
        address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    #[derive(Default)]
    pub struct FakeChain {
        pub connected: bool,
        pub chain_id: u64,
        /// Next nonce per account
        pub nonces: RefCell<HashMap<Address, u64>>,
        /// Every transaction submitted, in order
        pub sent: RefCell<Vec<SignedTransaction>>,
        /// Every receipt lookup, in order
        pub receipt_requests: RefCell<Vec<B256>>,
        pub probes: Cell<usize>,
        /// Mark message calls as reverted
        pub revert_calls: bool,
        /// Leave `contractAddress` out of creation receipts
        pub omit_contract_address: bool,
        pub receipts: RefCell<HashMap<B256, Receipt>>,
    }

    impl FakeChain {
        pub fn connected(chain_id: u64) -> Self {
            Self {
                connected: true,
                chain_id,
                ..Default::default()
            }
        }

        pub fn disconnected() -> Self {
            Self::default()
        }

        /// Decoded fields of every submitted transaction
        pub fn sent_legacy(&self) -> Vec<alloy_consensus::TxLegacy> {
            self.sent
                .borrow()
                .iter()
                .map(|tx| tx.decode().unwrap())
                .collect()
        }
    }

    impl ChainClient for FakeChain {
        fn is_connected(&self) -> bool {
            self.probes.set(self.probes.get() + 1);
            self.connected
        }

        fn chain_id(&self) -> Result<u64, ChainError> {
            Ok(self.chain_id)
        }

        fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError> {
            Ok(self.nonces.borrow().get(&address).copied().unwrap_or(0))
        }

        fn gas_price(&self) -> Result<u128, ChainError> {
            Ok(7_000_000_000)
        }

        fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, ChainError> {
            let legacy = tx.decode().map_err(|e| ChainError::Rpc(e.to_string()))?;
            let sender = crate::wallet::fixtures::dev_wallet().address();
            *self.nonces.borrow_mut().entry(sender).or_insert(0) += 1;

            let hash = keccak256(&tx.raw);
            let (contract_address, status) = match legacy.to {
                TxKind::Create if self.omit_contract_address => (None, true),
                TxKind::Create => (Some(FAKE_CONTRACT_ADDRESS), true),
                TxKind::Call(_) => (None, !self.revert_calls),
            };
            let block_number = self.sent.borrow().len() as u64 + 1;
            self.receipts.borrow_mut().insert(
                hash,
                Receipt {
                    transaction_hash: hash,
                    block_number: Some(block_number),
                    gas_used: 21_000,
                    contract_address,
                    status,
                },
            );
            self.sent.borrow_mut().push(tx.clone());
            Ok(hash)
        }

        fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, ChainError> {
            self.receipt_requests.borrow_mut().push(hash);
            self.receipts
                .borrow()
                .get(&hash)
                .cloned()
                .ok_or(ChainError::Timeout {
                    hash,
                    timeout: Duration::ZERO,
                })
        }
    }
}
