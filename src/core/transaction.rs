//! Transaction drafts and signed transactions
//!
//! A draft carries every field the chain needs (chain id, nonce, gas, target
//! and input) and is signed exactly once into an EIP-155 legacy transaction.
//! Drafts are built per operation and never reused.

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// One gwei in wei
pub const GWEI: u128 = 1_000_000_000;

/// Gas limit used for both the deployment and the ride call
pub const DEFAULT_GAS_LIMIT: u64 = 2_000_000;

/// Fixed gas price, in gwei
pub const DEFAULT_GAS_PRICE_GWEI: u64 = 30;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Invalid transaction encoding: {0}")]
    InvalidEncoding(String),
    #[error("Unsupported transaction type: {0}")]
    UnsupportedType(String),
}

// =============================================================================
// Transaction Draft
// =============================================================================

/// An unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    /// Gas price in wei
    pub gas_price: u128,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

impl TransactionDraft {
    /// Contract creation carrying `code` as init code
    pub fn deployment(
        chain_id: u64,
        nonce: u64,
        gas_limit: u64,
        gas_price: u128,
        code: Bytes,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            gas_limit,
            gas_price,
            to: None,
            value: U256::ZERO,
            input: code,
        }
    }

    /// Message call to `to` with `data` as calldata
    pub fn call(
        chain_id: u64,
        nonce: u64,
        gas_limit: u64,
        gas_price: u128,
        to: Address,
        data: Bytes,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            gas_limit,
            gas_price,
            to: Some(to),
            value: U256::ZERO,
            input: data,
        }
    }

    pub fn is_deployment(&self) -> bool {
        self.to.is_none()
    }

    fn kind(&self) -> TxKind {
        match self.to {
            Some(to) => TxKind::Call(to),
            None => TxKind::Create,
        }
    }

    /// The consensus-level legacy transaction for this draft
    pub fn to_legacy(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.kind(),
            value: self.value,
            input: self.input.clone(),
        }
    }

    /// Combine the draft with its signature
    pub fn into_signed(self, signature: Signature) -> SignedTransaction {
        let envelope = TxEnvelope::from(self.to_legacy().into_signed(signature));
        SignedTransaction::from_envelope(&envelope)
    }
}

// =============================================================================
// Signed Transaction
// =============================================================================

/// EIP-2718 encoded, signed transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Hash the chain will report for this transaction
    pub hash: B256,
    pub raw: Bytes,
}

impl SignedTransaction {
    fn from_envelope(envelope: &TxEnvelope) -> Self {
        Self {
            hash: *envelope.tx_hash(),
            raw: envelope.encoded_2718().into(),
        }
    }

    /// Decode the raw bytes back into the legacy transaction fields
    pub fn decode(&self) -> Result<TxLegacy, TransactionError> {
        let envelope = TxEnvelope::decode_2718(&mut self.raw.as_ref())
            .map_err(|e| TransactionError::InvalidEncoding(e.to_string()))?;

        match envelope {
            TxEnvelope::Legacy(signed) => Ok(signed.tx().clone()),
            other => Err(TransactionError::UnsupportedType(format!(
                "{:?}",
                other.tx_type()
            ))),
        }
    }
}
