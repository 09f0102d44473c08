//! Core chain data types
//!
//! This module contains:
//! - Transaction drafts and their signed, encoded form
//! - Receipts returned once a transaction is mined

pub mod receipt;
pub mod transaction;

pub use receipt::Receipt;
pub use transaction::{
    SignedTransaction, TransactionDraft, TransactionError, DEFAULT_GAS_LIMIT,
    DEFAULT_GAS_PRICE_GWEI, GWEI,
};
