//! Wallet module for key management and transaction signing

pub mod wallet;

pub use wallet::{Wallet, WalletError, ACCOUNT_VAR, PRIVATE_KEY_VAR};

#[cfg(test)]
pub(crate) use wallet::fixtures;
