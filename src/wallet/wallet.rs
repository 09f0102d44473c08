//! Deployer wallet
//!
//! Holds the account's private key for the lifetime of a run and signs
//! transaction drafts. The key is read from the environment, never from a
//! command-line flag, and never appears in `Debug` output or logs.

use crate::core::{SignedTransaction, TransactionDraft, TransactionError};
use alloy_network::TxSignerSync;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use std::env;
use std::fmt;
use thiserror::Error;

/// Environment variable holding the hex-encoded private key
pub const PRIVATE_KEY_VAR: &str = "CARPOOL_PRIVATE_KEY";

/// Optional environment variable naming the expected account address
pub const ACCOUNT_VAR: &str = "CARPOOL_ACCOUNT";

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Environment variable {0} is not set")]
    MissingKey(&'static str),
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid account address: {0}")]
    InvalidAccount(String),
    #[error("Private key controls {actual}, expected account {expected}")]
    AccountMismatch { expected: Address, actual: Address },
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
}

/// The signing account
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Import a wallet from a hex private key (with or without `0x`)
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let signer = private_key_hex
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|_| WalletError::InvalidPrivateKey)?;
        Ok(Self { signer })
    }

    /// Load the key from `CARPOOL_PRIVATE_KEY`, checking it against
    /// `CARPOOL_ACCOUNT` when that is set. The variable is removed from the
    /// process environment and the copy read from it is zeroed before
    /// returning.
    pub fn from_env() -> Result<Self, WalletError> {
        let raw = env::var(PRIVATE_KEY_VAR).map_err(|_| WalletError::MissingKey(PRIVATE_KEY_VAR))?;
        env::remove_var(PRIVATE_KEY_VAR);

        let mut bytes = raw.into_bytes();
        let wallet = std::str::from_utf8(&bytes)
            .map_err(|_| WalletError::InvalidPrivateKey)
            .and_then(Self::from_private_key);
        bytes.fill(0);
        std::hint::black_box(&bytes);
        let wallet = wallet?;

        if let Ok(account) = env::var(ACCOUNT_VAR) {
            let expected = account
                .trim()
                .parse::<Address>()
                .map_err(|_| WalletError::InvalidAccount(account.clone()))?;
            wallet.check_account(expected)?;
        }

        Ok(wallet)
    }

    /// Get the wallet's address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Fail unless this wallet controls `expected`
    pub fn check_account(&self, expected: Address) -> Result<(), WalletError> {
        let actual = self.address();
        if actual != expected {
            return Err(WalletError::AccountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Sign a draft into an encoded EIP-155 transaction
    pub fn sign_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<SignedTransaction, WalletError> {
        let mut tx = draft.to_legacy();
        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| TransactionError::SigningFailed(e.to_string()))?;

        Ok(draft.clone().into_signed(signature))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("private_key", &"<redacted>")
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use alloy_consensus::{SignableTransaction, TxEnvelope};
    use alloy_eips::eip2718::Decodable2718;
    use alloy_primitives::{address, keccak256, Bytes};

    const DEV_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn test_address_from_key() {
        assert_eq!(dev_wallet().address(), DEV_ADDRESS);

        let unprefixed = DEV_PRIVATE_KEY.trim_start_matches("0x");
        let wallet = Wallet::from_private_key(unprefixed).unwrap();
        assert_eq!(wallet.address(), DEV_ADDRESS);
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            Wallet::from_private_key("not-a-key"),
            Err(WalletError::InvalidPrivateKey)
        ));
        assert!(matches!(
            Wallet::from_private_key("0x1234"),
            Err(WalletError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", dev_wallet());
        let key_body = DEV_PRIVATE_KEY.trim_start_matches("0x");
        assert!(!rendered.contains(key_body));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.to_lowercase().contains("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
    }

    #[test]
    fn test_from_env_takes_the_key() {
        env::set_var(ACCOUNT_VAR, format!("{}", DEV_ADDRESS));
        env::set_var(PRIVATE_KEY_VAR, DEV_PRIVATE_KEY);

        let wallet = Wallet::from_env().unwrap();
        assert_eq!(wallet.address(), DEV_ADDRESS);
        assert!(env::var_os(PRIVATE_KEY_VAR).is_none());

        // Read once: a second load finds nothing
        assert!(matches!(
            Wallet::from_env(),
            Err(WalletError::MissingKey(PRIVATE_KEY_VAR))
        ));

        // A key that does not control the configured account is rejected,
        // and still removed
        env::set_var(ACCOUNT_VAR, format!("{}", Address::ZERO));
        env::set_var(PRIVATE_KEY_VAR, DEV_PRIVATE_KEY);
        assert!(matches!(
            Wallet::from_env(),
            Err(WalletError::AccountMismatch { .. })
        ));
        assert!(env::var_os(PRIVATE_KEY_VAR).is_none());

        env::remove_var(ACCOUNT_VAR);
    }

    #[test]
    fn test_check_account() {
        let wallet = dev_wallet();
        wallet.check_account(DEV_ADDRESS).unwrap();
        assert!(matches!(
            wallet.check_account(Address::ZERO),
            Err(WalletError::AccountMismatch { .. })
        ));
    }

    #[test]
    fn test_sign_transaction() {
        let wallet = dev_wallet();
        let draft = TransactionDraft::deployment(
            31337,
            0,
            2_000_000,
            30_000_000_000,
            Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]),
        );

        let signed = wallet.sign_transaction(&draft).unwrap();
        assert_eq!(signed.hash, keccak256(&signed.raw));

        let decoded = signed.decode().unwrap();
        assert_eq!(decoded, draft.to_legacy());

        // The signature recovers to the wallet's address
        let envelope = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        let legacy = envelope.as_legacy().unwrap();
        let recovered = legacy
            .signature()
            .recover_address_from_prehash(&legacy.tx().signature_hash())
            .unwrap();
        assert_eq!(recovered, DEV_ADDRESS);
    }
}
