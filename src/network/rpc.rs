//! JSON-RPC chain client
//!
//! Wraps an alloy HTTP provider behind the blocking [`ChainClient`] trait.
//! The client owns a single-threaded tokio runtime and blocks on each
//! request, so callers never see a future.

use crate::core::{Receipt, SignedTransaction};
use crate::network::client::{
    ChainClient, ChainError, DEFAULT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT,
};
use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, ProviderBuilder};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Chain client talking to an HTTP(S) JSON-RPC endpoint
pub struct RpcChainClient {
    runtime: Runtime,
    provider: Arc<dyn Provider + Send + Sync>,
    url: String,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcChainClient {
    /// Create a client for `url`. No request is made until the first call.
    pub fn new(url: &str) -> Result<Self, ChainError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ChainError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ChainError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        // Nonce, gas and chain id are filled in by the caller, so none of
        // the provider's own fillers are installed
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(parsed);

        Ok(Self {
            runtime,
            provider: Arc::new(provider),
            url: url.to_string(),
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Set how long [`ChainClient::wait_for_receipt`] waits before giving up
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Set the delay between receipt polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn rpc_error(e: impl fmt::Display) -> ChainError {
    ChainError::Rpc(e.to_string())
}

impl ChainClient for RpcChainClient {
    fn is_connected(&self) -> bool {
        match self.runtime.block_on(async { self.provider.get_chain_id().await }) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Liveness probe against {} failed: {}", self.url, e);
                false
            }
        }
    }

    fn chain_id(&self) -> Result<u64, ChainError> {
        self.runtime
            .block_on(async { self.provider.get_chain_id().await })
            .map_err(rpc_error)
    }

    fn get_transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        self.runtime
            .block_on(async { self.provider.get_transaction_count(address).await })
            .map_err(rpc_error)
    }

    fn gas_price(&self) -> Result<u128, ChainError> {
        self.runtime
            .block_on(async { self.provider.get_gas_price().await })
            .map_err(rpc_error)
    }

    fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, ChainError> {
        let pending = self
            .runtime
            .block_on(async { self.provider.send_raw_transaction(&tx.raw).await })
            .map_err(rpc_error)?;

        let hash = *pending.tx_hash();
        log::debug!("Submitted transaction {}", hash);
        Ok(hash)
    }

    fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, ChainError> {
        let deadline = Instant::now() + self.receipt_timeout;

        self.runtime.block_on(async {
            loop {
                let receipt = self
                    .provider
                    .get_transaction_receipt(hash)
                    .await
                    .map_err(rpc_error)?;

                if let Some(receipt) = receipt {
                    return Ok(Receipt::from(receipt));
                }

                if Instant::now() >= deadline {
                    return Err(ChainError::Timeout {
                        hash,
                        timeout: self.receipt_timeout,
                    });
                }

                log::trace!("Receipt for {} not available yet", hash);
                tokio::time::sleep(self.poll_interval).await;
            }
        })
    }
}

impl fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("url", &self.url)
            .field("receipt_timeout", &self.receipt_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
