//! Chain access module
//!
//! Provides the blocking JSON-RPC client the deployment driver talks to.
//!
//! # Features
//! - Liveness probe and chain id lookup
//! - Account nonce and gas price queries
//! - Raw transaction submission
//! - Receipt polling with a timeout

pub mod client;
pub mod rpc;

pub use client::{ChainClient, ChainError, DEFAULT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT};
pub use rpc::RpcChainClient;
