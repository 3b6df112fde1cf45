//! Wallet and node collaborators.
//!
//! The orchestrator never encodes, signs or broadcasts transactions itself;
//! it goes through [`WalletSigner`] and [`ReceiptWatcher`]. [`DryRunWallet`]
//! implements both for testing and offline use.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use vedex_core::{TransportError, TxHash, B256};

use crate::call::WriteCall;

/// A call that passed simulation and is ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCall {
    pub call: WriteCall,
    pub gas_limit: u64,
}

/// Simulation of a call reverted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("simulation reverted: {reason}")]
pub struct Revert {
    pub reason: String,
}

impl Revert {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The user declined the signature request.
    #[error("user rejected: {0}")]
    UserRejected(String),
    #[error("send failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Reverted { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub hash: TxHash,
    pub status: ReceiptStatus,
}

impl Receipt {
    pub fn success(hash: TxHash) -> Self {
        Self {
            hash,
            status: ReceiptStatus::Success,
        }
    }

    pub fn reverted(hash: TxHash, reason: Option<String>) -> Self {
        Self {
            hash,
            status: ReceiptStatus::Reverted { reason },
        }
    }
}

/// Signs and broadcasts write calls for the connected account.
#[async_trait::async_trait]
pub trait WalletSigner: Send + Sync {
    /// Dry-run `call` against current chain state without prompting the user.
    async fn simulate(&self, call: &WriteCall) -> Result<PreparedCall, Revert>;

    /// Prompt the user to sign and broadcast. Returns the transaction hash.
    async fn send(&self, prepared: PreparedCall) -> Result<TxHash, SendError>;
}

/// Waits for a broadcast transaction to be mined.
#[async_trait::async_trait]
pub trait ReceiptWatcher: Send + Sync {
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, TransportError>;
}

/// Accepts every call and confirms it immediately. Records what was sent.
pub struct DryRunWallet {
    sent: Mutex<Vec<WriteCall>>,
    nonce: AtomicU64,
}

impl DryRunWallet {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            nonce: AtomicU64::new(0),
        }
    }

    /// Calls sent so far, in send order.
    pub fn sent(&self) -> Vec<WriteCall> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for DryRunWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WalletSigner for DryRunWallet {
    async fn simulate(&self, call: &WriteCall) -> Result<PreparedCall, Revert> {
        Ok(PreparedCall {
            call: call.clone(),
            gas_limit: 21_000,
        })
    }

    async fn send(&self, prepared: PreparedCall) -> Result<TxHash, SendError> {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            to = %prepared.call.target,
            method = prepared.call.method.signature(),
            "dry-run: recorded transaction"
        );
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prepared.call);
        Ok(dry_run_hash(nonce))
    }
}

/// The nonce big-endian in the low bytes; distinct for every nonce and never zero.
fn dry_run_hash(nonce: u64) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&nonce.to_be_bytes());
    B256::from(bytes)
}

#[async_trait::async_trait]
impl ReceiptWatcher for DryRunWallet {
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Receipt, TransportError> {
        Ok(Receipt::success(hash))
    }
}
