//! Chunked batch execution with order-preserving reassembly.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vedex_core::{CallDescriptor, CallOutcome};

use crate::transport::ReadTransport;
use crate::{GatewayError, Result};

/// Configuration for the batch gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Maximum calls per chunk (default: 100).
    pub max_chunk_size: usize,
    /// Chunks in flight at once (default: 4).
    pub max_concurrent_chunks: usize,
    /// Extra attempts for a chunk whose round trip fails (default: 2).
    pub max_retries: u32,
    /// Backoff unit in milliseconds; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 100,
            max_concurrent_chunks: 4,
            max_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}

impl GatewayConfig {
    /// Wait before retry `attempt` (1-based). Saturates instead of overflowing.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Executes read batches against a [`ReadTransport`].
///
/// A chunk whose round trip fails is retried up to `max_retries` more times;
/// if it still fails, the whole batch fails with [`GatewayError::ChunkFailed`].
/// Per-call reverts never fail the batch.
pub struct BatchGateway {
    transport: Arc<dyn ReadTransport>,
    config: GatewayConfig,
}

impl BatchGateway {
    pub fn new(transport: Arc<dyn ReadTransport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Execute `calls` with the configured chunk size.
    pub async fn execute(&self, calls: &[CallDescriptor]) -> Result<Vec<CallOutcome>> {
        self.execute_batch(calls, self.config.max_chunk_size).await
    }

    /// Execute `calls` in chunks of at most `max_chunk_size`.
    ///
    /// `result[i]` always corresponds to `calls[i]`, whatever order the chunks
    /// complete in.
    pub async fn execute_batch(
        &self,
        calls: &[CallDescriptor],
        max_chunk_size: usize,
    ) -> Result<Vec<CallOutcome>> {
        if max_chunk_size == 0 {
            return Err(GatewayError::InvalidChunkSize);
        }
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_count = calls.len().div_ceil(max_chunk_size);
        debug!(
            calls = calls.len(),
            chunks = chunk_count,
            max_chunk_size,
            "executing read batch"
        );

        let mut slots: Vec<Option<CallOutcome>> = vec![None; calls.len()];
        let mut in_flight = stream::iter(calls.chunks(max_chunk_size).enumerate())
            .map(|(index, chunk)| async move { (index, self.run_chunk(index, chunk).await) })
            .buffer_unordered(self.config.max_concurrent_chunks.max(1));

        while let Some((index, result)) = in_flight.next().await {
            let start = index * max_chunk_size;
            for (offset, outcome) in result?.into_iter().enumerate() {
                slots[start + offset] = Some(outcome);
            }
        }

        let results: Vec<CallOutcome> = slots.into_iter().flatten().collect();
        let failed = results.iter().filter(|o| o.is_failed()).count();
        info!(
            calls = results.len(),
            chunks = chunk_count,
            failed,
            "read batch complete"
        );
        Ok(results)
    }

    async fn run_chunk(&self, index: usize, chunk: &[CallDescriptor]) -> Result<Vec<CallOutcome>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(chunk = index, calls = chunk.len(), attempt, "dispatching chunk");
            match self.transport.call_chunk(chunk).await {
                Ok(outcomes) if outcomes.len() != chunk.len() => {
                    return Err(GatewayError::LengthMismatch {
                        chunk: index,
                        expected: chunk.len(),
                        got: outcomes.len(),
                    });
                }
                Ok(outcomes) => return Ok(outcomes),
                Err(e) if attempt <= self.config.max_retries => {
                    warn!(chunk = index, attempt, error = %e, "chunk failed, retrying");
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
                Err(e) => {
                    return Err(GatewayError::ChunkFailed {
                        chunk: index,
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}
