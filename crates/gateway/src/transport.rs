//! Node-access boundary for batched reads.

use vedex_core::{CallDescriptor, CallOutcome, TransportError};

/// Submits one chunk of read calls to a node (typically as a single
/// multicall request).
///
/// Implementations must return exactly one outcome per call, in input order.
/// A revert of an individual call is reported as [`CallOutcome::Failed`];
/// `Err` is reserved for failures of the round trip as a whole. Connection
/// pooling and node fallback are the implementation's concern.
#[async_trait::async_trait]
pub trait ReadTransport: Send + Sync {
    async fn call_chunk(
        &self,
        calls: &[CallDescriptor],
    ) -> Result<Vec<CallOutcome>, TransportError>;
}
