//! Vedex Batch Call Gateway
//!
//! Splits read-only contract calls into bounded-size chunks, dispatches the
//! chunks concurrently through a [`ReadTransport`], and reassembles a single
//! result list aligned index-for-index with the request list.

pub mod batch;
pub mod transport;

pub use batch::{BatchGateway, GatewayConfig};
pub use transport::ReadTransport;

use thiserror::Error;
use vedex_core::TransportError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("chunk size must be at least 1")]
    InvalidChunkSize,
    #[error("chunk {chunk} failed after {attempts} attempts: {source}")]
    ChunkFailed {
        chunk: usize,
        attempts: u32,
        source: TransportError,
    },
    #[error("chunk {chunk} returned {got} results for {expected} calls")]
    LengthMismatch {
        chunk: usize,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, GatewayError>;
