use std::time::Duration;

/// Every cell of the board is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no free cell left on the board")]
pub struct BoardFull;

/// Failures reported by a [`Provider`](crate::provider::Provider).
///
/// Only `Connection` is fatal, and only at startup; the others end up as
/// activity log entries or are dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to connect: {0}")]
    Connection(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
