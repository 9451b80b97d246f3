//! Error types for the worker service.

/// Errors raised by the NATS service loop and request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// NATS connection or messaging failed.
    #[error("NATS error: {0}")]
    Nats(String),

    /// A request payload could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The session rejected the operation.
    #[error("worker error: {0}")]
    Worker(String),
}
