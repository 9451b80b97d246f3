//! Error types for the controller binary.
//!
//! [`ControllerError`] is the top-level error type that wraps all possible
//! failure modes during controller startup and the run itself.

/// Top-level error for the controller binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lattice_core::ConfigError,
    },

    /// The worker connection could not be established or a call failed.
    #[error("worker error: {source}")]
    Worker {
        /// The underlying worker error.
        #[from]
        source: lattice_core::WorkerError,
    },

    /// The run itself failed.
    #[error("run error: {source}")]
    Run {
        /// The underlying supervisor error.
        #[from]
        source: lattice_core::SupervisorError,
    },
}
