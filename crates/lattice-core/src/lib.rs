//! Controller core for the Lattice simulation.
//!
//! The controller offloads a turn-based cellular-automaton run to a remote
//! worker and keeps the local operator surface responsive while the remote
//! computation proceeds. This crate holds everything about the controller
//! that is independent of the transport and the terminal:
//!
//! - [`worker`] -- the [`worker::WorkerApi`] contract for the five remote
//!   operations, plus a canned stub for tests
//! - [`control`] -- the keypress-driven control state machine
//! - [`poller`] -- the periodic progress poller with its idempotent stop
//! - [`supervisor`] -- the happy-path run sequence
//! - [`config`] -- YAML configuration loading
//!
//! # Concurrency Model
//!
//! One supervising task plus exactly two background activities (poller and
//! control handler), communicating only via channels. All three share one
//! worker client and one outbound event stream; both tolerate concurrent
//! use. Every remote call blocks its calling activity until the response
//! arrives -- there is no timeout and no retry anywhere in the controller.

pub mod config;
pub mod control;
pub mod poller;
pub mod supervisor;
pub mod worker;

pub use config::{ConfigError, ControllerConfig};
pub use control::{ControlInputHandler, ControlState, ExitRequest};
pub use poller::PollerHandle;
pub use supervisor::{RunOutcome, SupervisorError, run_simulation};
pub use worker::{StubWorker, WorkerApi, WorkerError};
