//! Reference worker for the Lattice simulation.
//!
//! The worker owns the authoritative copy of the world for the duration of
//! a run: it receives the initial grid and parameters in one evolve
//! request, steps the cellular automaton turn by turn, and answers
//! progress, snapshot, and control requests between turns. The turn
//! counter and pause flag live here, never on the controller -- the
//! controller only ever observes them through responses.
//!
//! # Modules
//!
//! - [`engine`] -- the pure toroidal Life step
//! - [`session`] -- a run session: world, turn counter, pause/detach/
//!   shutdown flags
//! - [`local`] -- an in-process [`lattice_core::WorkerApi`] implementation
//!   over a session, for tests and single-process demos
//! - [`service`] -- the NATS request/reply service
//! - [`error`] -- service error type

pub mod engine;
pub mod error;
pub mod local;
pub mod service;
pub mod session;

pub use error::ServiceError;
pub use local::LocalWorker;
pub use service::WorkerService;
pub use session::WorkerSession;
