//! Shared type definitions for the Lattice simulation controller.
//!
//! This crate is the single source of truth for all types that cross crate
//! boundaries in the Lattice workspace: the world grid, run parameters, the
//! control vocabulary, and the wire payloads exchanged with the remote
//! worker over NATS.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for identifiers
//! - [`params`] -- Immutable run configuration
//! - [`state`] -- Run states, control actions, and operator commands
//! - [`wire`] -- Request/response payloads and NATS subject constants
//! - [`world`] -- The cell grid under simulation

pub mod ids;
pub mod params;
pub mod state;
pub mod wire;
pub mod world;

// Re-export all public types at crate root for convenience.
pub use ids::SessionId;
pub use params::Params;
pub use state::{Command, ControlAction, RunState};
pub use wire::{
    CONTROL_SUBJECT, ControlRequest, ControlResponse, EVOLVE_SUBJECT, EvolveRequest,
    EvolveResponse, PROGRESS_SUBJECT, ProgressRequest, ProgressResponse, RESUME_SUBJECT,
    ResumeRequest, ResumeResponse, SNAPSHOT_SUBJECT, SnapshotRequest, SnapshotResponse,
};
pub use world::{ALIVE, Cell, DEAD, World, WorldError};
