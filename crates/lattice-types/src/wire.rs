//! Request/response payloads and NATS subject constants.
//!
//! The controller and worker exchange five synchronous request/response
//! pairs over NATS request/reply. Each operation has a fixed subject and a
//! pair of serde-encoded payload structs defined here, so both sides agree
//! on the wire format at compile time.
//!
//! # Subject Convention
//!
//! - **Evolve:** `lattice.evolve` -- submit a world, reply with the fully
//!   evolved world
//! - **Progress:** `lattice.progress` -- non-mutating status probe
//! - **Snapshot:** `lattice.snapshot` -- current world without altering
//!   run state
//! - **Control:** `lattice.control` -- pause / detach / shutdown
//! - **Resume:** `lattice.resume` -- resume a paused run

use serde::{Deserialize, Serialize};

use crate::params::Params;
use crate::state::ControlAction;
use crate::world::World;

/// Subject for the bulk evolve operation.
pub const EVOLVE_SUBJECT: &str = "lattice.evolve";

/// Subject for the progress probe.
pub const PROGRESS_SUBJECT: &str = "lattice.progress";

/// Subject for the snapshot request.
pub const SNAPSHOT_SUBJECT: &str = "lattice.snapshot";

/// Subject for pause/detach/shutdown control requests.
pub const CONTROL_SUBJECT: &str = "lattice.control";

/// Subject for resuming a paused run.
pub const RESUME_SUBJECT: &str = "lattice.resume";

/// Submit the initial world and parameters for a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolveRequest {
    /// The initial world, transferred whole.
    pub world: World,
    /// Run parameters.
    pub params: Params,
}

/// The fully evolved world after all requested turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolveResponse {
    /// The final world, transferred whole.
    pub world: World,
}

/// Non-mutating progress probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRequest {}

/// Progress snapshot: the turn being processed and the live-cell count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressResponse {
    /// Turns completed so far.
    pub turn: u64,
    /// Live cells in the current world.
    pub alive_count: usize,
}

/// Request the current world without altering run state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRequest {}

/// The current world and the turn it was captured at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    /// Turns completed when the snapshot was taken.
    pub turn: u64,
    /// A copy of the current world.
    pub world: World,
}

/// Pause, detach, or shut down the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRequest {
    /// The requested action.
    pub action: ControlAction,
}

/// Acknowledgment of a control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    /// The turn at which the action took effect.
    pub turn: u64,
}

/// Resume a paused run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRequest {}

/// Acknowledgment of a resume request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeResponse {
    /// The turn at which evolution resumed.
    pub turn: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::world::ALIVE;

    #[test]
    fn evolve_request_round_trips_through_json() {
        let mut world = World::empty(2, 3);
        world.set(1, 1, ALIVE).unwrap();
        let request = EvolveRequest {
            world,
            params: Params {
                image_height: 2,
                image_width: 3,
                turns: 10,
                threads: 2,
            },
        };
        let bytes = serde_json::to_vec(&request).unwrap();
        let decoded: EvolveRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn control_request_encodes_its_action() {
        let request = ControlRequest {
            action: ControlAction::Shutdown,
        };
        let bytes = serde_json::to_vec(&request).unwrap();
        let decoded: ControlRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.action, ControlAction::Shutdown);
    }

    #[test]
    fn subjects_share_the_lattice_prefix() {
        for subject in [
            EVOLVE_SUBJECT,
            PROGRESS_SUBJECT,
            SNAPSHOT_SUBJECT,
            CONTROL_SUBJECT,
            RESUME_SUBJECT,
        ] {
            assert!(subject.starts_with("lattice."));
        }
    }
}
