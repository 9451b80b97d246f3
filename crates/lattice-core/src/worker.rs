//! Worker client contract and stub implementation.
//!
//! The controller talks to the remote worker through exactly five
//! request/response operations. The [`WorkerApi`] trait abstracts the
//! transport -- the production implementation speaks NATS request/reply,
//! while [`StubWorker`] answers from canned state so the control machine,
//! poller, and supervisor can be exercised without a broker.
//!
//! Implementations must be cheaply clonable and safe to call from several
//! tasks at once: the supervisor, poller, and control handler all share
//! one connection, and no call may corrupt another's response.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lattice_types::{ControlAction, Params, ProgressResponse, SnapshotResponse, World};

/// Errors raised by worker client operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Establishing the worker connection failed. Fatal at startup.
    #[error("worker connection failed: {message}")]
    Connect {
        /// Description of the connection failure.
        message: String,
    },

    /// A request/response round trip failed.
    #[error("worker request failed: {message}")]
    Request {
        /// Description of the request failure.
        message: String,
    },

    /// A response payload could not be decoded.
    #[error("worker response decode failed: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },
}

/// The five remote operations the controller issues against the worker.
///
/// Every call is a synchronous round trip from the caller's point of view:
/// the future resolves only when the response arrives, and no deadline is
/// applied -- a hung worker hangs the calling activity.
pub trait WorkerApi: Clone + Send + Sync + 'static {
    /// Submit the initial world and parameters; resolve with the fully
    /// evolved world once all `params.turns` turns are computed.
    fn evolve(
        &self,
        world: World,
        params: Params,
    ) -> impl Future<Output = Result<World, WorkerError>> + Send;

    /// Non-mutating status probe: the current turn and live-cell count.
    fn progress(&self) -> impl Future<Output = Result<ProgressResponse, WorkerError>> + Send;

    /// The current world and turn, without altering run state.
    fn snapshot(&self) -> impl Future<Output = Result<SnapshotResponse, WorkerError>> + Send;

    /// Pause, detach, or shut down; resolves with the turn at which the
    /// action took effect.
    fn control(
        &self,
        action: ControlAction,
    ) -> impl Future<Output = Result<u64, WorkerError>> + Send;

    /// Resume a paused run; resolves with the turn evolution restarts at.
    fn resume(&self) -> impl Future<Output = Result<u64, WorkerError>> + Send;
}

/// One recorded call against a [`StubWorker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubCall {
    /// The bulk evolve operation.
    Evolve,
    /// A progress probe.
    Progress,
    /// A snapshot request.
    Snapshot,
    /// A control request with its action.
    Control(ControlAction),
    /// A resume request.
    Resume,
}

/// A canned worker for tests.
///
/// Holds a settable current turn and world, answers every operation from
/// them, and records the sequence of calls so tests can assert which
/// remote operations a code path issued (and in what order). `evolve`
/// returns the submitted world unchanged.
#[derive(Debug, Clone, Default)]
pub struct StubWorker {
    turn: Arc<AtomicU64>,
    world: Arc<std::sync::Mutex<Option<World>>>,
    calls: Arc<std::sync::Mutex<Vec<StubCall>>>,
}

impl StubWorker {
    /// Create a stub with no world and turn 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the turn reported by subsequent operations.
    pub fn set_turn(&self, turn: u64) {
        self.turn.store(turn, Ordering::Release);
    }

    /// Set the world returned by snapshot and progress operations.
    pub fn set_world(&self, world: World) {
        let mut guard = self.world.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(world);
    }

    /// The calls recorded so far, in issue order.
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, call: StubCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn current_world(&self) -> World {
        self.world
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| World::empty(0, 0))
    }
}

impl WorkerApi for StubWorker {
    async fn evolve(&self, world: World, _params: Params) -> Result<World, WorkerError> {
        self.record(StubCall::Evolve);
        self.set_world(world.clone());
        Ok(world)
    }

    async fn progress(&self) -> Result<ProgressResponse, WorkerError> {
        self.record(StubCall::Progress);
        Ok(ProgressResponse {
            turn: self.turn.load(Ordering::Acquire),
            alive_count: self.current_world().alive_count(),
        })
    }

    async fn snapshot(&self) -> Result<SnapshotResponse, WorkerError> {
        self.record(StubCall::Snapshot);
        Ok(SnapshotResponse {
            turn: self.turn.load(Ordering::Acquire),
            world: self.current_world(),
        })
    }

    async fn control(&self, action: ControlAction) -> Result<u64, WorkerError> {
        self.record(StubCall::Control(action));
        Ok(self.turn.load(Ordering::Acquire))
    }

    async fn resume(&self) -> Result<u64, WorkerError> {
        self.record(StubCall::Resume);
        Ok(self.turn.load(Ordering::Acquire))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::ALIVE;

    use super::*;

    #[tokio::test]
    async fn stub_records_calls_in_order() {
        let stub = StubWorker::new();
        stub.set_turn(3);

        let _ = stub.progress().await.unwrap();
        let _ = stub.control(ControlAction::Pause).await.unwrap();
        let _ = stub.resume().await.unwrap();

        assert_eq!(
            stub.calls(),
            vec![
                StubCall::Progress,
                StubCall::Control(ControlAction::Pause),
                StubCall::Resume
            ]
        );
    }

    #[tokio::test]
    async fn stub_reports_the_configured_turn() {
        let stub = StubWorker::new();
        stub.set_turn(42);
        assert_eq!(stub.control(ControlAction::Detach).await.unwrap(), 42);
        assert_eq!(stub.progress().await.unwrap().turn, 42);
    }

    #[tokio::test]
    async fn evolve_echoes_the_world_and_feeds_snapshots() {
        let stub = StubWorker::new();
        let mut world = World::empty(2, 2);
        world.set(0, 1, ALIVE).unwrap();

        let params = Params {
            image_height: 2,
            image_width: 2,
            turns: 1,
            threads: 1,
        };
        let evolved = stub.evolve(world.clone(), params).await.unwrap();
        assert_eq!(evolved, world);

        let snapshot = stub.snapshot().await.unwrap();
        assert_eq!(snapshot.world, world);
        assert_eq!(stub.progress().await.unwrap().alive_count, 1);
    }

    #[tokio::test]
    async fn clones_share_recorded_state() {
        let stub = StubWorker::new();
        let clone = stub.clone();
        let _ = clone.snapshot().await.unwrap();
        assert_eq!(stub.calls(), vec![StubCall::Snapshot]);
    }
}
