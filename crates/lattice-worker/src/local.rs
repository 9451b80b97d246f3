//! In-process worker implementation.
//!
//! [`LocalWorker`] implements the controller's [`WorkerApi`] directly over
//! a [`WorkerSession`], with no transport in between. Tests use it to run
//! the full controller stack end to end; the NATS service wraps the same
//! type, so the wire path and the in-process path share all run semantics.

use std::sync::Arc;

use lattice_core::{WorkerApi, WorkerError};
use lattice_types::{ControlAction, Params, ProgressResponse, SnapshotResponse, World};

use crate::session::WorkerSession;

/// A worker living in the calling process.
///
/// Clones share the session slot, so a control request issued through one
/// clone acts on the run submitted through another -- the same sharing the
/// remote worker provides across connections.
#[derive(Debug, Clone, Default)]
pub struct LocalWorker {
    session: Arc<std::sync::Mutex<Option<Arc<WorkerSession>>>>,
}

impl LocalWorker {
    /// Create a worker with no active session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active session, if a run has been submitted.
    pub fn session(&self) -> Option<Arc<WorkerSession>> {
        self.session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn current(&self) -> Result<Arc<WorkerSession>, WorkerError> {
        self.session().ok_or_else(|| WorkerError::Request {
            message: String::from("no active session"),
        })
    }
}

impl WorkerApi for LocalWorker {
    async fn evolve(&self, world: World, params: Params) -> Result<World, WorkerError> {
        let session = Arc::new(WorkerSession::new(world, params));
        {
            let mut slot = self.session.lock().unwrap_or_else(|e| e.into_inner());
            *slot = Some(Arc::clone(&session));
        }
        let final_world = session.run_to_completion().await;
        Ok(final_world)
    }

    async fn progress(&self) -> Result<ProgressResponse, WorkerError> {
        let session = self.current()?;
        let (turn, alive_count) = session.progress().await;
        Ok(ProgressResponse { turn, alive_count })
    }

    async fn snapshot(&self) -> Result<SnapshotResponse, WorkerError> {
        let session = self.current()?;
        let (turn, world) = session.snapshot().await;
        Ok(SnapshotResponse { turn, world })
    }

    async fn control(&self, action: ControlAction) -> Result<u64, WorkerError> {
        let session = self.current()?;
        match action {
            ControlAction::Pause => session.pause(),
            ControlAction::Detach => session.detach(),
            ControlAction::Shutdown => session.request_shutdown(),
        }
        Ok(session.turn())
    }

    async fn resume(&self) -> Result<u64, WorkerError> {
        let session = self.current()?;
        session.resume();
        Ok(session.turn())
    }
}
