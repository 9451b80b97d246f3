//! Keypress-driven control state machine.
//!
//! The control handler consumes an ordered stream of operator [`Command`]s
//! and drives a three-state machine: `Running`, `Paused`, `Terminated`.
//! Each command translates to zero or more remote calls plus local I/O and
//! event emission. The transition table is matched exhaustively, so every
//! (state, command) pair is spelled out -- including the paused ones:
//! while paused, snapshot, detach, and kill remain valid input, and a
//! second pause toggle resumes.
//!
//! The handler never terminates the process itself. On detach and kill it
//! finishes its remote calls and cleanup, stops the poller, then hands an
//! [`ExitRequest`] to the orchestrator, which owns process exit.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lattice_events::{EventKind, EventSink};
use lattice_io::storage::{StorageError, StorageHandle};
use lattice_types::{Command, ControlAction, RunState};

use crate::poller::PollerHandle;
use crate::worker::{WorkerApi, WorkerError};

/// Controller-side view of the run's control state.
///
/// Only ever advanced on a worker-confirmed response: the machine never
/// assumes a state the worker has not acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// The worker is evolving turns.
    Running,
    /// The worker confirmed a pause.
    Paused,
    /// A detach or kill completed; the handler is done. Terminal.
    Terminated,
}

/// Request from the control handler that the orchestrator end the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    /// Process exit code.
    pub code: i32,
}

/// Errors raised while executing a single control command.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// A remote call failed.
    #[error("control remote call failed: {source}")]
    Worker {
        /// The underlying worker error.
        #[from]
        source: WorkerError,
    },

    /// A snapshot write could not be queued.
    #[error("control storage request failed: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: StorageError,
    },
}

/// The keypress-driven control component.
///
/// Owns its state; shares the worker connection, storage handle, event
/// sink, and poller stop handle with the other activities.
#[derive(Debug)]
pub struct ControlInputHandler<W> {
    worker: W,
    storage: StorageHandle,
    events: EventSink,
    poller: PollerHandle,
    exit_tx: mpsc::Sender<ExitRequest>,
    state: ControlState,
}

impl<W: WorkerApi> ControlInputHandler<W> {
    /// Create a handler in the `Running` state.
    pub const fn new(
        worker: W,
        storage: StorageHandle,
        events: EventSink,
        poller: PollerHandle,
        exit_tx: mpsc::Sender<ExitRequest>,
    ) -> Self {
        Self {
            worker,
            storage,
            events,
            poller,
            exit_tx,
            state: ControlState::Running,
        }
    }

    /// The current control state.
    pub const fn state(&self) -> ControlState {
        self.state
    }

    /// Consume commands until the stream closes or a terminal command
    /// completes.
    ///
    /// A failed command is logged and the loop reads the next command --
    /// one bad round trip does not take the operator surface down.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            if let Err(e) = self.handle(command).await {
                warn!(command = ?command, error = %e, "control command failed");
            }
            if self.state == ControlState::Terminated {
                break;
            }
        }
        debug!("control input handler finished");
    }

    /// Execute one command against the transition table.
    async fn handle(&mut self, command: Command) -> Result<(), ControlError> {
        match (self.state, command) {
            (ControlState::Terminated, _) => Ok(()),
            (_, Command::Snapshot) => self.write_snapshot().await,
            (ControlState::Running, Command::TogglePause) => self.pause().await,
            (ControlState::Paused, Command::TogglePause) => self.resume().await,
            (_, Command::Detach) => self.detach().await,
            (_, Command::Kill) => self.kill().await,
        }
    }

    /// `s`: fetch the current world and queue it to storage under a label
    /// encoding dimensions and turn.
    async fn write_snapshot(&self) -> Result<(), ControlError> {
        let snapshot = self.worker.snapshot().await?;
        let label = snapshot.world.snapshot_label(snapshot.turn);
        self.storage.write_world(&label, snapshot.world).await?;
        self.events
            .emit(EventKind::SnapshotWritten {
                turn: snapshot.turn,
                label: label.clone(),
            })
            .await;
        info!(turn = snapshot.turn, label = label, "snapshot requested");
        Ok(())
    }

    /// `p` while running: pause, report the worker-confirmed turn.
    async fn pause(&mut self) -> Result<(), ControlError> {
        let turn = self.worker.control(ControlAction::Pause).await?;
        self.state = ControlState::Paused;
        self.events
            .emit(EventKind::StateChanged {
                turn,
                state: RunState::Paused,
            })
            .await;
        info!(turn, "simulation paused");
        Ok(())
    }

    /// `p` while paused: resume.
    async fn resume(&mut self) -> Result<(), ControlError> {
        let turn = self.worker.resume().await?;
        self.state = ControlState::Running;
        self.events
            .emit(EventKind::StateChanged {
                turn,
                state: RunState::Running,
            })
            .await;
        info!(turn, "continuing");
        Ok(())
    }

    /// `q`: release this controller's session. The worker keeps evolving;
    /// only the local process ends.
    async fn detach(&mut self) -> Result<(), ControlError> {
        let turn = self.worker.control(ControlAction::Detach).await?;
        self.poller.stop();
        self.state = ControlState::Terminated;
        info!(turn, "detached from worker");
        self.request_exit().await;
        Ok(())
    }

    /// `k`: snapshot the current world while the worker is still
    /// reachable, then shut the worker down and end locally.
    async fn kill(&mut self) -> Result<(), ControlError> {
        self.write_snapshot().await?;
        let turn = self.worker.control(ControlAction::Shutdown).await?;
        self.poller.stop();
        self.state = ControlState::Terminated;
        info!(turn, "worker shutdown requested");
        self.request_exit().await;
        Ok(())
    }

    async fn request_exit(&self) {
        if self.exit_tx.send(ExitRequest { code: 0 }).await.is_err() {
            debug!("orchestrator gone, exit request dropped");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::{Path, PathBuf};

    use lattice_events::Event;
    use lattice_types::{ALIVE, World};

    use super::*;
    use crate::worker::{StubCall, StubWorker};

    struct Fixture {
        handler: ControlInputHandler<StubWorker>,
        stub: StubWorker,
        poller: PollerHandle,
        events_rx: mpsc::Receiver<Event>,
        exit_rx: mpsc::Receiver<ExitRequest>,
        dir: PathBuf,
    }

    fn make_fixture() -> Fixture {
        let dir = std::env::temp_dir().join(format!("lattice-control-{}", uuid::Uuid::now_v7()));
        let storage = lattice_io::storage::spawn(dir.clone());
        let (sink, events_rx) = lattice_events::channel(16);
        let (exit_tx, exit_rx) = mpsc::channel(2);
        let poller = PollerHandle::new();
        let stub = StubWorker::new();
        let handler = ControlInputHandler::new(
            stub.clone(),
            storage,
            sink,
            poller.clone(),
            exit_tx,
        );
        Fixture {
            handler,
            stub,
            poller,
            events_rx,
            exit_rx,
            dir,
        }
    }

    async fn cleanup(dir: &Path) {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn pause_then_resume_emits_worker_confirmed_turns() {
        let mut fx = make_fixture();

        fx.stub.set_turn(5);
        fx.handler.handle(Command::TogglePause).await.unwrap();
        assert_eq!(fx.handler.state(), ControlState::Paused);

        fx.stub.set_turn(6);
        fx.handler.handle(Command::TogglePause).await.unwrap();
        assert_eq!(fx.handler.state(), ControlState::Running);

        let first = fx.events_rx.recv().await.unwrap();
        assert!(matches!(
            first.kind,
            EventKind::StateChanged {
                turn: 5,
                state: RunState::Paused
            }
        ));
        let second = fx.events_rx.recv().await.unwrap();
        assert!(matches!(
            second.kind,
            EventKind::StateChanged {
                turn: 6,
                state: RunState::Running
            }
        ));

        assert_eq!(
            fx.stub.calls(),
            vec![
                StubCall::Control(ControlAction::Pause),
                StubCall::Resume
            ]
        );
        cleanup(&fx.dir).await;
    }

    #[tokio::test]
    async fn detach_releases_session_without_shutdown() {
        let mut fx = make_fixture();

        fx.handler.handle(Command::Detach).await.unwrap();

        assert_eq!(fx.handler.state(), ControlState::Terminated);
        assert!(fx.poller.is_stopped());
        assert_eq!(
            fx.stub.calls(),
            vec![StubCall::Control(ControlAction::Detach)]
        );
        assert_eq!(fx.exit_rx.recv().await, Some(ExitRequest { code: 0 }));
        cleanup(&fx.dir).await;
    }

    #[tokio::test]
    async fn kill_snapshots_before_shutting_down() {
        let mut fx = make_fixture();
        fx.stub.set_turn(12);
        let mut world = World::empty(4, 4);
        world.set(1, 1, ALIVE).unwrap();
        fx.stub.set_world(world);

        fx.handler.handle(Command::Kill).await.unwrap();

        assert_eq!(fx.handler.state(), ControlState::Terminated);
        assert!(fx.poller.is_stopped());
        assert_eq!(
            fx.stub.calls(),
            vec![
                StubCall::Snapshot,
                StubCall::Control(ControlAction::Shutdown)
            ]
        );

        let event = fx.events_rx.recv().await.unwrap();
        assert!(matches!(
            &event.kind,
            EventKind::SnapshotWritten { turn: 12, label } if label == "4x4x12"
        ));
        assert_eq!(fx.exit_rx.recv().await, Some(ExitRequest { code: 0 }));
        cleanup(&fx.dir).await;
    }

    #[tokio::test]
    async fn snapshot_is_valid_while_paused() {
        let mut fx = make_fixture();
        fx.stub.set_world(World::empty(2, 2));

        fx.stub.set_turn(3);
        fx.handler.handle(Command::TogglePause).await.unwrap();
        fx.handler.handle(Command::Snapshot).await.unwrap();
        assert_eq!(fx.handler.state(), ControlState::Paused);

        assert_eq!(
            fx.stub.calls(),
            vec![
                StubCall::Control(ControlAction::Pause),
                StubCall::Snapshot
            ]
        );
        cleanup(&fx.dir).await;
    }

    #[tokio::test]
    async fn kill_is_valid_while_paused() {
        let mut fx = make_fixture();
        fx.stub.set_world(World::empty(2, 2));

        fx.handler.handle(Command::TogglePause).await.unwrap();
        fx.handler.handle(Command::Kill).await.unwrap();

        assert_eq!(fx.handler.state(), ControlState::Terminated);
        assert_eq!(
            fx.stub.calls(),
            vec![
                StubCall::Control(ControlAction::Pause),
                StubCall::Snapshot,
                StubCall::Control(ControlAction::Shutdown)
            ]
        );
        cleanup(&fx.dir).await;
    }

    #[tokio::test]
    async fn run_stops_after_terminal_command() {
        let fx = make_fixture();
        let (tx, rx) = mpsc::channel(4);

        tx.send(Command::Detach).await.unwrap();
        // The handler must exit after the detach even though the sender
        // stays open.
        fx.handler.run(rx).await;
        drop(tx);
        cleanup(&fx.dir).await;
    }
}
