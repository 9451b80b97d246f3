//! The happy-path run sequence.
//!
//! [`run_simulation`] drives one complete run: load the initial world from
//! storage, hand it whole to the worker, block until the fully evolved
//! world comes back, publish completion events, persist the final
//! snapshot, stop the poller, wait for storage to drain, and emit the
//! terminal state change. Closing the event stream itself is the
//! orchestrator's job -- it happens by dropping the last sink, and only
//! after every other event-producing activity has been told to stop.

use tokio::sync::oneshot;
use tracing::info;

use lattice_events::{EventKind, EventSink};
use lattice_io::storage::{StorageError, StorageHandle};
use lattice_types::{Cell, Params, RunState};

use crate::poller::PollerHandle;
use crate::worker::{WorkerApi, WorkerError};

/// Errors that end a run.
///
/// Any of these is unrecoverable: there is no retry of the bulk evolve
/// call, so a failure surfaces as a fatal controller error.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// Reading or writing a world image failed.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying storage error.
        #[from]
        source: StorageError,
    },

    /// A remote call failed.
    #[error("worker error: {source}")]
    Worker {
        /// The underlying worker error.
        #[from]
        source: WorkerError,
    },

    /// The evolve task ended without delivering a result.
    #[error("evolve call abandoned before a result arrived")]
    EvolveAbandoned,

    /// A world had the wrong dimensions for this run.
    #[error("world is {actual_height}x{actual_width}, expected {height}x{width}")]
    DimensionMismatch {
        /// Expected grid height.
        height: usize,
        /// Expected grid width.
        width: usize,
        /// Height actually returned.
        actual_height: usize,
        /// Width actually returned.
        actual_width: usize,
    },
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The final turn number (equal to `params.turns`).
    pub final_turn: u64,
    /// Coordinates of every cell alive in the final world.
    pub alive_cells: Vec<Cell>,
}

/// Run one simulation to completion.
///
/// Blocks the calling task for the whole run. The poller and control
/// handler run concurrently against the same worker connection and event
/// stream throughout.
///
/// # Errors
///
/// Returns [`SupervisorError`] if the initial world cannot be loaded, the
/// evolve call fails, or the final snapshot cannot be queued. There is no
/// retry path; the caller treats any error as fatal.
pub async fn run_simulation<W: WorkerApi>(
    worker: &W,
    params: Params,
    storage: &StorageHandle,
    events: &EventSink,
    poller: &PollerHandle,
) -> Result<RunOutcome, SupervisorError> {
    info!(
        height = params.image_height,
        width = params.image_width,
        turns = params.turns,
        threads = params.threads,
        "run starting"
    );

    // 1. Load the initial world, row-major, from the I/O collaborator.
    let initial = storage.read_world(&params.input_label()).await?;
    check_dimensions(&initial, params)?;

    // 2. Submit the whole world and block until the evolved result comes
    //    back. The hand-off channel buffers the full payload: the evolve
    //    task's send completes without a rendezvous, so the two sides
    //    never deadlock even though they run in different tasks.
    let (result_tx, result_rx) = oneshot::channel();
    let evolve_worker = worker.clone();
    tokio::spawn(async move {
        let result = evolve_worker.evolve(initial, params).await;
        let _ = result_tx.send(result);
    });
    let evolved = result_rx
        .await
        .map_err(|_| SupervisorError::EvolveAbandoned)??;

    // 3. The returned world is final. Dimensions must survive the round
    //    trip; cell legality is enforced on deserialization.
    check_dimensions(&evolved, params)?;

    // 4. One row-major pass over the final grid.
    let alive_cells = evolved.alive_cells();

    // 5. Report completion before anything else observable happens.
    events
        .emit(EventKind::RunFinished {
            turn: params.turns,
            alive_cells: alive_cells.clone(),
        })
        .await;

    // 6-7. Persist the final grid, then report the write.
    let label = params.output_label();
    storage.write_world(&label, evolved).await?;
    events
        .emit(EventKind::SnapshotWritten {
            turn: params.turns,
            label: label.clone(),
        })
        .await;

    // 8. Stop the poller. Idempotent: the kill path may already have.
    poller.stop();

    // 9. Wait for every queued write to reach disk.
    storage.check_idle().await?;

    // 10. Terminal state change; the orchestrator closes the stream.
    events
        .emit(EventKind::StateChanged {
            turn: params.turns,
            state: RunState::Quitting,
        })
        .await;

    info!(
        turn = params.turns,
        alive = alive_cells.len(),
        label = label,
        "run complete"
    );

    Ok(RunOutcome {
        final_turn: params.turns,
        alive_cells,
    })
}

fn check_dimensions(world: &lattice_types::World, params: Params) -> Result<(), SupervisorError> {
    if world.height() == params.image_height && world.width() == params.image_width {
        Ok(())
    } else {
        Err(SupervisorError::DimensionMismatch {
            height: params.image_height,
            width: params.image_width,
            actual_height: world.height(),
            actual_width: world.width(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::{Path, PathBuf};

    use lattice_io::pgm;
    use lattice_types::{ALIVE, World};

    use super::*;
    use crate::worker::{StubCall, StubWorker};

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("lattice-supervisor-{}", uuid::Uuid::now_v7()))
    }

    async fn seed_initial_world(dir: &Path, world: &World) {
        tokio::fs::create_dir_all(dir).await.unwrap();
        let path = dir.join(format!("{}.pgm", world.dimension_label()));
        tokio::fs::write(path, pgm::encode(world)).await.unwrap();
    }

    fn make_params(height: usize, width: usize, turns: u64) -> Params {
        Params {
            image_height: height,
            image_width: width,
            turns,
            threads: 1,
        }
    }

    #[tokio::test]
    async fn happy_path_emits_events_in_order_and_stops_poller() {
        let dir = scratch_dir();
        let mut world = World::empty(8, 8);
        world.set(2, 3, ALIVE).unwrap();
        seed_initial_world(&dir, &world).await;

        let storage = lattice_io::storage::spawn(dir.clone());
        let (sink, mut rx) = lattice_events::channel(16);
        let poller = PollerHandle::new();
        let stub = StubWorker::new();
        let params = make_params(8, 8, 4);

        let outcome = run_simulation(&stub, params, &storage, &sink, &poller)
            .await
            .unwrap();
        drop(sink);

        // The stub echoes the world, so the single live cell survives.
        assert_eq!(outcome.final_turn, 4);
        assert_eq!(outcome.alive_cells, vec![lattice_types::Cell { x: 2, y: 3 }]);
        assert_eq!(stub.calls(), vec![StubCall::Evolve]);
        assert!(poller.is_stopped());

        // RunFinished strictly before SnapshotWritten, strictly before
        // the terminal state change, strictly before close.
        let first = rx.recv().await.unwrap();
        assert!(matches!(first.kind, EventKind::RunFinished { turn: 4, .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            &second.kind,
            EventKind::SnapshotWritten { turn: 4, label } if label == "8x8x4"
        ));
        let third = rx.recv().await.unwrap();
        assert!(matches!(
            third.kind,
            EventKind::StateChanged {
                turn: 4,
                state: RunState::Quitting
            }
        ));
        assert!(rx.recv().await.is_none());

        // The final snapshot landed on disk before check_idle resolved.
        let written = storage.read_world("8x8x4").await.unwrap();
        assert_eq!(written, world);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_initial_world_is_fatal() {
        let dir = scratch_dir();
        let storage = lattice_io::storage::spawn(dir.clone());
        let (sink, _rx) = lattice_events::channel(4);
        let poller = PollerHandle::new();
        let stub = StubWorker::new();

        let result = run_simulation(&stub, make_params(16, 16, 2), &storage, &sink, &poller).await;

        assert!(matches!(result, Err(SupervisorError::Storage { .. })));
        // No remote work began.
        assert!(stub.calls().is_empty());
        assert!(!poller.is_stopped());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn initial_world_with_wrong_dimensions_is_fatal() {
        let dir = scratch_dir();
        // The stored image is 4x4, but the run is configured for 8x8.
        let world = World::empty(4, 4);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("8x8.pgm");
        tokio::fs::write(path, pgm::encode(&world)).await.unwrap();

        let storage = lattice_io::storage::spawn(dir.clone());
        let (sink, _rx) = lattice_events::channel(4);
        let poller = PollerHandle::new();
        let stub = StubWorker::new();

        let result = run_simulation(&stub, make_params(8, 8, 1), &storage, &sink, &poller).await;

        assert!(matches!(
            result,
            Err(SupervisorError::DimensionMismatch {
                height: 8,
                width: 8,
                actual_height: 4,
                actual_width: 4,
            })
        ));
        assert!(stub.calls().is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn double_poller_stop_after_run_is_harmless() {
        let dir = scratch_dir();
        let world = World::empty(4, 4);
        seed_initial_world(&dir, &world).await;

        let storage = lattice_io::storage::spawn(dir.clone());
        let (sink, _rx) = lattice_events::channel(16);
        let poller = PollerHandle::new();
        let stub = StubWorker::new();

        run_simulation(&stub, make_params(4, 4, 1), &storage, &sink, &poller)
            .await
            .unwrap();

        // The kill path may stop the poller a second time.
        poller.stop();
        assert!(poller.is_stopped());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
