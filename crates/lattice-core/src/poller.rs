//! Periodic progress poller.
//!
//! On a fixed interval the poller issues one progress probe against the
//! shared worker connection and republishes the result as a
//! `ProgressReported` event. A failed probe is non-fatal: the tick is
//! skipped silently and the next tick retries naturally -- no retry is
//! scheduled inside the interval.
//!
//! # Stopping
//!
//! The stop signal is an atomic flag, not a channel: both the supervisor
//! (happy path) and the control handler (kill path) may stop the poller,
//! possibly both in one run, so `stop` must be idempotent and must never
//! block the signaling side. A stopped poller stays stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use lattice_events::{EventKind, EventSink};

use crate::worker::WorkerApi;

/// Interval between progress probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Stop handle for the poller.
///
/// Clonable; any holder may stop the poller any number of times without
/// blocking or racing the others.
#[derive(Debug, Clone, Default)]
pub struct PollerHandle {
    stopped: Arc<AtomicBool>,
}

impl PollerHandle {
    /// Create a handle in the active state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the poller to stop. Idempotent; never blocks.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop has been signaled.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Spawn the poller task.
///
/// Returns the stop handle and the task's join handle. The first probe
/// fires one full `period` after spawn.
pub fn spawn<W: WorkerApi>(
    worker: W,
    events: EventSink,
    period: Duration,
) -> (PollerHandle, JoinHandle<()>) {
    let handle = PollerHandle::new();
    let task = tokio::spawn(run(worker, events, period, handle.clone()));
    (handle, task)
}

async fn run<W: WorkerApi>(worker: W, events: EventSink, period: Duration, handle: PollerHandle) {
    let mut ticks = tokio::time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick resolves immediately; consume it so probes
    // start one full period after spawn.
    ticks.tick().await;

    loop {
        ticks.tick().await;
        if handle.is_stopped() {
            break;
        }
        match worker.progress().await {
            Ok(report) => {
                events
                    .emit(EventKind::ProgressReported {
                        turn: report.turn,
                        alive_count: report.alive_count,
                    })
                    .await;
            }
            Err(e) => {
                // Skipped tick; the next one retries naturally.
                debug!(error = %e, "progress probe failed");
            }
        }
    }
    debug!("progress poller stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::{ALIVE, World};

    use super::*;
    use crate::worker::{StubWorker, WorkerError};

    #[tokio::test(start_paused = true)]
    async fn poller_emits_progress_each_period() {
        let stub = StubWorker::new();
        stub.set_turn(9);
        let mut world = World::empty(2, 2);
        world.set(0, 0, ALIVE).unwrap();
        stub.set_world(world);

        let (sink, mut rx) = lattice_events::channel(8);
        let (_handle, task) = spawn(stub, sink, Duration::from_secs(2));

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.kind,
            EventKind::ProgressReported {
                turn: 9,
                alive_count: 1
            }
        ));

        let second = rx.recv().await.unwrap();
        assert!(matches!(second.kind, EventKind::ProgressReported { .. }));

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_poller_emits_nothing_further() {
        let stub = StubWorker::new();
        let (sink, mut rx) = lattice_events::channel(8);
        let (handle, task) = spawn(stub.clone(), sink, Duration::from_secs(2));

        handle.stop();
        // The poller observes the flag at its next tick and exits without
        // issuing a probe.
        task.await.unwrap();
        assert!(stub.calls().is_empty());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn double_stop_neither_blocks_nor_panics() {
        let stub = StubWorker::new();
        let (sink, _rx) = lattice_events::channel(8);
        let (handle, task) = spawn(stub, sink, Duration::from_secs(2));

        let clone = handle.clone();
        handle.stop();
        clone.stop();
        handle.stop();
        assert!(handle.is_stopped());

        task.await.unwrap();
    }

    /// A worker whose every call fails, for exercising transient-failure
    /// handling.
    #[derive(Debug, Clone)]
    struct FailingWorker;

    impl FailingWorker {
        fn down() -> WorkerError {
            WorkerError::Request {
                message: String::from("worker down"),
            }
        }
    }

    impl WorkerApi for FailingWorker {
        async fn evolve(
            &self,
            _world: World,
            _params: lattice_types::Params,
        ) -> Result<World, WorkerError> {
            Err(Self::down())
        }

        async fn progress(&self) -> Result<lattice_types::ProgressResponse, WorkerError> {
            Err(Self::down())
        }

        async fn snapshot(&self) -> Result<lattice_types::SnapshotResponse, WorkerError> {
            Err(Self::down())
        }

        async fn control(
            &self,
            _action: lattice_types::ControlAction,
        ) -> Result<u64, WorkerError> {
            Err(Self::down())
        }

        async fn resume(&self) -> Result<u64, WorkerError> {
            Err(Self::down())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probes_skip_ticks_without_killing_the_poller() {
        let (sink, mut rx) = lattice_events::channel(8);
        let (handle, task) = spawn(FailingWorker, sink, Duration::from_secs(2));

        // Several periods elapse; every probe fails, no event is emitted,
        // and the poller keeps ticking.
        tokio::time::sleep(Duration::from_secs(7)).await;
        handle.stop();
        task.await.unwrap();

        assert!(rx.recv().await.is_none());
    }
}
