//! Event stream subscriber rendering the operator display.
//!
//! Consumes the controller's event stream in order and renders each event
//! as a structured log line. The loop ends when the stream closes -- the
//! terminal signal that no further events will arrive.

use tokio::sync::mpsc;
use tracing::{debug, info};

use lattice_events::{Event, EventKind};

/// Consume events until the stream closes.
pub async fn run(mut events: mpsc::Receiver<Event>) {
    while let Some(event) = events.recv().await {
        match event.kind {
            EventKind::ProgressReported { turn, alive_count } => {
                info!(turn, alive = alive_count, "progress");
            }
            EventKind::StateChanged { turn, state } => {
                info!(turn, state = ?state, "state changed");
            }
            EventKind::RunFinished { turn, alive_cells } => {
                info!(turn, alive = alive_cells.len(), "run finished");
            }
            EventKind::SnapshotWritten { turn, label } => {
                info!(turn, label = label, "snapshot written");
            }
        }
    }
    debug!("event stream closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::RunState;

    use super::*;

    #[tokio::test]
    async fn display_drains_the_stream_and_exits_on_close() {
        let (sink, rx) = lattice_events::channel(8);
        let task = tokio::spawn(run(rx));

        sink.emit(EventKind::ProgressReported {
            turn: 1,
            alive_count: 10,
        })
        .await;
        sink.emit(EventKind::StateChanged {
            turn: 1,
            state: RunState::Paused,
        })
        .await;
        drop(sink);

        // Closing the stream is the terminal signal; the subscriber exits.
        task.await.unwrap();
    }
}
