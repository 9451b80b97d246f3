//! Controller event stream for the Lattice simulation.
//!
//! Every observable step of a run produces an immutable, timestamped
//! [`Event`] pushed onto one shared outbound stream. Events are consumed
//! strictly in emission order by a single subscriber (typically a display
//! front end). The stream closes when the last [`EventSink`] drops -- that
//! close is the terminal signal that no further events will arrive, so the
//! orchestrator drops its final sink only after every other event-producing
//! activity has been told to stop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use lattice_types::{Cell, RunState};

/// What an [`Event`] reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Periodic progress sample from the poller.
    ProgressReported {
        /// Turns completed so far.
        turn: u64,
        /// Live cells at that turn.
        alive_count: usize,
    },

    /// The run moved between running, paused, and quitting.
    StateChanged {
        /// The turn the worker confirmed for the transition.
        turn: u64,
        /// The state entered.
        state: RunState,
    },

    /// All requested turns completed.
    RunFinished {
        /// The final turn number.
        turn: u64,
        /// Coordinates of every cell alive in the final world.
        alive_cells: Vec<Cell>,
    },

    /// A world image was written to storage.
    SnapshotWritten {
        /// The turn the snapshot captured.
        turn: u64,
        /// The storage label, encoding dimensions and turn.
        label: String,
    },
}

/// An immutable, timestamped record of observable progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Wall-clock time the event was emitted.
    pub occurred_at: DateTime<Utc>,
    /// The event payload.
    pub kind: EventKind,
}

/// Producer handle for the event stream.
///
/// Clonable; each concurrent activity holds its own sink. Emission order
/// is preserved per sink, and the stream tolerates a subscriber that has
/// already gone away.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

impl EventSink {
    /// Stamp and emit an event.
    ///
    /// A departed subscriber is not an error: the event is dropped and
    /// logged at debug level.
    pub async fn emit(&self, kind: EventKind) {
        let event = Event {
            occurred_at: Utc::now(),
            kind,
        };
        if self.tx.send(event).await.is_err() {
            debug!("event subscriber gone, dropping event");
        }
    }
}

/// Create an event stream with the given channel capacity.
///
/// Returns the producer sink and the single subscriber's receiver. The
/// receiver yields `None` once every clone of the sink has dropped.
pub fn channel(capacity: usize) -> (EventSink, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSink { tx }, rx)
}
