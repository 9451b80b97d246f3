//! Run states, control actions, and operator commands.
//!
//! Three small vocabularies that the controller and worker share:
//!
//! - [`RunState`] -- the state a run can be observed in, carried by
//!   `StateChanged` events
//! - [`ControlAction`] -- the mutating control operations a controller can
//!   request from the worker, each with its single-character wire key
//! - [`Command`] -- the operator keyboard commands, parsed from raw
//!   keypresses into a tagged variant so every command site matches
//!   exhaustively

use serde::{Deserialize, Serialize};

/// Observable state of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// The worker is evolving turns.
    Running,
    /// Evolution is paused between turns.
    Paused,
    /// The controller is shutting down its side of the run.
    Quitting,
}

/// A control operation requested from the worker.
///
/// Each action maps to the single-character key the original wire protocol
/// used; the key is retained in the request payload for worker-side logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlAction {
    /// Halt evolution between turns. A paused run resumes via the
    /// dedicated resume operation.
    Pause,
    /// Release this controller's session. The worker keeps evolving and a
    /// future controller may attach.
    Detach,
    /// Stop evolution and shut the worker process down.
    Shutdown,
}

impl ControlAction {
    /// The single-character wire key for this action.
    pub const fn key(self) -> char {
        match self {
            Self::Pause => 'p',
            Self::Detach => 'q',
            Self::Shutdown => 'k',
        }
    }
}

/// An operator keyboard command.
///
/// Raw keypresses are parsed once, at the input boundary, into this enum;
/// everything downstream matches on variants, so an unhandled command is a
/// compile-time visible gap rather than a silent fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `s` -- write the worker's current world to storage.
    Snapshot,
    /// `p` -- pause a running simulation, or resume a paused one.
    TogglePause,
    /// `q` -- detach this controller; the worker keeps running.
    Detach,
    /// `k` -- snapshot, then shut down the worker and this controller.
    Kill,
}

impl Command {
    /// Parse a keypress into a command. Unknown keys yield `None`.
    pub const fn from_key(key: char) -> Option<Self> {
        match key {
            's' => Some(Self::Snapshot),
            'p' => Some(Self::TogglePause),
            'q' => Some(Self::Detach),
            'k' => Some(Self::Kill),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_actions_keep_their_wire_keys() {
        assert_eq!(ControlAction::Pause.key(), 'p');
        assert_eq!(ControlAction::Detach.key(), 'q');
        assert_eq!(ControlAction::Shutdown.key(), 'k');
    }

    #[test]
    fn known_keys_parse_to_commands() {
        assert_eq!(Command::from_key('s'), Some(Command::Snapshot));
        assert_eq!(Command::from_key('p'), Some(Command::TogglePause));
        assert_eq!(Command::from_key('q'), Some(Command::Detach));
        assert_eq!(Command::from_key('k'), Some(Command::Kill));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(Command::from_key('x'), None);
        assert_eq!(Command::from_key('\n'), None);
        assert_eq!(Command::from_key(' '), None);
    }
}
