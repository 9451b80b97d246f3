//! Keyboard input reader.
//!
//! Reads single characters from stdin and feeds parsed [`Command`]s into
//! the control handler's channel. Stdin reads are blocking, so the loop
//! runs on the blocking thread pool and bridges back into the async world
//! with a blocking send.
//!
//! Unknown keys (including the newline a line-buffered terminal appends)
//! are dropped at this boundary; only real commands reach the handler.

use std::io::Read as _;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use lattice_types::Command;

/// Spawn the stdin reader.
///
/// The task ends when stdin closes or the command channel's receiver is
/// dropped.
pub fn spawn(commands: mpsc::Sender<Command>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || read_loop(&commands))
}

fn read_loop(commands: &mpsc::Sender<Command>) {
    let mut stdin = std::io::stdin().lock();
    let mut buffer = [0u8; 1];
    loop {
        match stdin.read(&mut buffer) {
            Ok(0) => {
                debug!("stdin closed");
                break;
            }
            Ok(_) => {
                let Some(byte) = buffer.first().copied() else {
                    break;
                };
                if let Some(command) = Command::from_key(char::from(byte)) {
                    debug!(command = ?command, "keyboard command");
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}
