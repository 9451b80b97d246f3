//! Controller binary for the Lattice simulation.
//!
//! This is the orchestrator: it wires the channels, owns the lifetime of
//! the three concurrent activities (run supervisor, progress poller,
//! control input handler), and is the only component that terminates the
//! process. All three activities share one worker connection and one
//! outbound event stream; the orchestrator closes that stream -- by
//! dropping the last sink -- only after every other event-producing
//! activity has been told to stop.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lattice-config.yaml`
//! 3. Connect to the worker (fatal if unreachable)
//! 4. Start the storage actor
//! 5. Create the event stream and spawn the display subscriber
//! 6. Spawn the progress poller
//! 7. Spawn the keyboard reader and control handler
//! 8. Drive the run, listening for an operator exit
//! 9. Shut down and close the event stream

mod display;
mod error;
mod keyboard;
mod nats_worker;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lattice_core::supervisor::RunOutcome;
use lattice_core::{
    ControlInputHandler, ControllerConfig, ExitRequest, SupervisorError, poller, run_simulation,
};

use crate::error::ControllerError;
use crate::nats_worker::NatsWorkerClient;

/// Outbound event channel capacity.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Keyboard command channel capacity.
const COMMAND_CHANNEL_CAPACITY: usize = 8;

/// How the select over the run and the exit channel resolved.
enum Driven {
    /// The supervisor ran to its conclusion.
    Completed(Result<RunOutcome, SupervisorError>),
    /// The operator detached or killed the run.
    Exit(ExitRequest),
}

/// Application entry point for the controller.
///
/// # Errors
///
/// Returns an error if startup fails (unreachable worker, bad config) or
/// the run itself fails; the process then exits non-zero.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lattice-controller starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        height = config.run.image_height,
        width = config.run.image_width,
        turns = config.run.turns,
        threads = config.run.threads,
        nats_url = config.infrastructure.nats_url,
        poll_interval_ms = config.poller.interval_ms,
        "configuration loaded"
    );

    // 3. Connect to the worker. An unreachable worker is fatal before any
    //    simulation work begins.
    let worker = NatsWorkerClient::connect(&config.infrastructure.nats_url)
        .await
        .map_err(ControllerError::from)?;

    // 4. Start the storage actor.
    let storage = lattice_io::storage::spawn(PathBuf::from(&config.infrastructure.image_dir));

    // 5. Event stream and display subscriber.
    let (events, events_rx) = lattice_events::channel(EVENT_CHANNEL_CAPACITY);
    let display_task = tokio::spawn(display::run(events_rx));

    // 6. Progress poller.
    let (poller, poller_task) = poller::spawn(
        worker.clone(),
        events.clone(),
        config.poller.interval(),
    );

    // 7. Keyboard reader and control handler.
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let keyboard_task = keyboard::spawn(command_tx);
    let (exit_tx, mut exit_rx) = mpsc::channel(1);
    let handler = ControlInputHandler::new(
        worker.clone(),
        storage.clone(),
        events.clone(),
        poller.clone(),
        exit_tx,
    );
    let control_task = tokio::spawn(handler.run(command_rx));

    // 8. Drive the run while listening for an operator exit. If the exit
    //    channel closes without a request (stdin ended), only the run is
    //    awaited.
    let params = config.run.params();
    let driven = tokio::select! {
        outcome = run_simulation(&worker, params, &storage, &events, &poller) => {
            Driven::Completed(outcome)
        }
        Some(request) = exit_rx.recv() => Driven::Exit(request),
    };

    // 9. Shut down. In both paths the background activities are stopped
    //    before the last event sink drops; closing the stream is the
    //    terminal signal to the display.
    match driven {
        Driven::Completed(result) => {
            let outcome = result.map_err(ControllerError::from)?;
            control_task.abort();
            keyboard_task.abort();
            poller_task.abort();
            drop(events);
            let _ = display_task.await;
            info!(
                final_turn = outcome.final_turn,
                alive = outcome.alive_cells.len(),
                "lattice-controller shutdown complete"
            );
            Ok(())
        }
        Driven::Exit(request) => {
            // The control handler already finished its remote cleanup and
            // stopped the poller before requesting exit.
            keyboard_task.abort();
            poller_task.abort();
            drop(events);
            let _ = display_task.await;
            info!(code = request.code, "operator exit");
            std::process::exit(request.code);
        }
    }
}

/// Load the controller configuration from `lattice-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<ControllerConfig, ControllerError> {
    let config_path = Path::new("lattice-config.yaml");
    if config_path.exists() {
        let config = ControllerConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("config file not found, using defaults");
        Ok(ControllerConfig::default())
    }
}
