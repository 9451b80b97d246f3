//! A run session: the worker-side control state.
//!
//! All mutable run state -- the world, the turn counter, the pause and
//! shutdown flags -- lives in one [`WorkerSession`] shared between the
//! evolution task and the request handlers. Control fields are atomics so
//! status probes never contend with the evolution loop; only world access
//! takes the lock, and only between turns.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, Notify};
use tracing::info;

use lattice_types::{Params, SessionId, World};

use crate::engine;

/// Worker-side state for one submitted run.
#[derive(Debug)]
pub struct WorkerSession {
    /// Session identity, minted at submission. Survives controller detach.
    id: SessionId,

    /// Run parameters as submitted.
    params: Params,

    /// The authoritative world. Locked only between turns.
    world: Mutex<World>,

    /// Turns completed so far.
    turn: AtomicU64,

    /// Whether evolution is paused.
    paused: AtomicBool,

    /// Notification used to wake the evolution loop when resumed.
    resume_notify: Notify,

    /// Whether the submitting controller has released the session.
    detached: AtomicBool,

    /// Whether a full shutdown has been requested.
    shutdown: AtomicBool,
}

impl WorkerSession {
    /// Create a session over the submitted world and parameters.
    pub fn new(world: World, params: Params) -> Self {
        Self {
            id: SessionId::new(),
            params,
            world: Mutex::new(world),
            turn: AtomicU64::new(0),
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            detached: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        }
    }

    /// The session identity.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The run parameters.
    pub const fn params(&self) -> Params {
        self.params
    }

    /// Turns completed so far.
    pub fn turn(&self) -> u64 {
        self.turn.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether evolution is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause evolution. Takes effect between turns.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume evolution and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until evolution may proceed.
    ///
    /// Returns immediately if not paused. A shutdown request also releases
    /// the wait so the loop can observe it.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) && !self.shutdown.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Detach / Shutdown
    // -----------------------------------------------------------------------

    /// Release the submitting controller. Evolution is unaffected; a
    /// future controller may attach. Idempotent.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Whether the controller has detached.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    /// Request evolution stop. Idempotent; wakes a paused loop.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether a shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// The current turn and live-cell count.
    pub async fn progress(&self) -> (u64, usize) {
        let world = self.world.lock().await;
        (self.turn(), world.alive_count())
    }

    /// The current turn and a copy of the world. Run state is unchanged.
    pub async fn snapshot(&self) -> (u64, World) {
        let world = self.world.lock().await;
        (self.turn(), world.clone())
    }

    // -----------------------------------------------------------------------
    // Evolution
    // -----------------------------------------------------------------------

    /// Evolve the submitted world through all requested turns.
    ///
    /// Pauses gate between turns; a shutdown request ends the loop early.
    /// Returns the world as of the last completed turn.
    pub async fn run_to_completion(&self) -> World {
        info!(
            session = %self.id,
            turns = self.params.turns,
            height = self.params.image_height,
            width = self.params.image_width,
            threads = self.params.threads,
            "evolution starting"
        );

        for _ in 0..self.params.turns {
            self.wait_if_paused().await;
            if self.is_shutdown_requested() {
                break;
            }
            {
                let mut world = self.world.lock().await;
                *world = engine::step_turn(&world);
            }
            self.turn.fetch_add(1, Ordering::AcqRel);
            // Yield between turns so status and control requests interleave
            // with evolution.
            tokio::task::yield_now().await;
        }

        let final_world = self.world.lock().await.clone();
        info!(session = %self.id, turn = self.turn(), "evolution finished");
        final_world
    }
}
