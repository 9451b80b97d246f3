//! Storage actor owning all world-image file access.
//!
//! One task owns the image directory and processes commands from a channel
//! strictly in order: reads reply with the decoded grid, writes are queued
//! fire-and-forget, and an idle probe is answered only once the actor
//! reaches it -- which, given in-order processing, means every write
//! queued before the probe has completed. [`StorageHandle`] is the
//! clonable front shared by the supervisor and the control handler.

use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use lattice_types::World;

use crate::pgm;

/// Errors surfaced to storage callers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The file contents were not a valid world image.
    #[error("image decode error: {source}")]
    Pgm {
        /// The underlying codec error.
        #[from]
        source: pgm::PgmError,
    },

    /// The actor task is gone; no further storage operations are possible.
    #[error("storage actor closed")]
    Closed,
}

/// Commands processed by the storage actor, strictly in order.
enum StorageCommand {
    /// Read and decode the image for `label`, replying with the grid.
    ReadWorld {
        label: String,
        reply: oneshot::Sender<Result<World, StorageError>>,
    },
    /// Encode and write the grid under `label`. Fire-and-forget; failures
    /// are logged by the actor.
    WriteWorld { label: String, world: World },
    /// Reply once all previously queued commands have completed.
    CheckIdle { reply: oneshot::Sender<()> },
}

/// Clonable handle to the storage actor.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    tx: mpsc::Sender<StorageCommand>,
}

impl StorageHandle {
    /// Read the world image stored under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be read,
    /// [`StorageError::Pgm`] if it does not decode to a legal grid, or
    /// [`StorageError::Closed`] if the actor is gone.
    pub async fn read_world(&self, label: &str) -> Result<World, StorageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StorageCommand::ReadWorld {
                label: label.to_owned(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StorageError::Closed)?;
        reply_rx.await.map_err(|_| StorageError::Closed)?
    }

    /// Queue a world image write under `label`.
    ///
    /// Returns as soon as the write is queued; use [`check_idle`] to wait
    /// for completion. Write failures are logged by the actor.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if the actor is gone.
    ///
    /// [`check_idle`]: Self::check_idle
    pub async fn write_world(&self, label: &str, world: World) -> Result<(), StorageError> {
        self.tx
            .send(StorageCommand::WriteWorld {
                label: label.to_owned(),
                world,
            })
            .await
            .map_err(|_| StorageError::Closed)
    }

    /// Block until every previously queued write has completed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if the actor is gone.
    pub async fn check_idle(&self) -> Result<(), StorageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StorageCommand::CheckIdle { reply: reply_tx })
            .await
            .map_err(|_| StorageError::Closed)?;
        reply_rx.await.map_err(|_| StorageError::Closed)
    }
}

/// Start the storage actor over `image_dir` and return its handle.
///
/// The directory is created if missing. The actor runs until every handle
/// clone has dropped.
pub fn spawn(image_dir: PathBuf) -> StorageHandle {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(run_actor(rx, image_dir));
    StorageHandle { tx }
}

fn world_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("{label}.pgm"))
}

async fn run_actor(mut rx: mpsc::Receiver<StorageCommand>, dir: PathBuf) {
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        warn!(dir = %dir.display(), error = %e, "failed to create image directory");
    }

    while let Some(command) = rx.recv().await {
        match command {
            StorageCommand::ReadWorld { label, reply } => {
                let result = read_world_file(&world_path(&dir, &label)).await;
                let _ = reply.send(result);
            }
            StorageCommand::WriteWorld { label, world } => {
                let path = world_path(&dir, &label);
                match write_world_file(&path, &world).await {
                    Ok(()) => debug!(label = label, path = %path.display(), "world image written"),
                    Err(e) => error!(label = label, error = %e, "world image write failed"),
                }
            }
            StorageCommand::CheckIdle { reply } => {
                // All commands queued before this one have been processed.
                let _ = reply.send(());
            }
        }
    }
    debug!(dir = %dir.display(), "storage actor shutting down");
}

async fn read_world_file(path: &Path) -> Result<World, StorageError> {
    let bytes = tokio::fs::read(path).await?;
    let world = pgm::decode(&bytes)?;
    Ok(world)
}

async fn write_world_file(path: &Path, world: &World) -> Result<(), StorageError> {
    let bytes = pgm::encode(world);
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::ALIVE;

    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("lattice-io-{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn write_then_read_reproduces_the_grid() {
        let dir = scratch_dir();
        let storage = spawn(dir.clone());

        let mut world = World::empty(8, 8);
        world.set(3, 4, ALIVE).unwrap();
        world.set(7, 0, ALIVE).unwrap();

        storage.write_world("8x8x3", world.clone()).await.unwrap();
        storage.check_idle().await.unwrap();

        let read_back = storage.read_world("8x8x3").await.unwrap();
        assert_eq!(read_back, world);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn check_idle_waits_for_queued_writes() {
        let dir = scratch_dir();
        let storage = spawn(dir.clone());

        let world = World::empty(4, 4);
        storage.write_world("4x4x0", world).await.unwrap();
        storage.check_idle().await.unwrap();

        // The file must exist by the time the idle probe resolves.
        assert!(world_path(&dir, "4x4x0").exists());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_image_surfaces_an_io_error() {
        let dir = scratch_dir();
        let storage = spawn(dir.clone());

        let result = storage.read_world("16x16").await;
        assert!(matches!(result, Err(StorageError::Io { .. })));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
