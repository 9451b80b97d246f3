//! PGM image codec and storage actor for the Lattice simulation.
//!
//! World grids are persisted as binary (P5) PGM images, one byte per cell,
//! so a snapshot is viewable in any image tool. All file access goes
//! through a single storage actor task driven by a command channel; the
//! actor processes commands strictly in order, which is what makes its
//! idle check meaningful: by the time an idle probe is answered, every
//! write queued before it has hit disk.
//!
//! # Modules
//!
//! - [`pgm`] -- encode/decode between [`lattice_types::World`] and P5 bytes
//! - [`storage`] -- the actor and its clonable [`storage::StorageHandle`]

pub mod pgm;
pub mod storage;

pub use pgm::PgmError;
pub use storage::{StorageError, StorageHandle};
