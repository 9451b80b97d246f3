//! The cell grid under simulation.
//!
//! A [`World`] is a two-dimensional grid of cell states stored as a flat
//! row-major byte vector. A cell is either dead ([`DEAD`]) or alive
//! ([`ALIVE`]); no other values are legal. Dimensions are fixed for the
//! lifetime of a run, and the grid is owned exclusively by whichever side
//! currently holds the authoritative copy -- ownership transfers whole,
//! by value, across the remote boundary.

use serde::{Deserialize, Serialize};

/// Byte value of a dead cell.
pub const DEAD: u8 = 0;

/// Byte value of a live cell.
pub const ALIVE: u8 = 255;

/// Errors raised when constructing or mutating a [`World`].
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The cell payload does not match the declared dimensions.
    #[error("payload of {actual} cells does not match {height}x{width}")]
    DimensionMismatch {
        /// Declared grid height.
        height: usize,
        /// Declared grid width.
        width: usize,
        /// Number of cells actually supplied.
        actual: usize,
    },

    /// A cell carried a value other than dead (0) or alive (255).
    #[error("illegal cell value {value} at index {index}")]
    IllegalCell {
        /// Flat index of the offending cell.
        index: usize,
        /// The value found there.
        value: u8,
    },

    /// A coordinate fell outside the grid.
    #[error("coordinate ({x}, {y}) outside {height}x{width} grid")]
    OutOfBounds {
        /// X coordinate (column).
        x: usize,
        /// Y coordinate (row).
        y: usize,
        /// Grid height.
        height: usize,
        /// Grid width.
        width: usize,
    },
}

/// An `(x, y)` coordinate identifying a live cell.
///
/// Used only in the compact alive-cells representation reported at run
/// completion, never for bulk world transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column, counted from the left edge.
    pub x: usize,
    /// Row, counted from the top edge.
    pub y: usize,
}

/// A two-dimensional grid of cell states.
///
/// Cells are stored row-major: the cell at `(x, y)` lives at flat index
/// `y * width + x`. Constructors validate that every cell is one of the
/// two legal values, and deserialization goes through the same validation,
/// so a `World` in hand is always well-formed -- including one that just
/// crossed the remote boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorldPayload")]
pub struct World {
    height: usize,
    width: usize,
    cells: Vec<u8>,
}

/// Unvalidated wire form of a [`World`].
#[derive(Debug, Deserialize)]
struct WorldPayload {
    height: usize,
    width: usize,
    cells: Vec<u8>,
}

impl TryFrom<WorldPayload> for World {
    type Error = WorldError;

    fn try_from(payload: WorldPayload) -> Result<Self, Self::Error> {
        Self::from_cells(payload.height, payload.width, payload.cells)
    }
}

impl World {
    /// Create an all-dead grid of the given dimensions.
    pub fn empty(height: usize, width: usize) -> Self {
        let size = height.saturating_mul(width);
        Self {
            height,
            width,
            cells: vec![DEAD; size],
        }
    }

    /// Build a grid from a flat row-major cell vector.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DimensionMismatch`] if the vector length is
    /// not `height * width`, or [`WorldError::IllegalCell`] if any byte is
    /// neither [`DEAD`] nor [`ALIVE`].
    pub fn from_cells(height: usize, width: usize, cells: Vec<u8>) -> Result<Self, WorldError> {
        let expected = height.saturating_mul(width);
        if cells.len() != expected {
            return Err(WorldError::DimensionMismatch {
                height,
                width,
                actual: cells.len(),
            });
        }
        for (index, &value) in cells.iter().enumerate() {
            if value != DEAD && value != ALIVE {
                return Err(WorldError::IllegalCell { index, value });
            }
        }
        Ok(Self {
            height,
            width,
            cells,
        })
    }

    /// Grid height (number of rows).
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Grid width (number of columns).
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The flat row-major cell bytes.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width).and_then(|row| row.checked_add(x))
    }

    /// Read the cell at `(x, y)`, or `None` if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.index_of(x, y)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Whether the cell at `(x, y)` is alive. Out-of-bounds reads as dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(ALIVE)
    }

    /// Write the cell at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the coordinate falls outside
    /// the grid, or [`WorldError::IllegalCell`] if `value` is not one of
    /// the two legal cell values.
    pub fn set(&mut self, x: usize, y: usize, value: u8) -> Result<(), WorldError> {
        if value != DEAD && value != ALIVE {
            return Err(WorldError::IllegalCell { index: 0, value });
        }
        let index = self.index_of(x, y).ok_or(WorldError::OutOfBounds {
            x,
            y,
            height: self.height,
            width: self.width,
        })?;
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = value;
        }
        Ok(())
    }

    /// Count the live cells in the grid.
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == ALIVE).count()
    }

    /// List the coordinates of every live cell.
    ///
    /// The scan is a single row-major pass, so the result is ordered by
    /// row, then by column within the row.
    pub fn alive_cells(&self) -> Vec<Cell> {
        let mut alive = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_alive(x, y) {
                    alive.push(Cell { x, y });
                }
            }
        }
        alive
    }

    /// Label encoding the grid dimensions, e.g. `"16x16"`.
    ///
    /// Used as the storage label for the initial world image.
    pub fn dimension_label(&self) -> String {
        format!("{}x{}", self.height, self.width)
    }

    /// Label encoding dimensions plus a turn number, e.g. `"16x16x2"`.
    ///
    /// Used as the storage label for snapshots.
    pub fn snapshot_label(&self, turn: u64) -> String {
        format!("{}x{}x{turn}", self.height, self.width)
    }
}
