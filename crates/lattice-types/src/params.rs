//! Immutable run configuration.

use serde::{Deserialize, Serialize};

/// Parameters for one simulation run.
///
/// Set once before the run is submitted to the worker and read-only
/// thereafter. The worker receives the full struct alongside the initial
/// world in the evolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Grid height in cells.
    pub image_height: usize,

    /// Grid width in cells.
    pub image_width: usize,

    /// Total number of turns to evolve.
    pub turns: u64,

    /// Advisory parallelism hint for the worker. The worker may ignore it.
    pub threads: usize,
}

impl Params {
    /// Storage label for the initial world image, e.g. `"512x512"`.
    pub fn input_label(&self) -> String {
        format!("{}x{}", self.image_height, self.image_width)
    }

    /// Storage label for the final snapshot, e.g. `"512x512x1000"`.
    pub fn output_label(&self) -> String {
        format!("{}x{}x{}", self.image_height, self.image_width, self.turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_height_width_turn_order() {
        let params = Params {
            image_height: 16,
            image_width: 16,
            turns: 2,
            threads: 4,
        };
        assert_eq!(params.input_label(), "16x16");
        assert_eq!(params.output_label(), "16x16x2");
    }
}
