//! The pure toroidal Life step.
//!
//! The grid wraps at both edges: the neighbor of a border cell on the far
//! side is the cell on the opposite border. A live cell survives with two
//! or three live neighbors; a dead cell with exactly three live neighbors
//! becomes alive; everything else is dead next turn.

use lattice_types::{ALIVE, World};

/// Compute one turn over the whole grid.
pub fn step_turn(world: &World) -> World {
    let height = world.height();
    let width = world.width();
    let mut next = World::empty(height, width);
    for y in 0..height {
        for x in 0..width {
            let neighbors = alive_neighbors(world, x, y);
            let lives = matches!(
                (world.is_alive(x, y), neighbors),
                (true, 2 | 3) | (false, 3)
            );
            if lives {
                // (x, y) is in range by construction.
                let _ = next.set(x, y, ALIVE);
            }
        }
    }
    next
}

/// Evolve a world through `turns` turns.
pub fn evolve(mut world: World, turns: u64) -> World {
    for _ in 0..turns {
        world = step_turn(&world);
    }
    world
}

fn wrap_prev(i: usize, len: usize) -> usize {
    if i == 0 {
        len.saturating_sub(1)
    } else {
        i.saturating_sub(1)
    }
}

fn wrap_next(i: usize, len: usize) -> usize {
    let next = i.saturating_add(1);
    if next == len { 0 } else { next }
}

fn alive_neighbors(world: &World, x: usize, y: usize) -> u8 {
    let xs = [wrap_prev(x, world.width()), x, wrap_next(x, world.width())];
    let ys = [wrap_prev(y, world.height()), y, wrap_next(y, world.height())];
    let mut count = 0u8;
    for &ny in &ys {
        for &nx in &xs {
            if nx == x && ny == y {
                continue;
            }
            if world.is_alive(nx, ny) {
                count = count.saturating_add(1);
            }
        }
    }
    count
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lattice_types::Cell;

    use super::*;

    fn world_with(height: usize, width: usize, cells: &[(usize, usize)]) -> World {
        let mut world = World::empty(height, width);
        for &(x, y) in cells {
            world.set(x, y, ALIVE).unwrap();
        }
        world
    }

    fn cells(coords: &[(usize, usize)]) -> Vec<Cell> {
        coords.iter().map(|&(x, y)| Cell { x, y }).collect()
    }

    #[test]
    fn empty_world_stays_empty() {
        let world = World::empty(8, 8);
        assert_eq!(step_turn(&world).alive_count(), 0);
    }

    #[test]
    fn isolated_cell_dies() {
        let world = world_with(16, 16, &[(7, 7)]);
        let after = evolve(world, 2);
        assert_eq!(after.alive_count(), 0);
    }

    #[test]
    fn block_is_a_still_life() {
        let world = world_with(6, 6, &[(2, 2), (3, 2), (2, 3), (3, 3)]);
        assert_eq!(step_turn(&world), world);
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let horizontal = world_with(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let vertical = step_turn(&horizontal);
        assert_eq!(
            vertical.alive_cells(),
            cells(&[(2, 1), (2, 2), (2, 3)])
        );
        assert_eq!(step_turn(&vertical), horizontal);
    }

    #[test]
    fn glider_advances_one_phase() {
        let glider = world_with(8, 8, &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let next = step_turn(&glider);
        assert_eq!(
            next.alive_cells(),
            cells(&[(0, 1), (2, 1), (1, 2), (2, 2), (1, 3)])
        );
    }

    #[test]
    fn glider_translates_one_diagonal_step_every_four_turns() {
        let glider = world_with(8, 8, &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let after = evolve(glider, 4);
        assert_eq!(
            after.alive_cells(),
            cells(&[(2, 1), (3, 2), (1, 3), (2, 3), (3, 3)])
        );
    }

    #[test]
    fn corners_form_a_block_across_the_torus_seam() {
        // Three corner cells are mutual neighbors under wraparound; the
        // fourth corner is born, completing a still block.
        let world = world_with(4, 4, &[(0, 0), (3, 0), (0, 3)]);
        let after = step_turn(&world);
        assert_eq!(
            after.alive_cells(),
            cells(&[(0, 0), (3, 0), (0, 3), (3, 3)])
        );
        assert_eq!(step_turn(&after), after);
    }
}
