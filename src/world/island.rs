//! Cellular-automaton island generator.
//!
//! Cells are `true` for water, `false` for land. Positions outside the
//! grid count as water neighbours, which pushes landmasses away from the
//! border over the simulation steps.

use crate::rng::WorldRng;
use crate::world::grid::Grid;

/// Probability that the initial noise pass floods a cell.
const NOISE_WATER_CHANCE: f64 = 0.4;
/// A water cell stays water with at least this many water neighbours.
const SURVIVE_THRESHOLD: u32 = 3;
/// A land cell floods with more than this many water neighbours.
const FLOOD_THRESHOLD: u32 = 4;

/// Number of simulation steps is drawn once from the shared source.
const STEPS_MIN: usize = 3;
const STEPS_MAX: usize = 5;

/// Run the automaton: noise pass, then [3,5] smoothing steps.
pub fn generate_island(size: usize, rng: &mut WorldRng) -> Grid<bool> {
    let steps = rng.next_int(STEPS_MIN, STEPS_MAX);
    let mut map = seed_noise(size, rng);
    for _ in 0..steps {
        map = step(&map);
    }
    map
}

fn seed_noise(size: usize, rng: &mut WorldRng) -> Grid<bool> {
    let mut grid = Grid::filled(size, false);
    for row in 0..size {
        for col in 0..size {
            if rng.next_f64() < NOISE_WATER_CHANCE {
                grid[(row, col)] = true;
            }
        }
    }
    grid
}

fn water_neighbours(grid: &Grid<bool>, row: usize, col: usize) -> u32 {
    let size = grid.size() as isize;
    let mut count = 0;
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let r = row as isize + dr;
            let c = col as isize + dc;
            if r < 0 || c < 0 || r >= size || c >= size {
                count += 1;
            } else if grid[(r as usize, c as usize)] {
                count += 1;
            }
        }
    }
    count
}

fn step(current: &Grid<bool>) -> Grid<bool> {
    let size = current.size();
    let mut next = Grid::filled(size, false);
    for row in 0..size {
        for col in 0..size {
            let neighbours = water_neighbours(current, row, col);
            next[(row, col)] = if current[(row, col)] {
                neighbours >= SURVIVE_THRESHOLD
            } else {
                neighbours > FLOOD_THRESHOLD
            };
        }
    }
    next
}
