pub mod generation;
pub mod grid;
pub mod island;
pub mod region;

pub use generation::{GenerationError, WORLD_SIZE, generate_world, render_map_layers};
pub use grid::Grid;
pub use region::{Region, RegionKind};

use crate::items::{ItemId, ItemPlacements};
use crate::rng::WorldRng;

/// A `(row, col)` cell address, both in `[0, WORLD_SIZE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    /// Chessboard distance: the larger of the row and column deltas.
    pub fn chebyshev_distance(self, other: Coord) -> usize {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr.max(dc)
    }
}

/// The generated world a game session operates on.
///
/// Grids are immutable after construction; only item placements change
/// during play (entries are cleared as items are picked up). The random
/// source is the same instance that drove generation, kept for
/// collaborators that need world-consistent randomness.
#[derive(Debug, Clone)]
pub struct WorldState {
    seed: String,
    island: Grid<bool>,
    spawn: Coord,
    tiers: Grid<u8>,
    biomes: Grid<Region>,
    items: ItemPlacements,
    rng: WorldRng,
}

impl WorldState {
    pub(crate) fn assemble(
        seed: String,
        island: Grid<bool>,
        spawn: Coord,
        tiers: Grid<u8>,
        biomes: Grid<Region>,
        items: ItemPlacements,
        rng: WorldRng,
    ) -> Self {
        Self {
            seed,
            island,
            spawn,
            tiers,
            biomes,
            items,
            rng,
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn spawn_point(&self) -> Coord {
        self.spawn
    }

    /// Bounds-checked biome lookup; `None` for out-of-range coordinates.
    pub fn get_region(&self, row: usize, col: usize) -> Option<Region> {
        self.biomes.get(row, col).copied()
    }

    /// Read-only tier view.
    pub fn tier_grid(&self) -> &Grid<u8> {
        &self.tiers
    }

    /// Land/water view; `true` is water.
    pub fn island_grid(&self) -> &Grid<bool> {
        &self.island
    }

    /// The shared random source, for collaborators that scatter enemies
    /// or drops. Draws here advance the same sequence generation used.
    pub fn random_source(&mut self) -> &mut WorldRng {
        &mut self.rng
    }

    pub fn item_placements(&self) -> &ItemPlacements {
        &self.items
    }

    /// Pick up whatever item sits at `coord`, clearing its placement.
    pub fn take_item_at(&mut self, coord: Coord) -> Option<ItemId> {
        let item = self.items.item_at(coord)?;
        self.items.clear(item);
        Some(item)
    }

    /// Replace all placements with the entries decoded from a save file.
    pub(crate) fn apply_placements(&mut self, placements: &[(ItemId, Coord)]) {
        self.items.clear_all();
        for &(item, coord) in placements {
            self.items.place(item, coord);
        }
    }
}
