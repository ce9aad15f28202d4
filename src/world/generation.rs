use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::items::{ItemId, ItemPlacements};
use crate::rng::{WorldRng, normalize_seed};
use crate::world::grid::Grid;
use crate::world::island::generate_island;
use crate::world::region::{Region, RegionKind};
use crate::world::{Coord, WorldState};

/// Fixed world edge length.
pub const WORLD_SIZE: usize = 24;

/// Spawn point and raft are confined to `[SPAWN_MARGIN, size - SPAWN_MARGIN)`.
const SPAWN_MARGIN: usize = 6;
/// The remaining items are scattered in `[ITEM_MARGIN, size - ITEM_MARGIN)`.
const ITEM_MARGIN: usize = 3;

/// Tier band edges: Chebyshev distance above each edge raises the tier.
const TIER_BANDS: [usize; 3] = [4, 8, 12];

/// Default cap on rejection-sampling attempts for spawn and item cells.
pub const DEFAULT_MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

/// Errors from the bounded placement loops. Generation is otherwise pure
/// and cannot fail.
#[derive(Debug)]
pub enum GenerationError {
    SpawnSearchExhausted { attempts: u32 },
    ItemPlacementExhausted { item: ItemId, attempts: u32 },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::SpawnSearchExhausted { attempts } => {
                write!(f, "no land spawn cell found after {} attempts", attempts)
            }
            GenerationError::ItemPlacementExhausted { item, attempts } => {
                write!(
                    f,
                    "no valid cell for {} after {} attempts",
                    item.name(),
                    attempts
                )
            }
        }
    }
}

impl std::error::Error for GenerationError {}

/// Generate a world from an optional seed.
///
/// The seed is normalized first (an unusable one is silently replaced, see
/// [`normalize_seed`]). Stages run in a fixed order and share one random
/// source, so a given seed always produces the same world; reordering the
/// stages would change every world even for identical seeds.
pub fn generate_world(
    seed: Option<&str>,
    max_placement_attempts: u32,
) -> Result<WorldState, GenerationError> {
    let seed = normalize_seed(seed);
    let mut rng = WorldRng::from_seed_str(&seed);

    let island = generate_island(WORLD_SIZE, &mut rng);
    let spawn = select_spawn_point(&island, &mut rng, max_placement_attempts)?;
    let tiers = compute_tiers(WORLD_SIZE, spawn);
    let biomes = assign_biomes(&island, &tiers, spawn);
    let items = place_items(&island, &tiers, spawn, &mut rng, max_placement_attempts)?;

    Ok(WorldState::assemble(
        seed, island, spawn, tiers, biomes, items, rng,
    ))
}

/// Draw `(row, col)` candidates in `[lo, hi]²` until one passes `accept`.
fn try_place<F>(
    rng: &mut WorldRng,
    lo: usize,
    hi: usize,
    max_attempts: u32,
    mut accept: F,
) -> Option<Coord>
where
    F: FnMut(Coord) -> bool,
{
    for _ in 0..max_attempts {
        let row = rng.next_int(lo, hi);
        let col = rng.next_int(lo, hi);
        let coord = Coord { row, col };
        if accept(coord) {
            return Some(coord);
        }
    }
    None
}

/// Pick the spawn point: the first land cell drawn from the inner region.
fn select_spawn_point(
    island: &Grid<bool>,
    rng: &mut WorldRng,
    max_attempts: u32,
) -> Result<Coord, GenerationError> {
    let hi = island.size() - SPAWN_MARGIN - 1;
    try_place(rng, SPAWN_MARGIN, hi, max_attempts, |coord| {
        !island[(coord.row, coord.col)]
    })
    .ok_or(GenerationError::SpawnSearchExhausted {
        attempts: max_attempts,
    })
}

/// Band every cell by Chebyshev distance from the spawn point:
/// tier 3 beyond 12, 2 beyond 8, 1 beyond 4, else 0.
fn compute_tiers(size: usize, spawn: Coord) -> Grid<u8> {
    let mut tiers = Grid::filled(size, 0u8);
    for row in 0..size {
        for col in 0..size {
            let distance = Coord { row, col }.chebyshev_distance(spawn);
            let tier = TIER_BANDS.iter().filter(|&&edge| distance > edge).count();
            tiers[(row, col)] = tier as u8;
        }
    }
    tiers
}

/// Assign a biome to every cell.
///
/// The spawn cell is always Spawn and water is always Water, whatever the
/// surrounding computation says. Land splits by tier, and above tier 0 by
/// horizontal half: west gets Plateau/Mountains/Snow, east gets
/// Forest/Jungle/Desert.
fn assign_biomes(island: &Grid<bool>, tiers: &Grid<u8>, spawn: Coord) -> Grid<Region> {
    let size = island.size();
    let mut biomes = Grid::filled(size, Region::spawn());
    for row in 0..size {
        for col in 0..size {
            let tier = tiers[(row, col)];
            let region = if (Coord { row, col }) == spawn {
                Region::spawn()
            } else if island[(row, col)] {
                Region::new(RegionKind::Water, tier)
            } else {
                let west = col < size / 2;
                let kind = match (tier, west) {
                    (0, _) => RegionKind::Grassland,
                    (1, true) => RegionKind::Plateau,
                    (1, false) => RegionKind::Forest,
                    (2, true) => RegionKind::Mountains,
                    (2, false) => RegionKind::Jungle,
                    (_, true) => RegionKind::Snow,
                    (_, false) => RegionKind::Desert,
                };
                Region::new(kind, tier)
            };
            biomes[(row, col)] = region;
        }
    }
    biomes
}

/// Land cells reachable from `start` without crossing water, stepping
/// through 4-neighbours.
fn land_reachable_from(island: &Grid<bool>, start: Coord) -> HashSet<Coord> {
    let size = island.size();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    if island[(start.row, start.col)] {
        return seen;
    }
    seen.insert(start);
    queue.push_back(start);
    while let Some(coord) = queue.pop_front() {
        let row = coord.row as isize;
        let col = coord.col as isize;
        for (dr, dc) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
            let (r, c) = (row + dr, col + dc);
            if r < 0 || c < 0 || r >= size as isize || c >= size as isize {
                continue;
            }
            let next = Coord {
                row: r as usize,
                col: c as usize,
            };
            if !island[(next.row, next.col)] && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Scatter the item catalog.
///
/// The raft goes first: a land, tier-0, non-spawn cell in the spawn's
/// inner region, reachable from the spawn on foot. The four usable items
/// follow in catalog order, anywhere in the wider inner region that is
/// not already occupied by another item.
fn place_items(
    island: &Grid<bool>,
    tiers: &Grid<u8>,
    spawn: Coord,
    rng: &mut WorldRng,
    max_attempts: u32,
) -> Result<ItemPlacements, GenerationError> {
    let size = island.size();
    let mut placements = ItemPlacements::empty();

    let reachable = land_reachable_from(island, spawn);
    let raft_cell = try_place(
        rng,
        SPAWN_MARGIN,
        size - SPAWN_MARGIN - 1,
        max_attempts,
        |coord| {
            !island[(coord.row, coord.col)]
                && tiers[(coord.row, coord.col)] == 0
                && coord != spawn
                && reachable.contains(&coord)
        },
    )
    .ok_or(GenerationError::ItemPlacementExhausted {
        item: ItemId::Raft,
        attempts: max_attempts,
    })?;
    placements.place(ItemId::Raft, raft_cell);

    for item in ItemId::ALL.into_iter().filter(|item| !item.is_special()) {
        let cell = try_place(
            rng,
            ITEM_MARGIN,
            size - ITEM_MARGIN - 1,
            max_attempts,
            |coord| !placements.is_occupied(coord),
        )
        .ok_or(GenerationError::ItemPlacementExhausted {
            item,
            attempts: max_attempts,
        })?;
        placements.place(item, cell);
    }

    Ok(placements)
}

/// Render the three debug map layers as stacked character grids:
/// land/water (`#`/`.`), tier digits, biome codes. The spawn cell shows
/// as `X` in the first two layers and as the Spawn glyph in the third.
pub fn render_map_layers(world: &WorldState) -> String {
    let size = world.island_grid().size();
    let spawn = world.spawn_point();
    let mut out = String::with_capacity(3 * size * (size + 1));

    for row in 0..size {
        for col in 0..size {
            out.push(if (Coord { row, col }) == spawn {
                'X'
            } else if world.island_grid()[(row, col)] {
                '.'
            } else {
                '#'
            });
        }
        out.push('\n');
    }

    for row in 0..size {
        for col in 0..size {
            out.push(if (Coord { row, col }) == spawn {
                'X'
            } else {
                char::from(b'0' + world.tier_grid()[(row, col)])
            });
        }
        out.push('\n');
    }

    for row in 0..size {
        for col in 0..size {
            let glyph = world
                .get_region(row, col)
                .map(|region| region.kind.glyph())
                .unwrap_or(' ');
            out.push(glyph);
        }
        out.push('\n');
    }

    out
}

/// Print a summary of the generated world.
pub fn print_world_summary(world: &WorldState) {
    println!("=== World Summary ===");
    println!("Seed: {}", world.seed());
    let spawn = world.spawn_point();
    println!("Spawn: ({}, {})", spawn.row, spawn.col);

    let size = world.island_grid().size();
    let water = world.island_grid().iter().filter(|&(_, _, &w)| w).count();
    let total = size * size;
    println!(
        "Water: {} of {} cells ({:.1}%)",
        water,
        total,
        water as f32 / total as f32 * 100.0
    );

    let mut counts: Vec<(&str, u32)> = Vec::new();
    for (row, col, _) in world.island_grid().iter() {
        if let Some(region) = world.get_region(row, col) {
            let name = match region.kind {
                RegionKind::Spawn => "Spawn",
                RegionKind::Water => "Water",
                RegionKind::Grassland => "Grassland",
                RegionKind::Forest => "Forest",
                RegionKind::Plateau => "Plateau",
                RegionKind::Jungle => "Jungle",
                RegionKind::Mountains => "Mountains",
                RegionKind::Desert => "Desert",
                RegionKind::Snow => "Snow",
            };
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        }
    }
    counts.sort_by_key(|&(name, _)| name);
    println!("\nRegions:");
    for (name, count) in &counts {
        let pct = *count as f32 / total as f32 * 100.0;
        println!("  {:<12} {:>4} ({:.1}%)", name, count, pct);
    }

    println!("\nItems:");
    for (item, coord) in world.item_placements().placed() {
        println!("  {:<20} ({}, {})", item.name(), coord.row, coord.col);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "dragon000000000001";

    fn test_world() -> WorldState {
        generate_world(Some(SEED), DEFAULT_MAX_PLACEMENT_ATTEMPTS).expect("world generates")
    }

    #[test]
    fn generation_is_deterministic() {
        let a = test_world();
        let b = test_world();
        assert_eq!(a.seed(), b.seed());
        assert_eq!(a.spawn_point(), b.spawn_point());
        assert_eq!(a.island_grid(), b.island_grid());
        assert_eq!(a.tier_grid(), b.tier_grid());
        assert_eq!(a.item_placements(), b.item_placements());
        for row in 0..WORLD_SIZE {
            for col in 0..WORLD_SIZE {
                assert_eq!(
                    a.get_region(row, col),
                    b.get_region(row, col),
                    "Region mismatch at ({}, {})",
                    row,
                    col
                );
            }
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = test_world();
        let b = generate_world(Some("dragon000000000002"), DEFAULT_MAX_PLACEMENT_ATTEMPTS)
            .expect("world generates");
        assert_ne!(a.island_grid(), b.island_grid());
    }

    #[test]
    fn spawn_is_inner_land() {
        let world = test_world();
        let spawn = world.spawn_point();
        assert!((SPAWN_MARGIN..WORLD_SIZE - SPAWN_MARGIN).contains(&spawn.row));
        assert!((SPAWN_MARGIN..WORLD_SIZE - SPAWN_MARGIN).contains(&spawn.col));
        assert!(!world.island_grid()[(spawn.row, spawn.col)], "Spawn on water");
    }

    #[test]
    fn spawn_biome_is_always_spawn() {
        let world = test_world();
        let spawn = world.spawn_point();
        let region = world.get_region(spawn.row, spawn.col).unwrap();
        assert_eq!(region.kind, RegionKind::Spawn);
        assert_eq!(region.tier, 0);
    }

    #[test]
    fn tiers_follow_chebyshev_bands() {
        let world = test_world();
        let spawn = world.spawn_point();
        for row in 0..WORLD_SIZE {
            for col in 0..WORLD_SIZE {
                let distance = Coord { row, col }.chebyshev_distance(spawn);
                let expected = if distance > 12 {
                    3
                } else if distance > 8 {
                    2
                } else if distance > 4 {
                    1
                } else {
                    0
                };
                assert_eq!(
                    world.tier_grid()[(row, col)],
                    expected,
                    "Tier mismatch at ({}, {}), distance {}",
                    row,
                    col,
                    distance
                );
            }
        }
    }

    #[test]
    fn tier_is_monotonic_in_distance() {
        let world = test_world();
        let spawn = world.spawn_point();
        let mut band_max: [usize; 4] = [0; 4];
        let mut band_min: [usize; 4] = [usize::MAX; 4];
        for (row, col, &tier) in world.tier_grid().iter() {
            let d = Coord { row, col }.chebyshev_distance(spawn);
            let t = tier as usize;
            band_max[t] = band_max[t].max(d);
            band_min[t] = band_min[t].min(d);
        }
        for t in 0..3 {
            if band_min[t + 1] != usize::MAX {
                assert!(
                    band_max[t] < band_min[t + 1],
                    "Tier {} reaches distance {} but tier {} starts at {}",
                    t,
                    band_max[t],
                    t + 1,
                    band_min[t + 1]
                );
            }
        }
    }

    #[test]
    fn biomes_match_terrain_and_half() {
        let world = test_world();
        let spawn = world.spawn_point();
        for row in 0..WORLD_SIZE {
            for col in 0..WORLD_SIZE {
                if (Coord { row, col }) == spawn {
                    continue;
                }
                let region = world.get_region(row, col).unwrap();
                let tier = world.tier_grid()[(row, col)];
                assert_eq!(region.tier, tier);
                if world.island_grid()[(row, col)] {
                    assert_eq!(region.kind, RegionKind::Water);
                    continue;
                }
                let west = col < WORLD_SIZE / 2;
                let expected = match (tier, west) {
                    (0, _) => RegionKind::Grassland,
                    (1, true) => RegionKind::Plateau,
                    (1, false) => RegionKind::Forest,
                    (2, true) => RegionKind::Mountains,
                    (2, false) => RegionKind::Jungle,
                    (_, true) => RegionKind::Snow,
                    (_, false) => RegionKind::Desert,
                };
                assert_eq!(
                    region.kind, expected,
                    "Biome mismatch at ({}, {})",
                    row, col
                );
            }
        }
    }

    #[test]
    fn all_items_placed_without_collisions() {
        let world = test_world();
        let placed: Vec<(ItemId, Coord)> = world.item_placements().placed().collect();
        assert_eq!(placed.len(), ItemId::ALL.len());
        let coords: HashSet<Coord> = placed.iter().map(|&(_, c)| c).collect();
        assert_eq!(coords.len(), placed.len(), "Two items share a cell");
    }

    #[test]
    fn raft_sits_on_reachable_tier_zero_land() {
        let world = test_world();
        let spawn = world.spawn_point();
        let raft = world
            .item_placements()
            .position(ItemId::Raft)
            .expect("raft placed");
        assert!(!world.island_grid()[(raft.row, raft.col)], "Raft on water");
        assert_eq!(world.tier_grid()[(raft.row, raft.col)], 0);
        assert_ne!(raft, spawn);
        assert!((SPAWN_MARGIN..WORLD_SIZE - SPAWN_MARGIN).contains(&raft.row));
        assert!((SPAWN_MARGIN..WORLD_SIZE - SPAWN_MARGIN).contains(&raft.col));
        let reachable = land_reachable_from(world.island_grid(), spawn);
        assert!(reachable.contains(&raft), "Raft cut off by water");
    }

    #[test]
    fn usable_items_stay_in_wider_inner_region() {
        let world = test_world();
        for (item, coord) in world.item_placements().placed() {
            if item == ItemId::Raft {
                continue;
            }
            assert!(
                (ITEM_MARGIN..WORLD_SIZE - ITEM_MARGIN).contains(&coord.row),
                "{} row out of region: {}",
                item.name(),
                coord.row
            );
            assert!(
                (ITEM_MARGIN..WORLD_SIZE - ITEM_MARGIN).contains(&coord.col),
                "{} col out of region: {}",
                item.name(),
                coord.col
            );
        }
    }

    #[test]
    fn spawn_search_exhausts_on_all_water_island() {
        let all_water = Grid::filled(WORLD_SIZE, true);
        let mut rng = WorldRng::from_seed_str(SEED);
        let err = select_spawn_point(&all_water, &mut rng, 50).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::SpawnSearchExhausted { attempts: 50 }
        ));
    }

    #[test]
    fn raft_placement_exhausts_without_free_land() {
        // Only the spawn cell is land, so the raft has nowhere to go.
        let mut island = Grid::filled(WORLD_SIZE, true);
        let spawn = Coord { row: 12, col: 12 };
        island[(spawn.row, spawn.col)] = false;
        let tiers = compute_tiers(WORLD_SIZE, spawn);
        let mut rng = WorldRng::from_seed_str(SEED);
        let err = place_items(&island, &tiers, spawn, &mut rng, 50).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ItemPlacementExhausted {
                item: ItemId::Raft,
                attempts: 50
            }
        ));
    }

    #[test]
    fn reachability_stops_at_water() {
        // Land on the left edge, a water column, land on the right edge.
        let mut island = Grid::filled(5, true);
        for row in 0..5 {
            island[(row, 0)] = false;
            island[(row, 4)] = false;
        }
        let reachable = land_reachable_from(&island, Coord { row: 2, col: 0 });
        assert_eq!(reachable.len(), 5);
        assert!(reachable.contains(&Coord { row: 0, col: 0 }));
        assert!(!reachable.contains(&Coord { row: 2, col: 4 }));
    }

    #[test]
    fn map_dump_has_three_full_layers() {
        let world = test_world();
        let dump = render_map_layers(&world);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3 * WORLD_SIZE);
        for line in &lines {
            assert_eq!(line.len(), WORLD_SIZE);
        }

        let island_layer = &lines[..WORLD_SIZE];
        let tier_layer = &lines[WORLD_SIZE..2 * WORLD_SIZE];
        let biome_layer = &lines[2 * WORLD_SIZE..];

        let x_count: usize = island_layer
            .iter()
            .map(|l| l.matches('X').count())
            .sum();
        assert_eq!(x_count, 1, "Exactly one spawn marker in the island layer");
        assert!(island_layer.iter().all(|l| {
            l.chars().all(|c| matches!(c, '#' | '.' | 'X'))
        }));
        assert!(tier_layer.iter().all(|l| {
            l.chars().all(|c| matches!(c, '0'..='3' | 'X'))
        }));
        assert!(biome_layer.iter().all(|l| {
            l.chars()
                .all(|c| "*~GPFMJSD".contains(c))
        }));
        assert_eq!(
            biome_layer
                .iter()
                .map(|l| l.matches('*').count())
                .sum::<usize>(),
            1,
            "Exactly one Spawn cell in the biome layer"
        );
    }

    #[test]
    fn dump_layers_agree_on_spawn_position() {
        let world = test_world();
        let spawn = world.spawn_point();
        let dump = render_map_layers(&world);
        let lines: Vec<&str> = dump.lines().collect();
        let island_row: Vec<char> = lines[spawn.row].chars().collect();
        assert_eq!(island_row[spawn.col], 'X');
        let tier_row: Vec<char> = lines[WORLD_SIZE + spawn.row].chars().collect();
        assert_eq!(tier_row[spawn.col], 'X');
        let biome_row: Vec<char> = lines[2 * WORLD_SIZE + spawn.row].chars().collect();
        assert_eq!(biome_row[spawn.col], '*');
    }

    #[test]
    fn unusable_seed_still_generates() {
        let world = generate_world(Some("ab"), DEFAULT_MAX_PLACEMENT_ATTEMPTS)
            .expect("world generates");
        assert_ne!(world.seed(), "ab");
        assert!(world.seed().len() >= 6);
    }
}
