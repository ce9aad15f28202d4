use crate::items::{Inventory, ItemId};
use crate::save::codec::SCORE_MAX;
use crate::world::Coord;

/// Longest player name the save format can hold.
pub const NAME_MAX_LEN: usize = 16;
/// Highest tier a player can reach.
pub const TIER_MAX: u8 = 3;

/// Player state operated on by the game session and the save codec.
///
/// `region` and `can_swim` are plain fields: collaborators mutate them
/// directly and they carry no derived invariants. Name, score and tier
/// are validated at construction time instead of on every access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    name: String,
    pub region: Coord,
    score: u32,
    tier: u8,
    pub can_swim: bool,
    pub inventory: Inventory,
}

impl Player {
    /// Create a fresh player standing at the spawn point.
    pub fn new(name: &str, spawn: Coord) -> Result<Self, String> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            region: spawn,
            score: 0,
            tier: 0,
            can_swim: false,
            inventory: Inventory::new(),
        })
    }

    /// Rebuild a player from decoded save fields. The codec has already
    /// range-checked position, score, tier and swim flag; the name is
    /// re-validated here so a `Player` can never hold an invalid one.
    pub fn from_save(
        name: &str,
        region: Coord,
        score: u32,
        tier: u8,
        can_swim: bool,
        active_items: &[ItemId],
    ) -> Result<Self, String> {
        validate_name(name)?;
        if score > SCORE_MAX {
            return Err(format!("score must be <= {}, got {}", SCORE_MAX, score));
        }
        if tier > TIER_MAX {
            return Err(format!("tier must be 0-{}, got {}", TIER_MAX, tier));
        }
        let mut inventory = Inventory::new();
        for &item in active_items {
            inventory.add(item);
        }
        Ok(Self {
            name: name.to_string(),
            region,
            score,
            tier,
            can_swim,
            inventory,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Add points, clamped to the save format's five-digit maximum.
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points).min(SCORE_MAX);
    }

    /// Deduct points; score never goes negative.
    pub fn deduct_score(&mut self, points: u32) {
        self.score = self.score.saturating_sub(points);
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn set_tier(&mut self, tier: u8) -> Result<(), String> {
        if tier > TIER_MAX {
            return Err(format!("tier must be 0-{}, got {}", TIER_MAX, tier));
        }
        self.tier = tier;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("player name must not be empty".to_string());
    }
    if name.len() > NAME_MAX_LEN {
        return Err(format!(
            "player name must be at most {} characters, got {}",
            NAME_MAX_LEN,
            name.len()
        ));
    }
    if !name.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return Err(format!("player name must be printable ASCII: {:?}", name));
    }
    Ok(())
}
