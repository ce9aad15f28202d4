use crate::world::Coord;

/// Number of usable item slots a player can fill.
pub const ACTIVE_SLOTS: usize = 4;

/// Catalog of collectible items, addressed by their save-format key byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemId {
    InvincibilityPotion,
    LemonJuice,
    BowArrow,
    CannedJellyfish,
    Raft,
}

impl ItemId {
    /// Every catalog entry, in placement and save order.
    pub const ALL: [ItemId; 5] = [
        ItemId::InvincibilityPotion,
        ItemId::LemonJuice,
        ItemId::BowArrow,
        ItemId::CannedJellyfish,
        ItemId::Raft,
    ];

    /// One-byte discriminator stored in save files.
    pub fn key(self) -> u8 {
        match self {
            ItemId::InvincibilityPotion => 0xA0,
            ItemId::LemonJuice => 0xA1,
            ItemId::BowArrow => 0xA2,
            ItemId::CannedJellyfish => 0xA3,
            ItemId::Raft => 0xFE,
        }
    }

    pub fn from_key(key: u8) -> Option<ItemId> {
        match key {
            0xA0 => Some(ItemId::InvincibilityPotion),
            0xA1 => Some(ItemId::LemonJuice),
            0xA2 => Some(ItemId::BowArrow),
            0xA3 => Some(ItemId::CannedJellyfish),
            0xFE => Some(ItemId::Raft),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ItemId::InvincibilityPotion => "Invincibility Potion",
            ItemId::LemonJuice => "Lemon Juice",
            ItemId::BowArrow => "Bow and Arrow",
            ItemId::CannedJellyfish => "Canned Jellyfish",
            ItemId::Raft => "Raft",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ItemId::InvincibilityPotion => "Temporal immortality!",
            ItemId::LemonJuice => "Go faster!",
            ItemId::BowArrow => "Bullseye!",
            ItemId::CannedJellyfish => "Tastes superb!",
            ItemId::Raft => "Traverse the waters!",
        }
    }

    /// Special items grant a passive ability and never occupy an active
    /// slot.
    pub fn is_special(self) -> bool {
        matches!(self, ItemId::Raft)
    }

    fn index(self) -> usize {
        match self {
            ItemId::InvincibilityPotion => 0,
            ItemId::LemonJuice => 1,
            ItemId::BowArrow => 2,
            ItemId::CannedJellyfish => 3,
            ItemId::Raft => 4,
        }
    }
}

/// Where each catalog item sits on the map; `None` means unplaced
/// (not yet placed, or already picked up).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemPlacements {
    slots: [Option<Coord>; ItemId::ALL.len()],
}

impl ItemPlacements {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn place(&mut self, item: ItemId, coord: Coord) {
        self.slots[item.index()] = Some(coord);
    }

    pub fn position(&self, item: ItemId) -> Option<Coord> {
        self.slots[item.index()]
    }

    /// Mark an item unplaced, returning where it was.
    pub fn clear(&mut self, item: ItemId) -> Option<Coord> {
        self.slots[item.index()].take()
    }

    pub fn clear_all(&mut self) {
        self.slots = [None; ItemId::ALL.len()];
    }

    pub fn item_at(&self, coord: Coord) -> Option<ItemId> {
        ItemId::ALL
            .into_iter()
            .find(|item| self.slots[item.index()] == Some(coord))
    }

    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.item_at(coord).is_some()
    }

    /// Placed items in catalog order.
    pub fn placed(&self) -> impl Iterator<Item = (ItemId, Coord)> + '_ {
        ItemId::ALL
            .into_iter()
            .filter_map(|item| self.slots[item.index()].map(|coord| (item, coord)))
    }
}

/// A player's items: everything collected, plus the ordered active list
/// usable from numbered slots. Insertion order is slot order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inventory {
    items: Vec<ItemId>,
    active: Vec<ItemId>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. Usable items also join the active list while slots
    /// remain; special items never do.
    pub fn add(&mut self, item: ItemId) {
        self.items.push(item);
        if !item.is_special() && self.active.len() < ACTIVE_SLOTS {
            self.active.push(item);
        }
    }

    pub fn has(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn active(&self) -> &[ItemId] {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trip_for_whole_catalog() {
        for item in ItemId::ALL {
            assert_eq!(ItemId::from_key(item.key()), Some(item));
        }
    }

    #[test]
    fn unknown_keys_are_not_in_catalog() {
        assert_eq!(ItemId::from_key(0x00), None);
        assert_eq!(ItemId::from_key(0xA4), None);
        assert_eq!(ItemId::from_key(0xFF), None);
    }

    #[test]
    fn only_the_raft_is_special() {
        for item in ItemId::ALL {
            assert_eq!(item.is_special(), item == ItemId::Raft);
        }
    }

    #[test]
    fn placements_start_unplaced() {
        let placements = ItemPlacements::empty();
        for item in ItemId::ALL {
            assert_eq!(placements.position(item), None);
        }
        assert_eq!(placements.placed().count(), 0);
    }

    #[test]
    fn place_and_clear() {
        let mut placements = ItemPlacements::empty();
        let coord = Coord { row: 5, col: 9 };
        placements.place(ItemId::Raft, coord);
        assert_eq!(placements.position(ItemId::Raft), Some(coord));
        assert_eq!(placements.item_at(coord), Some(ItemId::Raft));
        assert!(placements.is_occupied(coord));

        assert_eq!(placements.clear(ItemId::Raft), Some(coord));
        assert_eq!(placements.position(ItemId::Raft), None);
        assert!(!placements.is_occupied(coord));
    }

    #[test]
    fn placed_iterates_in_catalog_order() {
        let mut placements = ItemPlacements::empty();
        placements.place(ItemId::Raft, Coord { row: 1, col: 1 });
        placements.place(ItemId::LemonJuice, Coord { row: 2, col: 2 });
        let placed: Vec<ItemId> = placements.placed().map(|(item, _)| item).collect();
        assert_eq!(placed, vec![ItemId::LemonJuice, ItemId::Raft]);
    }

    #[test]
    fn inventory_actives_exclude_special_items() {
        let mut inv = Inventory::new();
        inv.add(ItemId::Raft);
        inv.add(ItemId::LemonJuice);
        assert!(inv.has(ItemId::Raft));
        assert_eq!(inv.active(), &[ItemId::LemonJuice]);
    }

    #[test]
    fn inventory_active_list_caps_at_four() {
        let mut inv = Inventory::new();
        inv.add(ItemId::InvincibilityPotion);
        inv.add(ItemId::LemonJuice);
        inv.add(ItemId::BowArrow);
        inv.add(ItemId::CannedJellyfish);
        inv.add(ItemId::InvincibilityPotion);
        assert_eq!(inv.active().len(), ACTIVE_SLOTS);
        assert_eq!(inv.items().len(), 5);
    }

    #[test]
    fn active_order_is_insertion_order() {
        let mut inv = Inventory::new();
        inv.add(ItemId::BowArrow);
        inv.add(ItemId::LemonJuice);
        assert_eq!(inv.active(), &[ItemId::BowArrow, ItemId::LemonJuice]);
    }
}
