// Per-peer world snapshot: live players and the items lying on the ground.

use crate::domain::state::{Item, ItemId, Player, PlayerId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub players: HashMap<PlayerId, Player>,
    // Ground items only; held items are reachable through their owner.
    pub ground_items: HashMap<ItemId, Item>,
}

impl WorldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&player_id)
    }

    pub fn ground_item(&self, item_id: ItemId) -> Option<&Item> {
        self.ground_items.get(&item_id)
    }

    /// Player currently holding `item_id`, if any.
    pub fn holder_of(&self, item_id: ItemId) -> Option<PlayerId> {
        self.players
            .values()
            .find(|player| player.inventory.contains(item_id))
            .map(|player| player.id)
    }

    /// True if the id is on the ground or in any inventory.
    pub fn item_exists(&self, item_id: ItemId) -> bool {
        self.ground_items.contains_key(&item_id) || self.holder_of(item_id).is_some()
    }

    /// Returns the first item id found in more than one location, if any.
    pub fn check_item_locations(&self) -> Option<ItemId> {
        let mut seen: HashSet<ItemId> = self.ground_items.keys().copied().collect();
        self.players
            .values()
            .flat_map(|player| player.inventory.items())
            .map(|item| item.id)
            .find(|id| !seen.insert(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::ItemType;
    use crate::domain::tuning::player::PlayerTuning;

    #[test]
    fn when_item_is_both_held_and_on_ground_then_check_reports_it() {
        let mut world = WorldSnapshot::new();
        let mut player = Player::new(1, &PlayerTuning::default());
        player.inventory.pick_up(Item::new(42, ItemType::Coin, 0.0, 0.0));
        world.players.insert(1, player);
        assert_eq!(world.check_item_locations(), None);

        world
            .ground_items
            .insert(42, Item::new(42, ItemType::Coin, 0.0, 0.0));

        assert_eq!(world.check_item_locations(), Some(42));
        assert_eq!(world.holder_of(42), Some(1));
        assert!(world.item_exists(42));
        assert!(!world.item_exists(43));
    }
}
