// Domain-level entities shared by the server world and client replicas.

use crate::domain::inventory::Inventory;
use crate::domain::ports::HitBoxHandle;
use crate::domain::tuning::player::PlayerTuning;

pub type PlayerId = u64;
pub type ItemId = u64;

/// Closed set of item classifications carried by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Fireball,
    Coin,
    HealingPotion,
}

impl ItemType {
    /// Opaque lookup key handed to the texture/asset collaborator.
    pub fn asset_key(self) -> &'static str {
        match self {
            ItemType::Fireball => "fireball_book",
            ItemType::Coin => "coin",
            ItemType::HealingPotion => "healing_potion",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemType,
    // Ground coordinates; stale while the item sits in an inventory.
    pub x: f32,
    pub y: f32,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemType, x: f32, y: f32) -> Self {
        Self { id, kind, x, y }
    }
}

/// Held movement keys, one flag per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Last pointer snapshot received for a player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerIntent {
    pub x: f32,
    pub y: f32,
    pub left_click: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub x: i32,
    pub y: i32,

    // Vitals. Health has no floor here; see `is_eliminated`.
    pub health: i32,
    pub mana: f32,

    pub movement: MovementIntent,
    pub pointer: PointerIntent,
    pub inventory: Inventory,

    // Physics body owned by the hit-box provider; we only push positions into it.
    pub hit_box: Option<HitBoxHandle>,
}

impl Player {
    pub fn new(id: PlayerId, tuning: &PlayerTuning) -> Self {
        Self {
            id,
            x: 0,
            y: 0,
            health: tuning.max_health,
            mana: tuning.max_mana,
            movement: MovementIntent::default(),
            pointer: PointerIntent::default(),
            inventory: Inventory::default(),
            hit_box: None,
        }
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Non-positive health is only a signal; removal is driven by Leave.
    pub fn is_eliminated(&self) -> bool {
        self.health <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_player_is_created_then_it_starts_at_origin_with_full_vitals() {
        let tuning = PlayerTuning::default();
        let player = Player::new(7, &tuning);

        assert_eq!((player.x, player.y), (0, 0));
        assert_eq!(player.health, 100);
        assert_eq!(player.mana, 100.0);
        assert_eq!(player.inventory.selected_slot(), 0);
        assert!(player.inventory.items().next().is_none());
        assert_eq!(player.movement, MovementIntent::default());
        assert!(player.hit_box.is_none());
    }

    #[test]
    fn when_health_drops_to_zero_then_player_reports_eliminated() {
        let mut player = Player::new(1, &PlayerTuning::default());
        assert!(!player.is_eliminated());

        player.health = 0;
        assert!(player.is_eliminated());

        // No floor is enforced.
        player.health = -15;
        assert!(player.is_eliminated());
    }

    #[test]
    fn each_item_type_has_a_distinct_asset_key() {
        let keys = [
            ItemType::Fireball.asset_key(),
            ItemType::Coin.asset_key(),
            ItemType::HealingPotion.asset_key(),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
    }
}
