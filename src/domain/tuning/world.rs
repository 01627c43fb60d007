use crate::domain::state::ItemType;

/// Gameplay tuning for world generation.

#[derive(Debug, Clone)]
pub struct WorldTuning {
    /// Ground items spawned when a session starts (kind, x, y).
    pub initial_items: Vec<(ItemType, f32, f32)>,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            initial_items: vec![
                (ItemType::Fireball, 300.0, 300.0),
                (ItemType::Fireball, -450.0, 120.0),
                (ItemType::HealingPotion, 500.0, -250.0),
                (ItemType::HealingPotion, -200.0, -400.0),
                (ItemType::Coin, 100.0, 100.0),
                (ItemType::Coin, 140.0, 100.0),
                (ItemType::Coin, 180.0, 100.0),
            ],
        }
    }
}
