/// Gameplay tuning for player characters.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Distance travelled along one axis per tick while a key is held.
    pub step: i32,

    /// Health a player joins with.
    pub max_health: i32,

    /// Mana a player joins with.
    pub max_mana: f32,

    /// Offset between the player's position and the centre of its hit-box.
    pub hit_box_offset: (f32, f32),
}

impl PlayerTuning {
    /// Per-axis step for diagonal movement, truncated toward zero.
    pub fn diagonal_step(&self) -> i32 {
        (f64::from(self.step) / std::f64::consts::SQRT_2) as i32
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            step: 8,
            max_health: 100,
            max_mana: 100.0,
            hit_box_offset: (91.0, 70.0),
        }
    }
}
