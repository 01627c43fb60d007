use crate::domain::ports::HitBoxProvider;
use crate::domain::state::{MovementIntent, Player};
use crate::domain::tuning::player::PlayerTuning;

/// Converts held movement keys into a one-tick position delta.
///
/// Diagonals are checked first, in a fixed order: left+up, left+down, right+up, right+down.
/// The first match moves both axes by the diagonal step. Otherwise every held key
/// contributes a full step and the contributions are summed, so opposing keys cancel.
/// Up is +y.
pub fn resolve_step(intent: MovementIntent, tuning: &PlayerTuning) -> (i32, i32) {
    let step = tuning.step;
    let diagonal = tuning.diagonal_step();

    let MovementIntent {
        left,
        right,
        up,
        down,
    } = intent;

    if left && up {
        (-diagonal, diagonal)
    } else if left && down {
        (-diagonal, -diagonal)
    } else if right && up {
        (diagonal, diagonal)
    } else if right && down {
        (diagonal, -diagonal)
    } else {
        single_axis_step(intent, step)
    }
}

fn single_axis_step(intent: MovementIntent, step: i32) -> (i32, i32) {
    let mut dx = 0;
    let mut dy = 0;
    if intent.left {
        dx -= step;
    }
    if intent.right {
        dx += step;
    }
    if intent.up {
        dy += step;
    }
    if intent.down {
        dy -= step;
    }
    (dx, dy)
}

/// Integrates one tick of movement and mirrors the result into the player's hit-box.
///
/// Returns true if the position changed.
pub fn tick_player(
    player: &mut Player,
    tuning: &PlayerTuning,
    hit_boxes: &mut dyn HitBoxProvider,
) -> bool {
    let (dx, dy) = resolve_step(player.movement, tuning);
    if dx == 0 && dy == 0 {
        return false;
    }

    player.x += dx;
    player.y += dy;

    if let Some(handle) = player.hit_box {
        let (off_x, off_y) = tuning.hit_box_offset;
        hit_boxes.set_position(handle, player.x as f32 + off_x, player.y as f32 + off_y);
    }
    true
}
