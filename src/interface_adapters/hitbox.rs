// In-memory hit-box provider used by the headless server.
// A physics engine would plug in here through the same port.

use crate::domain::{HitBoxHandle, HitBoxProvider, PlayerId};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitBox {
    pub player_id: PlayerId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Default)]
pub struct HitBoxTable {
    next_handle: u64,
    boxes: HashMap<HitBoxHandle, HitBox>,
}

impl HitBoxTable {
    pub fn get(&self, handle: HitBoxHandle) -> Option<&HitBox> {
        self.boxes.get(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl HitBoxProvider for HitBoxTable {
    fn create_hit_box(&mut self, player_id: PlayerId, x: f32, y: f32) -> HitBoxHandle {
        self.next_handle += 1;
        let handle = HitBoxHandle(self.next_handle);
        self.boxes.insert(handle, HitBox { player_id, x, y });
        handle
    }

    fn set_position(&mut self, handle: HitBoxHandle, x: f32, y: f32) {
        match self.boxes.get_mut(&handle) {
            Some(hit_box) => {
                hit_box.x = x;
                hit_box.y = y;
            }
            None => debug!(?handle, "position for unknown hit-box ignored"),
        }
    }

    fn remove_hit_box(&mut self, handle: HitBoxHandle) {
        self.boxes.remove(&handle);
    }
}
