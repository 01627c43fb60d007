use crate::domain::state::PlayerId;

/// Opaque handle to a physics body owned by the hit-box provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitBoxHandle(pub u64);

// Port for the physics collaborator. The core writes positions and never reads them back.
pub trait HitBoxProvider: Send {
    fn create_hit_box(&mut self, player_id: PlayerId, x: f32, y: f32) -> HitBoxHandle;
    fn set_position(&mut self, handle: HitBoxHandle, x: f32, y: f32);
    fn remove_hit_box(&mut self, handle: HitBoxHandle);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{HitBoxHandle, HitBoxProvider};
    use crate::domain::state::PlayerId;

    // Hit-box fake that records every call; handles reuse the player id.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingHitBoxes {
        created: Vec<(PlayerId, f32, f32)>,
        positions: Vec<(HitBoxHandle, f32, f32)>,
        removed: Vec<HitBoxHandle>,
    }

    impl RecordingHitBoxes {
        pub(crate) fn created(&self) -> Vec<(PlayerId, f32, f32)> {
            self.created.clone()
        }

        pub(crate) fn positions(&self) -> Vec<(HitBoxHandle, f32, f32)> {
            self.positions.clone()
        }

        pub(crate) fn removed(&self) -> Vec<HitBoxHandle> {
            self.removed.clone()
        }
    }

    impl HitBoxProvider for RecordingHitBoxes {
        fn create_hit_box(&mut self, player_id: PlayerId, x: f32, y: f32) -> HitBoxHandle {
            self.created.push((player_id, x, y));
            HitBoxHandle(player_id)
        }

        fn set_position(&mut self, handle: HitBoxHandle, x: f32, y: f32) {
            self.positions.push((handle, x, y));
        }

        fn remove_hit_box(&mut self, handle: HitBoxHandle) {
            self.removed.push(handle);
        }
    }
}
