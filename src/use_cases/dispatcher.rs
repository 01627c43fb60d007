// Routes one sync message to the matching entity mutation on a world snapshot.

use crate::domain::tuning::player::PlayerTuning;
use crate::domain::{
    Item, KeyAction, PickupOutcome, Player, PlayerId, SyncError, SyncMessage, WorldSnapshot,
};
use tracing::warn;

/// What to do with a claimed item when the claimant's selected slot is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OccupiedSlotPolicy {
    /// Remove the item from the ground anyway; it is lost.
    #[default]
    Discard,
    /// Refuse the pick-up and leave the item where it is.
    LeaveOnGround,
}

/// Effect of a successfully dispatched message.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Changed,
    /// The item left the ground but the claimant's selected slot was full.
    PickupDiscarded(Item),
    /// The claimant's selected slot was full and the item stayed on the ground.
    PickupRejected,
    /// A player left; these items were in their inventory.
    PlayerRemoved(Vec<Item>),
}

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    pub player_tuning: PlayerTuning,
    pub occupied_slot_policy: OccupiedSlotPolicy,
}

impl Dispatcher {
    pub fn new(player_tuning: PlayerTuning, occupied_slot_policy: OccupiedSlotPolicy) -> Self {
        Self {
            player_tuning,
            occupied_slot_policy,
        }
    }

    /// Applies `message` to `world`. On error the world is left unchanged.
    pub fn apply(
        &self,
        world: &mut WorldSnapshot,
        message: &SyncMessage,
    ) -> Result<Applied, SyncError> {
        match *message {
            SyncMessage::KeyPress {
                player_id,
                action,
                pressed,
            } => {
                let movement = &mut player_mut(world, player_id)?.movement;
                match action {
                    KeyAction::Left => movement.left = pressed,
                    KeyAction::Right => movement.right = pressed,
                    KeyAction::Up => movement.up = pressed,
                    KeyAction::Down => movement.down = pressed,
                }
                Ok(Applied::Changed)
            }
            SyncMessage::MouseClicks {
                player_id,
                x,
                y,
                left_mouse,
            } => {
                let pointer = &mut player_mut(world, player_id)?.pointer;
                pointer.x = x;
                pointer.y = y;
                pointer.left_click = left_mouse;
                Ok(Applied::Changed)
            }
            SyncMessage::ItemDropped {
                item_id,
                player_id: Some(player_id),
                x,
                y,
                ..
            } => {
                if world.ground_items.contains_key(&item_id) {
                    return Err(SyncError::DuplicateItem(item_id));
                }
                let player = player_mut(world, player_id)?;
                let mut item = player
                    .inventory
                    .drop_item(item_id)
                    .ok_or(SyncError::ItemNotHeld { player_id, item_id })?;
                // The message carries the authoritative drop location.
                item.x = x;
                item.y = y;
                world.ground_items.insert(item_id, item);
                Ok(Applied::Changed)
            }
            SyncMessage::ItemDropped {
                item_id,
                player_id: None,
                x,
                y,
                kind,
            } => {
                if world.item_exists(item_id) {
                    return Err(SyncError::DuplicateItem(item_id));
                }
                world
                    .ground_items
                    .insert(item_id, Item::new(item_id, kind, x, y));
                Ok(Applied::Changed)
            }
            SyncMessage::ItemPickedUp {
                item_id,
                player_id: Some(player_id),
            } => {
                // Resolve the claimant first so an unknown player never destroys a ground item.
                let slot_free = player_mut(world, player_id)?
                    .inventory
                    .is_selected_slot_free();
                if !world.ground_items.contains_key(&item_id) {
                    return Err(SyncError::UnknownGroundItem(item_id));
                }
                if !slot_free && self.occupied_slot_policy == OccupiedSlotPolicy::LeaveOnGround {
                    return Ok(Applied::PickupRejected);
                }

                let item = world
                    .ground_items
                    .remove(&item_id)
                    .ok_or(SyncError::UnknownGroundItem(item_id))?;
                match player_mut(world, player_id)?.inventory.pick_up(item) {
                    PickupOutcome::Stored { .. } => Ok(Applied::Changed),
                    PickupOutcome::Occupied { item } => {
                        warn!(
                            item_id,
                            player_id, "selected slot occupied; picked up item discarded"
                        );
                        Ok(Applied::PickupDiscarded(item))
                    }
                }
            }
            SyncMessage::ItemPickedUp {
                item_id,
                player_id: None,
            } => {
                world
                    .ground_items
                    .remove(&item_id)
                    .ok_or(SyncError::UnknownGroundItem(item_id))?;
                Ok(Applied::Changed)
            }
            SyncMessage::PlayerJoined { player_id } => {
                if world.players.contains_key(&player_id) {
                    return Err(SyncError::DuplicatePlayer(player_id));
                }
                world
                    .players
                    .insert(player_id, Player::new(player_id, &self.player_tuning));
                Ok(Applied::Changed)
            }
            SyncMessage::PlayerLeft { player_id } => {
                let mut player = world
                    .players
                    .remove(&player_id)
                    .ok_or(SyncError::UnknownPlayer(player_id))?;
                Ok(Applied::PlayerRemoved(player.inventory.take_all()))
            }
            SyncMessage::PlayerPosition { player_id, x, y } => {
                player_mut(world, player_id)?.set_position(x, y);
                Ok(Applied::Changed)
            }
            SyncMessage::PlayerStats {
                player_id,
                health,
                mana,
            } => {
                let player = player_mut(world, player_id)?;
                player.health = health;
                player.mana = mana;
                Ok(Applied::Changed)
            }
            SyncMessage::SlotSelected { player_id, slot } => {
                player_mut(world, player_id)?
                    .inventory
                    .select_slot(player_id, usize::from(slot))?;
                Ok(Applied::Changed)
            }
        }
    }
}

fn player_mut(world: &mut WorldSnapshot, player_id: PlayerId) -> Result<&mut Player, SyncError> {
    world
        .player_mut(player_id)
        .ok_or(SyncError::UnknownPlayer(player_id))
}
