// Domain-level errors for messages that cannot be applied to a world snapshot.

use crate::domain::state::{ItemId, PlayerId};

/// Protocol violations: a message referenced an entity that is missing or already present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("item {0} is not on the ground")]
    UnknownGroundItem(ItemId),
    #[error("item {item_id} is not in the inventory of player {player_id}")]
    ItemNotHeld { player_id: PlayerId, item_id: ItemId },
    #[error("item {0} already exists")]
    DuplicateItem(ItemId),
    #[error("player {0} already exists")]
    DuplicatePlayer(PlayerId),
    #[error("slot {slot} is out of range for player {player_id}")]
    InvalidSlot { player_id: PlayerId, slot: usize },
}
