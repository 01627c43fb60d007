// Typed state-change records exchanged between peers.
// Wire encoding lives in `interface_adapters::protocol`.

use crate::domain::state::{ItemId, ItemType, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    // Edge-triggered change of one held movement key.
    KeyPress {
        player_id: PlayerId,
        action: KeyAction,
        pressed: bool,
    },
    // Latest pointer snapshot; last write wins.
    MouseClicks {
        player_id: PlayerId,
        x: f32,
        y: f32,
        left_mouse: bool,
    },
    // With a player: that player dropped the item here. Without: world spawn.
    ItemDropped {
        item_id: ItemId,
        player_id: Option<PlayerId>,
        x: f32,
        y: f32,
        kind: ItemType,
    },
    // With a player: claimed into their selected slot. Without: removed from the world.
    ItemPickedUp {
        item_id: ItemId,
        player_id: Option<PlayerId>,
    },
    PlayerJoined {
        player_id: PlayerId,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    // Authoritative position; replaces whatever the receiver predicted.
    PlayerPosition {
        player_id: PlayerId,
        x: i32,
        y: i32,
    },
    PlayerStats {
        player_id: PlayerId,
        health: i32,
        mana: f32,
    },
    SlotSelected {
        player_id: PlayerId,
        slot: u8,
    },
}

impl SyncMessage {
    /// Player the message is addressed to, if any.
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            SyncMessage::KeyPress { player_id, .. }
            | SyncMessage::MouseClicks { player_id, .. }
            | SyncMessage::PlayerJoined { player_id }
            | SyncMessage::PlayerLeft { player_id }
            | SyncMessage::PlayerPosition { player_id, .. }
            | SyncMessage::PlayerStats { player_id, .. }
            | SyncMessage::SlotSelected { player_id, .. } => Some(*player_id),
            SyncMessage::ItemDropped { player_id, .. }
            | SyncMessage::ItemPickedUp { player_id, .. } => *player_id,
        }
    }

    /// True for intents a client may send on behalf of its own player.
    pub fn is_client_intent(&self) -> bool {
        match self {
            SyncMessage::KeyPress { .. }
            | SyncMessage::MouseClicks { .. }
            | SyncMessage::SlotSelected { .. } => true,
            SyncMessage::ItemDropped { player_id, .. }
            | SyncMessage::ItemPickedUp { player_id, .. } => player_id.is_some(),
            SyncMessage::PlayerJoined { .. }
            | SyncMessage::PlayerLeft { .. }
            | SyncMessage::PlayerPosition { .. }
            | SyncMessage::PlayerStats { .. } => false,
        }
    }
}
