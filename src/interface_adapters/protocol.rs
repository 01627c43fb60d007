// Wire protocol DTOs and the versioned JSON codec shared by server and clients.
// Every frame is `{"v": PROTOCOL_VERSION, "msg": {"type": <variant>, "data": {..}}}`.

use crate::domain::{ItemType, KeyAction, SyncMessage};
use serde::{Deserialize, Serialize};

/// Current wire-protocol version carried in every frame.
pub const PROTOCOL_VERSION: u8 = 1;

/// Reasons a received frame was ignored.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown message type {0:?}")]
    UnknownVariant(String),
}

/// Every message that can travel in a frame, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WireMessage {
    // Client handshake; must be the first frame on a connection.
    Join {
        #[serde(default)]
        display_name: String,
    },
    // Server reply to Join with the assigned player id.
    Identity {
        player_id: u64,
    },
    KeyPress {
        player_id: u64,
        action: KeyActionDto,
        pressed: bool,
    },
    MouseClicks {
        player_id: u64,
        x: f32,
        y: f32,
        left_mouse: bool,
    },
    ItemDropped {
        item_id: u64,
        #[serde(default)]
        player_id: Option<u64>,
        x: f32,
        y: f32,
        #[serde(rename = "type")]
        kind: ItemTypeDto,
    },
    ItemPickedUp {
        item_id: u64,
        #[serde(default)]
        player_id: Option<u64>,
    },
    PlayerJoined {
        player_id: u64,
    },
    PlayerLeft {
        player_id: u64,
    },
    PlayerPosition {
        player_id: u64,
        x: i32,
        y: i32,
    },
    PlayerStats {
        player_id: u64,
        health: i32,
        mana: f32,
    },
    SlotSelected {
        player_id: u64,
        slot: u8,
    },
}

impl WireMessage {
    /// Type tags this build understands.
    pub const KINDS: [&'static str; 11] = [
        "Join",
        "Identity",
        "KeyPress",
        "MouseClicks",
        "ItemDropped",
        "ItemPickedUp",
        "PlayerJoined",
        "PlayerLeft",
        "PlayerPosition",
        "PlayerStats",
        "SlotSelected",
    ];

    /// The sync payload, if this is not a session-level message.
    pub fn into_sync(self) -> Option<SyncMessage> {
        let message = match self {
            WireMessage::Join { .. } | WireMessage::Identity { .. } => return None,
            WireMessage::KeyPress {
                player_id,
                action,
                pressed,
            } => SyncMessage::KeyPress {
                player_id,
                action: action.into(),
                pressed,
            },
            WireMessage::MouseClicks {
                player_id,
                x,
                y,
                left_mouse,
            } => SyncMessage::MouseClicks {
                player_id,
                x,
                y,
                left_mouse,
            },
            WireMessage::ItemDropped {
                item_id,
                player_id,
                x,
                y,
                kind,
            } => SyncMessage::ItemDropped {
                item_id,
                player_id,
                x,
                y,
                kind: kind.into(),
            },
            WireMessage::ItemPickedUp { item_id, player_id } => {
                SyncMessage::ItemPickedUp { item_id, player_id }
            }
            WireMessage::PlayerJoined { player_id } => SyncMessage::PlayerJoined { player_id },
            WireMessage::PlayerLeft { player_id } => SyncMessage::PlayerLeft { player_id },
            WireMessage::PlayerPosition { player_id, x, y } => {
                SyncMessage::PlayerPosition { player_id, x, y }
            }
            WireMessage::PlayerStats {
                player_id,
                health,
                mana,
            } => SyncMessage::PlayerStats {
                player_id,
                health,
                mana,
            },
            WireMessage::SlotSelected { player_id, slot } => {
                SyncMessage::SlotSelected { player_id, slot }
            }
        };
        Some(message)
    }
}

impl From<SyncMessage> for WireMessage {
    fn from(message: SyncMessage) -> Self {
        match message {
            SyncMessage::KeyPress {
                player_id,
                action,
                pressed,
            } => WireMessage::KeyPress {
                player_id,
                action: action.into(),
                pressed,
            },
            SyncMessage::MouseClicks {
                player_id,
                x,
                y,
                left_mouse,
            } => WireMessage::MouseClicks {
                player_id,
                x,
                y,
                left_mouse,
            },
            SyncMessage::ItemDropped {
                item_id,
                player_id,
                x,
                y,
                kind,
            } => WireMessage::ItemDropped {
                item_id,
                player_id,
                x,
                y,
                kind: kind.into(),
            },
            SyncMessage::ItemPickedUp { item_id, player_id } => {
                WireMessage::ItemPickedUp { item_id, player_id }
            }
            SyncMessage::PlayerJoined { player_id } => WireMessage::PlayerJoined { player_id },
            SyncMessage::PlayerLeft { player_id } => WireMessage::PlayerLeft { player_id },
            SyncMessage::PlayerPosition { player_id, x, y } => {
                WireMessage::PlayerPosition { player_id, x, y }
            }
            SyncMessage::PlayerStats {
                player_id,
                health,
                mana,
            } => WireMessage::PlayerStats {
                player_id,
                health,
                mana,
            },
            SyncMessage::SlotSelected { player_id, slot } => {
                WireMessage::SlotSelected { player_id, slot }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyActionDto {
    Left,
    Right,
    Up,
    Down,
}

impl From<KeyActionDto> for KeyAction {
    fn from(action: KeyActionDto) -> Self {
        match action {
            KeyActionDto::Left => KeyAction::Left,
            KeyActionDto::Right => KeyAction::Right,
            KeyActionDto::Up => KeyAction::Up,
            KeyActionDto::Down => KeyAction::Down,
        }
    }
}

impl From<KeyAction> for KeyActionDto {
    fn from(action: KeyAction) -> Self {
        match action {
            KeyAction::Left => KeyActionDto::Left,
            KeyAction::Right => KeyActionDto::Right,
            KeyAction::Up => KeyActionDto::Up,
            KeyAction::Down => KeyActionDto::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemTypeDto {
    Fireball,
    Coin,
    HealingPotion,
}

impl From<ItemTypeDto> for ItemType {
    fn from(kind: ItemTypeDto) -> Self {
        match kind {
            ItemTypeDto::Fireball => ItemType::Fireball,
            ItemTypeDto::Coin => ItemType::Coin,
            ItemTypeDto::HealingPotion => ItemType::HealingPotion,
        }
    }
}

impl From<ItemType> for ItemTypeDto {
    fn from(kind: ItemType) -> Self {
        match kind {
            ItemType::Fireball => ItemTypeDto::Fireball,
            ItemType::Coin => ItemTypeDto::Coin,
            ItemType::HealingPotion => ItemTypeDto::HealingPotion,
        }
    }
}

#[derive(Serialize)]
struct FrameOut<'a> {
    v: u8,
    msg: &'a WireMessage,
}

#[derive(Deserialize)]
struct FrameIn {
    msg: WireMessage,
}

// Peeked before the full decode so unknown types and versions get their own error.
#[derive(Deserialize)]
struct FrameHeader {
    v: u8,
    msg: MessageHeader,
}

#[derive(Deserialize)]
struct MessageHeader {
    #[serde(rename = "type")]
    kind: String,
}

pub fn encode(message: &WireMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&FrameOut {
        v: PROTOCOL_VERSION,
        msg: message,
    })
}

pub fn encode_sync(message: SyncMessage) -> Result<String, serde_json::Error> {
    encode(&WireMessage::from(message))
}

pub fn decode(text: &str) -> Result<WireMessage, CodecError> {
    let header: FrameHeader = serde_json::from_str(text)?;
    if header.v != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion(header.v));
    }
    if !WireMessage::KINDS.contains(&header.msg.kind.as_str()) {
        return Err(CodecError::UnknownVariant(header.msg.kind));
    }
    let frame: FrameIn = serde_json::from_str(text)?;
    Ok(frame.msg)
}
