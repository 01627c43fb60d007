// Use-case level inputs/outputs for the session world loop.

use crate::domain::{PlayerId, SyncMessage};
use axum::extract::ws::Utf8Bytes;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum GameEvent {
    // Ask the world task for a player id plus everything needed to catch up.
    Join { reply: oneshot::Sender<JoinAccepted> },
    Leave { player_id: PlayerId },
    // A client intent, already bound to the sending connection's player.
    Intent { player_id: PlayerId, message: SyncMessage },
}

#[derive(Debug, Clone)]
pub struct JoinAccepted {
    pub player_id: PlayerId,
    // Messages that rebuild the world as of `as_of_seq`, the joiner included.
    pub resync: Vec<SyncMessage>,
    pub as_of_seq: u64,
}

/// An applied message, numbered in the order the world task applied it.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub seq: u64,
    pub message: SyncMessage,
}

/// A broadcast encoded once and shared by every connection.
#[derive(Debug, Clone)]
pub struct SequencedFrame {
    pub seq: u64,
    pub bytes: Utf8Bytes,
}
