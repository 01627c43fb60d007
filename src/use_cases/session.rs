// Session orchestration: spawns one authoritative world task and exposes its channels.

use super::dispatcher::Dispatcher;
use super::game::world_task;
use super::types::{Broadcast, GameEvent, SequencedFrame};
use crate::domain::HitBoxProvider;
use crate::domain::tuning::world::WorldTuning;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};

/// Configuration for spawning a session world.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast sync messages and encoded frames.
    pub broadcast_capacity: usize,
    /// Fixed tick interval for the game loop.
    pub tick_interval: Duration,
    /// Dispatch rules, including what to do with pick-ups into a full slot.
    pub dispatcher: Dispatcher,
    /// World generation.
    pub world: WorldTuning,
}

/// Channels connecting network tasks to one session's world task.
#[derive(Clone)]
pub struct SessionHandle {
    /// Sender for game events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Applied messages in apply order.
    pub events_tx: broadcast::Sender<Broadcast>,
    /// The same messages, encoded once for all connections.
    pub frames_tx: broadcast::Sender<SequencedFrame>,
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    /// Spawns the world task for a new session.
    pub fn spawn(settings: SessionSettings, hit_boxes: Box<dyn HitBoxProvider>) -> Self {
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
        let (events_tx, _events_rx) =
            broadcast::channel::<Broadcast>(settings.broadcast_capacity);
        let (frames_tx, _frames_rx) =
            broadcast::channel::<SequencedFrame>(settings.broadcast_capacity);
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(world_task(
            input_rx,
            events_tx.clone(),
            settings,
            hit_boxes,
            shutdown.clone(),
        ));

        Self {
            input_tx,
            events_tx,
            frames_tx,
            shutdown,
        }
    }

    /// Stops the world task at its next tick boundary.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
