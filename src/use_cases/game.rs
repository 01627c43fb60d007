use super::dispatcher::Applied;
use super::engine::SyncEngine;
use super::session::SessionSettings;
use super::types::{Broadcast, GameEvent, JoinAccepted};
use crate::domain::{HitBoxProvider, SyncMessage};
use std::sync::Arc;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{debug, info, warn};

// Numbers each applied message and fans it out to subscribers.
struct Publisher {
    events_tx: broadcast::Sender<Broadcast>,
    seq: u64,
}

impl Publisher {
    fn publish(&mut self, message: SyncMessage) {
        self.seq += 1;
        // No subscribers is fine; joiners catch up through the resync.
        let _ = self.events_tx.send(Broadcast {
            seq: self.seq,
            message,
        });
    }
}

pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    events_tx: broadcast::Sender<Broadcast>,
    settings: SessionSettings,
    mut hit_boxes: Box<dyn HitBoxProvider>,
    shutdown: Arc<Notify>,
) {
    let mut engine = SyncEngine::new(settings.dispatcher.clone());
    let mut publisher = Publisher { events_tx, seq: 0 };
    let mut tick: u64 = 0;

    // World generation: initial ground items.
    for (kind, x, y) in settings.world.initial_items.iter().copied() {
        if let Some(message) = engine.spawn_item(kind, x, y, hit_boxes.as_mut()) {
            publisher.publish(message);
        }
    }
    info!(
        ground_items = engine.world().ground_items.len(),
        "world generated"
    );

    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(settings.tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the session is dropped.
                break;
            }
            _ = interval.tick() => {}
        }

        // Messages are only applied here, so a tick never sees half of one.
        while let Ok(ev) = input_rx.try_recv() {
            match ev {
                GameEvent::Join { reply } => {
                    let (player_id, joined) = engine.join(hit_boxes.as_mut());
                    // Published before the resync is cut, so the joiner sees it exactly once.
                    publisher.publish(joined);
                    let accepted = JoinAccepted {
                        player_id,
                        resync: engine.resync(),
                        as_of_seq: publisher.seq,
                    };
                    if reply.send(accepted).is_err() {
                        // The connection went away while waiting; undo the join.
                        warn!(player_id, "join reply dropped; removing player");
                        for message in engine.leave(player_id, hit_boxes.as_mut()) {
                            publisher.publish(message);
                        }
                        continue;
                    }
                    info!(player_id, "player joined");
                }
                GameEvent::Leave { player_id } => {
                    info!(player_id, "player left");
                    for message in engine.leave(player_id, hit_boxes.as_mut()) {
                        publisher.publish(message);
                    }
                }
                GameEvent::Intent { player_id, message } => {
                    let message = engine.authorize(message);
                    match engine.handle(&message, hit_boxes.as_mut()) {
                        Some(Applied::PickupRejected) => {
                            debug!(player_id, ?message, "pick-up rejected; selected slot occupied");
                        }
                        Some(_) => publisher.publish(message),
                        None => {}
                    }
                }
            }
        }

        for message in engine.tick(hit_boxes.as_mut()) {
            publisher.publish(message);
        }
        tick += 1;
        if tick % 600 == 0 {
            debug!(
                tick,
                players = engine.world().players.len(),
                ground_items = engine.world().ground_items.len(),
                seq = publisher.seq,
                "world heartbeat"
            );
        }
    }
}
