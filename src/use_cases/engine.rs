// Sync engine: a world snapshot plus the dispatcher that is allowed to mutate it.
// The server world task and every client replica each own one.

use super::dispatcher::{Applied, Dispatcher};
use crate::domain::systems::movement;
use crate::domain::{
    HitBoxProvider, ItemId, ItemType, KeyAction, PlayerId, SyncError, SyncMessage, WorldSnapshot,
};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct SyncEngine {
    world: WorldSnapshot,
    dispatcher: Dispatcher,
    next_player_id: PlayerId,
    next_item_id: ItemId,
}

impl SyncEngine {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            world: WorldSnapshot::new(),
            dispatcher,
            next_player_id: 1,
            next_item_id: 1,
        }
    }

    pub fn world(&self) -> &WorldSnapshot {
        &self.world
    }

    /// Applies a message, keeping hit-boxes in step with joins, leaves and corrections.
    pub fn apply(
        &mut self,
        message: &SyncMessage,
        hit_boxes: &mut dyn HitBoxProvider,
    ) -> Result<Applied, SyncError> {
        // Capture the handle before the player disappears from the world.
        let leaving_hit_box = match message {
            SyncMessage::PlayerLeft { player_id } => self
                .world
                .player(*player_id)
                .and_then(|player| player.hit_box),
            _ => None,
        };

        let applied = self.dispatcher.apply(&mut self.world, message)?;
        debug_assert_eq!(self.world.check_item_locations(), None);

        match *message {
            SyncMessage::PlayerJoined { player_id } => self.attach_hit_box(player_id, hit_boxes),
            SyncMessage::PlayerLeft { .. } => {
                if let Some(handle) = leaving_hit_box {
                    hit_boxes.remove_hit_box(handle);
                }
            }
            SyncMessage::PlayerPosition { player_id, .. } => {
                self.sync_hit_box(player_id, hit_boxes)
            }
            _ => {}
        }
        Ok(applied)
    }

    /// Applies a message received from a peer. Protocol violations are logged and dropped.
    pub fn handle(
        &mut self,
        message: &SyncMessage,
        hit_boxes: &mut dyn HitBoxProvider,
    ) -> Option<Applied> {
        match self.apply(message, hit_boxes) {
            Ok(applied) => Some(applied),
            Err(error) => {
                warn!(%error, ?message, "protocol violation; message dropped");
                None
            }
        }
    }

    /// Admits a new player under a fresh server-assigned id.
    pub fn join(&mut self, hit_boxes: &mut dyn HitBoxProvider) -> (PlayerId, SyncMessage) {
        // Skip ids a replayed resync may already have used.
        while self.world.players.contains_key(&self.next_player_id) {
            self.next_player_id += 1;
        }
        let player_id = self.next_player_id;
        self.next_player_id += 1;

        let message = SyncMessage::PlayerJoined { player_id };
        let applied = self.handle(&message, hit_boxes);
        debug_assert!(applied.is_some(), "fresh player id {player_id} collided");
        (player_id, message)
    }

    /// Removes a player and re-homes its inventory on the ground where it stood.
    ///
    /// Returns the messages describing the change, in apply order.
    pub fn leave(
        &mut self,
        player_id: PlayerId,
        hit_boxes: &mut dyn HitBoxProvider,
    ) -> Vec<SyncMessage> {
        let Some((x, y)) = self
            .world
            .player(player_id)
            .map(|player| (player.x as f32, player.y as f32))
        else {
            debug!(player_id, "leave for unknown player ignored");
            return Vec::new();
        };

        let left = SyncMessage::PlayerLeft { player_id };
        let orphans = match self.apply(&left, hit_boxes) {
            Ok(Applied::PlayerRemoved(items)) => items,
            _ => Vec::new(),
        };

        let mut messages = vec![left];
        for item in orphans {
            let respawn = SyncMessage::ItemDropped {
                item_id: item.id,
                player_id: None,
                x,
                y,
                kind: item.kind,
            };
            if self.handle(&respawn, hit_boxes).is_some() {
                messages.push(respawn);
            }
        }
        messages
    }

    /// Spawns a world-generated ground item under a fresh id.
    pub fn spawn_item(
        &mut self,
        kind: ItemType,
        x: f32,
        y: f32,
        hit_boxes: &mut dyn HitBoxProvider,
    ) -> Option<SyncMessage> {
        while self.world.item_exists(self.next_item_id) {
            self.next_item_id += 1;
        }
        let item_id = self.next_item_id;
        self.next_item_id += 1;

        let message = SyncMessage::ItemDropped {
            item_id,
            player_id: None,
            x,
            y,
            kind,
        };
        self.handle(&message, hit_boxes).map(|_| message)
    }

    /// Rewrites a player drop so it lands on the dropper's authoritative position.
    pub fn authorize(&self, message: SyncMessage) -> SyncMessage {
        match message {
            SyncMessage::ItemDropped {
                item_id,
                player_id: Some(player_id),
                x,
                y,
                kind,
            } => {
                let (x, y) = self
                    .world
                    .player(player_id)
                    .map_or((x, y), |player| (player.x as f32, player.y as f32));
                SyncMessage::ItemDropped {
                    item_id,
                    player_id: Some(player_id),
                    x,
                    y,
                    kind,
                }
            }
            other => other,
        }
    }

    /// Integrates one tick of movement for every player.
    ///
    /// Returns a position update for each player that moved, ordered by id.
    pub fn tick(&mut self, hit_boxes: &mut dyn HitBoxProvider) -> Vec<SyncMessage> {
        let tuning = self.dispatcher.player_tuning;
        let mut moved: Vec<SyncMessage> = self
            .world
            .players
            .values_mut()
            .filter_map(|player| {
                movement::tick_player(player, &tuning, hit_boxes).then(|| {
                    SyncMessage::PlayerPosition {
                        player_id: player.id,
                        x: player.x,
                        y: player.y,
                    }
                })
            })
            .collect();
        moved.sort_by_key(|message| message.player_id());
        moved
    }

    /// Messages that rebuild this world on an empty replica.
    pub fn resync(&self) -> Vec<SyncMessage> {
        let mut player_ids: Vec<PlayerId> = self.world.players.keys().copied().collect();
        player_ids.sort_unstable();

        let mut messages = Vec::new();
        for player_id in player_ids {
            let Some(player) = self.world.player(player_id) else {
                continue;
            };
            messages.push(SyncMessage::PlayerJoined { player_id });
            messages.push(SyncMessage::PlayerPosition {
                player_id,
                x: player.x,
                y: player.y,
            });
            messages.push(SyncMessage::PlayerStats {
                player_id,
                health: player.health,
                mana: player.mana,
            });

            // Held items replay as spawn + claim into the slot they occupy.
            for (slot, item) in player.inventory.slots().iter().enumerate() {
                let Some(item) = item else {
                    continue;
                };
                messages.push(SyncMessage::SlotSelected {
                    player_id,
                    slot: slot as u8,
                });
                messages.push(SyncMessage::ItemDropped {
                    item_id: item.id,
                    player_id: None,
                    x: item.x,
                    y: item.y,
                    kind: item.kind,
                });
                messages.push(SyncMessage::ItemPickedUp {
                    item_id: item.id,
                    player_id: Some(player_id),
                });
            }
            messages.push(SyncMessage::SlotSelected {
                player_id,
                slot: player.inventory.selected_slot() as u8,
            });

            let held = [
                (KeyAction::Left, player.movement.left),
                (KeyAction::Right, player.movement.right),
                (KeyAction::Up, player.movement.up),
                (KeyAction::Down, player.movement.down),
            ];
            for (action, pressed) in held {
                if pressed {
                    messages.push(SyncMessage::KeyPress {
                        player_id,
                        action,
                        pressed,
                    });
                }
            }
            messages.push(SyncMessage::MouseClicks {
                player_id,
                x: player.pointer.x,
                y: player.pointer.y,
                left_mouse: player.pointer.left_click,
            });
        }

        let mut ground: Vec<_> = self.world.ground_items.values().collect();
        ground.sort_unstable_by_key(|item| item.id);
        messages.extend(ground.into_iter().map(|item| SyncMessage::ItemDropped {
            item_id: item.id,
            player_id: None,
            x: item.x,
            y: item.y,
            kind: item.kind,
        }));
        messages
    }

    fn attach_hit_box(&mut self, player_id: PlayerId, hit_boxes: &mut dyn HitBoxProvider) {
        let (off_x, off_y) = self.dispatcher.player_tuning.hit_box_offset;
        if let Some(player) = self.world.player_mut(player_id) {
            let handle =
                hit_boxes.create_hit_box(player_id, player.x as f32 + off_x, player.y as f32 + off_y);
            player.hit_box = Some(handle);
        }
    }

    fn sync_hit_box(&self, player_id: PlayerId, hit_boxes: &mut dyn HitBoxProvider) {
        let (off_x, off_y) = self.dispatcher.player_tuning.hit_box_offset;
        if let Some(player) = self.world.player(player_id)
            && let Some(handle) = player.hit_box
        {
            hit_boxes.set_position(handle, player.x as f32 + off_x, player.y as f32 + off_y);
        }
    }
}
