// Client-side replica: decodes server frames and applies them to a local world snapshot.

use crate::domain::{HitBoxProvider, PlayerId, SyncMessage, WorldSnapshot};
use crate::interface_adapters::protocol::{self, CodecError, WireMessage};
use crate::use_cases::{Applied, Dispatcher, SyncEngine};
use tracing::{debug, info};

pub struct Replica {
    engine: SyncEngine,
    hit_boxes: Box<dyn HitBoxProvider>,
    local_player: Option<PlayerId>,
}

impl Replica {
    pub fn new(dispatcher: Dispatcher, hit_boxes: Box<dyn HitBoxProvider>) -> Self {
        Self {
            engine: SyncEngine::new(dispatcher),
            hit_boxes,
            local_player: None,
        }
    }

    /// Player id the server assigned to this client, once known.
    pub fn local_player(&self) -> Option<PlayerId> {
        self.local_player
    }

    /// Read-only view for the render/UI consumer.
    pub fn world(&self) -> &WorldSnapshot {
        self.engine.world()
    }

    /// Applies one frame from the server.
    ///
    /// Frames that fail to decode, and messages that cannot be applied, are logged and
    /// ignored; the next consistent message heals the view.
    pub fn receive(&mut self, text: &str) -> Option<Applied> {
        let message = match protocol::decode(text) {
            Ok(message) => message,
            Err(CodecError::UnknownVariant(kind)) => {
                debug!(%kind, "ignoring unknown message type");
                return None;
            }
            Err(error) => {
                debug!(%error, bytes = text.len(), "ignoring undecodable frame");
                return None;
            }
        };

        match message {
            WireMessage::Identity { player_id } => {
                info!(player_id, "identity assigned");
                self.local_player = Some(player_id);
                None
            }
            WireMessage::Join { .. } => {
                debug!("ignoring join frame from server");
                None
            }
            other => {
                let sync = other.into_sync()?;
                self.engine.handle(&sync, self.hit_boxes.as_mut())
            }
        }
    }

    /// Local prediction: integrates one tick of movement from the last known intents.
    /// Server position updates overwrite whatever this predicts.
    pub fn predict(&mut self) {
        self.engine.tick(self.hit_boxes.as_mut());
    }

    /// Encodes an intent for the server.
    ///
    /// Keys and pointer are applied locally right away so input feels immediate.
    /// Slot choice waits for the echo like claims and drops do: a claim lands in the
    /// slot selected when it is applied, so the selection must change in server order.
    pub fn send_intent(&mut self, message: SyncMessage) -> Result<String, serde_json::Error> {
        let predicted = matches!(
            message,
            SyncMessage::KeyPress { .. } | SyncMessage::MouseClicks { .. }
        );
        if predicted {
            self.engine.handle(&message, self.hit_boxes.as_mut());
        }
        protocol::encode_sync(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, ItemType, KeyAction};
    use crate::interface_adapters::hitbox::HitBoxTable;

    fn replica() -> Replica {
        Replica::new(Dispatcher::default(), Box::new(HitBoxTable::default()))
    }

    fn frame(message: SyncMessage) -> String {
        protocol::encode_sync(message).expect("encode")
    }

    fn joined_with_coin(player_id: PlayerId, item_id: ItemId) -> Replica {
        let mut replica = replica();
        replica.receive(&frame(SyncMessage::PlayerJoined { player_id }));
        replica.receive(&frame(SyncMessage::ItemDropped {
            item_id,
            player_id: None,
            x: 10.0,
            y: 10.0,
            kind: ItemType::Coin,
        }));
        replica
    }

    #[test]
    fn when_claiming_into_empty_slot_then_item_lands_in_selected_slot() {
        let mut replica = joined_with_coin(1, 42);

        replica.receive(&frame(SyncMessage::ItemPickedUp {
            item_id: 42,
            player_id: Some(1),
        }));

        let player = replica.world().player(1).expect("player exists");
        assert_eq!(player.inventory.slot(0).map(|item| item.id), Some(42));
        assert!(replica.world().ground_item(42).is_none());
    }

    #[test]
    fn when_claiming_into_occupied_slot_then_item_is_lost() {
        let mut replica = joined_with_coin(1, 42);
        replica.receive(&frame(SyncMessage::ItemDropped {
            item_id: 7,
            player_id: None,
            x: 0.0,
            y: 0.0,
            kind: ItemType::Fireball,
        }));
        replica.receive(&frame(SyncMessage::ItemPickedUp {
            item_id: 7,
            player_id: Some(1),
        }));

        let applied = replica.receive(&frame(SyncMessage::ItemPickedUp {
            item_id: 42,
            player_id: Some(1),
        }));

        assert!(matches!(applied, Some(Applied::PickupDiscarded(_))));
        assert!(replica.world().ground_item(42).is_none());
        let player = replica.world().player(1).expect("player exists");
        assert_eq!(player.inventory.slot(0).map(|item| item.id), Some(7));
        assert!(!replica.world().item_exists(42));
    }

    #[test]
    fn when_player_drops_then_item_appears_on_ground_at_drop_point() {
        let mut replica = joined_with_coin(1, 42);
        replica.receive(&frame(SyncMessage::ItemPickedUp {
            item_id: 42,
            player_id: Some(1),
        }));
        replica.receive(&frame(SyncMessage::PlayerPosition {
            player_id: 1,
            x: 100,
            y: 100,
        }));

        replica.receive(&frame(SyncMessage::ItemDropped {
            item_id: 42,
            player_id: Some(1),
            x: 100.0,
            y: 100.0,
            kind: ItemType::Coin,
        }));

        let player = replica.world().player(1).expect("player exists");
        assert!(!player.inventory.contains(42));
        let item = replica.world().ground_item(42).expect("item on ground");
        assert_eq!((item.x, item.y), (100.0, 100.0));
    }

    #[test]
    fn when_left_released_after_up_then_prediction_moves_straight_up() {
        let mut replica = replica();
        replica.receive(&frame(SyncMessage::PlayerJoined { player_id: 1 }));
        for (action, pressed) in [
            (KeyAction::Left, true),
            (KeyAction::Up, true),
            (KeyAction::Left, false),
        ] {
            replica.receive(&frame(SyncMessage::KeyPress {
                player_id: 1,
                action,
                pressed,
            }));
        }

        replica.predict();

        let player = replica.world().player(1).expect("player exists");
        assert_eq!((player.x, player.y), (0, 8));
    }

    #[test]
    fn when_server_removal_repeats_then_second_is_ignored() {
        let mut replica = joined_with_coin(1, 42);
        let removal = frame(SyncMessage::ItemPickedUp {
            item_id: 42,
            player_id: None,
        });

        let first = replica.receive(&removal);
        let second = replica.receive(&removal);

        assert_eq!(first, Some(Applied::Changed));
        assert_eq!(second, None);
        assert!(replica.world().ground_items.is_empty());
    }

    #[test]
    fn when_frames_are_unknown_or_garbled_then_world_is_untouched() {
        let mut replica = joined_with_coin(1, 42);

        assert!(
            replica
                .receive(r#"{"v":1,"msg":{"type":"Teleport","data":{"player_id":1}}}"#)
                .is_none()
        );
        assert!(replica.receive("{{{").is_none());

        assert_eq!(replica.world().players.len(), 1);
        assert!(replica.world().ground_item(42).is_some());
    }

    #[test]
    fn when_identity_arrives_then_local_player_is_set() {
        let mut replica = replica();
        let identity = protocol::encode(&WireMessage::Identity { player_id: 5 }).expect("encode");

        replica.receive(&identity);

        assert_eq!(replica.local_player(), Some(5));
    }

    #[test]
    fn key_intents_are_predicted_but_claims_and_slot_choice_wait_for_server() {
        let mut replica = joined_with_coin(1, 42);

        let key = replica
            .send_intent(SyncMessage::KeyPress {
                player_id: 1,
                action: KeyAction::Right,
                pressed: true,
            })
            .expect("encode");
        let claim = replica
            .send_intent(SyncMessage::ItemPickedUp {
                item_id: 42,
                player_id: Some(1),
            })
            .expect("encode");

        replica
            .send_intent(SyncMessage::SlotSelected {
                player_id: 1,
                slot: 2,
            })
            .expect("encode");

        assert!(key.contains("KeyPress"));
        assert!(claim.contains("ItemPickedUp"));
        let player = replica.world().player(1).expect("player exists");
        assert!(player.movement.right);
        assert_eq!(player.inventory.selected_slot(), 0);
        assert!(replica.world().ground_item(42).is_some());
    }

    // Applies a client frame on the server engine and returns the frame it broadcasts.
    fn relay(server: &mut SyncEngine, hit_boxes: &mut HitBoxTable, text: &str) -> String {
        let message = protocol::decode(text)
            .expect("client frame decodes")
            .into_sync()
            .expect("client frame is a sync message");
        let message = server.authorize(message);
        server
            .handle(&message, hit_boxes)
            .expect("server applies client intent");
        frame(message)
    }

    #[test]
    fn when_slot_changes_before_claim_echo_then_replica_matches_server_slots() {
        let mut server_hit_boxes = HitBoxTable::default();
        let mut server = SyncEngine::new(Dispatcher::default());
        let mut replica = replica();
        let (player_id, joined) = server.join(&mut server_hit_boxes);
        replica.receive(&frame(joined));
        let mut spawned = Vec::new();
        for kind in [ItemType::Coin, ItemType::Fireball] {
            let spawn = server
                .spawn_item(kind, 0.0, 0.0, &mut server_hit_boxes)
                .expect("spawn applies");
            if let SyncMessage::ItemDropped { item_id, .. } = spawn {
                spawned.push(item_id);
            }
            replica.receive(&frame(spawn));
        }

        // Claim, then scroll to slot 1 before the claim's echo comes back.
        let claim = replica
            .send_intent(SyncMessage::ItemPickedUp {
                item_id: spawned[0],
                player_id: Some(player_id),
            })
            .expect("encode");
        let select = replica
            .send_intent(SyncMessage::SlotSelected { player_id, slot: 1 })
            .expect("encode");
        let claim_echo = relay(&mut server, &mut server_hit_boxes, &claim);
        let select_echo = relay(&mut server, &mut server_hit_boxes, &select);
        assert_eq!(
            replica
                .world()
                .player(player_id)
                .map(|player| player.inventory.selected_slot()),
            Some(0)
        );
        replica.receive(&claim_echo);
        replica.receive(&select_echo);

        let second = replica
            .send_intent(SyncMessage::ItemPickedUp {
                item_id: spawned[1],
                player_id: Some(player_id),
            })
            .expect("encode");
        let second_echo = relay(&mut server, &mut server_hit_boxes, &second);
        replica.receive(&second_echo);

        let slot_ids = |world: &WorldSnapshot| -> Vec<Option<u64>> {
            let player = world.player(player_id).expect("player exists");
            player
                .inventory
                .slots()
                .iter()
                .map(|slot| slot.as_ref().map(|item| item.id))
                .collect()
        };
        assert_eq!(
            slot_ids(replica.world()),
            vec![Some(spawned[0]), Some(spawned[1]), None]
        );
        assert_eq!(slot_ids(replica.world()), slot_ids(server.world()));
        assert!(replica.world().ground_items.is_empty());
    }

    #[test]
    fn item_locations_stay_exclusive_across_a_mixed_sequence() {
        let mut replica = replica();
        let mut frames = vec![
            SyncMessage::PlayerJoined { player_id: 1 },
            SyncMessage::PlayerJoined { player_id: 2 },
        ];
        for item_id in 1..=4 {
            frames.push(SyncMessage::ItemDropped {
                item_id,
                player_id: None,
                x: item_id as f32,
                y: 0.0,
                kind: ItemType::HealingPotion,
            });
        }
        frames.extend([
            SyncMessage::ItemPickedUp {
                item_id: 1,
                player_id: Some(1),
            },
            // Same item claimed twice: the second is a protocol error.
            SyncMessage::ItemPickedUp {
                item_id: 1,
                player_id: Some(2),
            },
            SyncMessage::ItemPickedUp {
                item_id: 2,
                player_id: Some(2),
            },
            // Dropping something the player does not hold.
            SyncMessage::ItemDropped {
                item_id: 2,
                player_id: Some(1),
                x: 0.0,
                y: 0.0,
                kind: ItemType::HealingPotion,
            },
            SyncMessage::SlotSelected {
                player_id: 1,
                slot: 1,
            },
            SyncMessage::ItemPickedUp {
                item_id: 3,
                player_id: Some(1),
            },
            SyncMessage::ItemDropped {
                item_id: 1,
                player_id: Some(1),
                x: 5.0,
                y: 5.0,
                kind: ItemType::HealingPotion,
            },
            // Spawning over an id that is held elsewhere.
            SyncMessage::ItemDropped {
                item_id: 2,
                player_id: None,
                x: 0.0,
                y: 0.0,
                kind: ItemType::Coin,
            },
            SyncMessage::ItemPickedUp {
                item_id: 4,
                player_id: None,
            },
            SyncMessage::PlayerLeft { player_id: 2 },
        ]);

        for message in frames {
            replica.receive(&frame(message));
            assert_eq!(replica.world().check_item_locations(), None);
        }

        let player = replica.world().player(1).expect("player exists");
        assert_eq!(player.inventory.slot(1).map(|item| item.id), Some(3));
        assert!(replica.world().ground_item(1).is_some());
        assert!(replica.world().ground_item(4).is_none());
    }
}
