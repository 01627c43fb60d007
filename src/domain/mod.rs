// Domain layer: entities, inventory rules, movement math and sync messages.

pub mod errors;
pub mod inventory;
pub mod messages;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use errors::SyncError;
pub use inventory::{INVENTORY_SLOTS, Inventory, PickupOutcome};
pub use messages::{KeyAction, SyncMessage};
pub use ports::{HitBoxHandle, HitBoxProvider};
pub use state::{Item, ItemId, ItemType, MovementIntent, Player, PlayerId, PointerIntent};
pub use world::WorldSnapshot;
