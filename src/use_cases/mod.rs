// Use cases layer: dispatch, the sync engine and the per-session world loop.

pub mod dispatcher;
pub mod engine;
pub mod game;
pub mod session;
pub mod types;

pub use dispatcher::{Applied, Dispatcher, OccupiedSlotPolicy};
pub use engine::SyncEngine;
pub use session::{SessionHandle, SessionSettings};
pub use types::{Broadcast, GameEvent, JoinAccepted, SequencedFrame};
