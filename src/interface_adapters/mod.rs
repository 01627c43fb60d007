// Interface adapters: wire protocol, network handling and peer-side replicas.

pub mod hitbox;
pub mod net;
pub mod peer;
pub mod protocol;
pub mod state;
pub mod utils;
