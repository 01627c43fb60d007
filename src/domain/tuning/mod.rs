pub mod player;
pub mod world;
