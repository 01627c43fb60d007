// Network adapter: WebSocket clients joining the session.

pub mod client;

pub use client::{spawn_session_serializer, ws_handler};
