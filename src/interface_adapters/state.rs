use crate::use_cases::SessionHandle;

#[derive(Clone)]
pub struct AppState {
    // The single session every WebSocket connection joins.
    pub session: SessionHandle,
}
