use crate::use_cases::OccupiedSlotPolicy;
use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("SYNC_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let hz = env::var("TICK_RATE_HZ")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|hz| (1..=1000).contains(hz))
        .unwrap_or(60);
    tick_interval_for(hz)
}

// Nanosecond precision so 60 Hz stays 60 Hz instead of rounding to whole millis.
fn tick_interval_for(hz: u32) -> Duration {
    Duration::from_secs(1) / hz
}

pub fn occupied_slot_policy() -> OccupiedSlotPolicy {
    match env::var("OCCUPIED_SLOT_POLICY").as_deref() {
        Ok("discard") => OccupiedSlotPolicy::Discard,
        Ok("leave_on_ground") | Err(_) => OccupiedSlotPolicy::LeaveOnGround,
        Ok(other) => {
            tracing::warn!(value = other, "unknown OCCUPIED_SLOT_POLICY; using leave_on_ground");
            OccupiedSlotPolicy::LeaveOnGround
        }
    }
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const BROADCAST_CAPACITY: usize = 256;
