use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// How long a submission may wait on a room's gate before RoomBusy.
    pub gate_wait: Duration,
    /// Broadcast channel depth per room; laggards beyond it are dropped.
    pub event_capacity: usize,
    /// Rooms idle longer than this are swept.
    pub room_idle: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            gate_wait: Duration::from_millis(
                env::var("GATE_WAIT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2000),
            ),
            event_capacity: env::var("EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
            room_idle: Duration::from_secs(
                env::var("ROOM_IDLE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600), // 1 hour
            ),
        }
    }
}
