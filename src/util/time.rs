//! Time utilities and tick cadences

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Scheduler cadences. Each periodic activity has its own interval and
/// none of them gate the others.
pub const ENEMY_BROADCAST_HZ: u32 = 20;
pub const BULLET_PHYSICS_HZ: u32 = 60;
pub const TIMER_CHECK_INTERVAL: Duration = Duration::from_secs(1);
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(10);

pub fn enemy_broadcast_interval() -> Duration {
    Duration::from_micros(1_000_000 / ENEMY_BROADCAST_HZ as u64)
}

pub fn bullet_physics_interval() -> Duration {
    Duration::from_micros(1_000_000 / BULLET_PHYSICS_HZ as u64)
}
