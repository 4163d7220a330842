//! Game simulation modules

pub mod bullets;
pub mod collision;
pub mod movement;
pub mod room;
pub mod spawn;
pub mod stats;

pub use room::{Room, RoomRegistry};

use uuid::Uuid;

use crate::util::time::unix_millis;
use crate::ws::protocol::PlayerView;

/// Player footprint, an axis-aligned box (not a radius)
pub const PLAYER_SIZE: f32 = 70.0;

/// Movement speed per input tick
pub const BASE_SPEED: f32 = 3.0;
pub const SPRINT_BONUS: f32 = 2.0;

/// Bullet constants
pub const BULLET_SPEED: f32 = 2000.0;
pub const BULLET_SIZE: f32 = 10.0;

/// Bullets are pruned once |x| or |y| exceeds this
pub const WORLD_BOUND: f32 = 4000.0;

/// Combat constants
pub const MAX_HEALTH: f32 = 100.0;
pub const DAMAGE_PER_HIT: f32 = 10.0;
pub const FIRE_COOLDOWN_MS: u64 = 200; // 5 shots/second
pub const WEAPON_LABEL: &str = "blaster";

/// Per-connection slot in a room's player map. Distinguishes "currently
/// dead, waiting for the next input to respawn" from "never joined"
/// (absent key). The dead variant keeps the display name so the round-end
/// summary still knows who the connection is.
#[derive(Debug, Clone)]
pub enum PlayerSlot {
    Alive(Player),
    AwaitingRespawn { username: String },
}

impl PlayerSlot {
    pub fn alive(&self) -> Option<&Player> {
        match self {
            PlayerSlot::Alive(p) => Some(p),
            PlayerSlot::AwaitingRespawn { .. } => None,
        }
    }

    pub fn alive_mut(&mut self) -> Option<&mut Player> {
        match self {
            PlayerSlot::Alive(p) => Some(p),
            PlayerSlot::AwaitingRespawn { .. } => None,
        }
    }

    /// Display name regardless of life state
    pub fn display_name(&self) -> &str {
        match self {
            PlayerSlot::Alive(p) => &p.username,
            PlayerSlot::AwaitingRespawn { username } => username,
        }
    }
}

/// Authoritative per-connection combat state
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection id
    pub id: Uuid,
    pub username: String,
    pub x: f32,
    pub y: f32,
    /// Facing angle in radians, client-reported
    pub rotation: f32,
    /// Health (0-100); 0 means the slot flips to AwaitingRespawn
    pub health: f32,
    /// Start of the current life (unix millis), used for time-alive
    pub spawned_at: u64,
}

impl Player {
    pub fn new(id: Uuid, username: String, x: f32, y: f32) -> Self {
        Self {
            id,
            username,
            x,
            y,
            rotation: 0.0,
            health: MAX_HEALTH,
            spawned_at: unix_millis(),
        }
    }

    /// Seconds alive in the current life
    pub fn time_alive_secs(&self, now: u64) -> f32 {
        now.saturating_sub(self.spawned_at) as f32 / 1000.0
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            username: self.username.clone(),
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            health: self.health,
        }
    }
}
