//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Keyboard intent for a single input message
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct KeyboardInput {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub sprint: bool,
}

/// Static obstacle registered by the level loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Associate this connection with a room (idempotent)
    JoinRoom { room_id: String },

    /// Player intent for the current input tick
    UpdateSelf {
        /// Client-reported id, ignored; the connection id is authoritative
        id: Option<Uuid>,
        username: String,
        /// Facing angle in radians (client-reported, unverified)
        rotation: f32,
        /// Fire request this tick (subject to server cooldown)
        fire: bool,
        keyboard: KeyboardInput,
    },

    /// Register a static obstacle for the room (trusted level data)
    AddWall { wall: Wall },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome { connection_id: Uuid, server_time: u64 },

    /// The sender's own authoritative state, every input tick
    UpdateSelf { player: PlayerView },

    /// All other players' authoritative state (recipient excluded)
    UpdateAllEnemies { players: Vec<PlayerView> },

    /// A bullet was created
    NewBullet { bullet: BulletView },

    /// Post-step bullet positions, on the bullet physics cadence
    UpdateAllBullets { bullets: Vec<BulletView> },

    /// A lethal hit occurred
    KillNotification {
        killer: String,
        victim: String,
        weapon: String,
        killer_stats: RoundStats,
    },

    /// Kill-feed entry for HUD rendering
    KillFeed {
        killer: String,
        victim: String,
        weapon: String,
    },

    /// Sent to the victim only
    ShowDeathScreen { death: DeathInfo },

    /// Remaining round time, broadcast periodically while a round is active
    TimerUpdate { remaining_time: u64 },

    /// Round is over; per-connection final stats
    RoundEnded { final_stats: Vec<PlayerRoundSummary> },

    /// Pong response
    Pong {
        /// Server timestamp
        t: u64,
    },
}

/// Player state as rendered by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: Uuid,
    pub username: String,
    pub x: f32,
    pub y: f32,
    /// Facing angle in radians
    pub rotation: f32,
    /// Health (0-100)
    pub health: f32,
}

/// Bullet state as rendered by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletView {
    pub id: Uuid,
    pub owner: Uuid,
    pub owner_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Heading angle in radians
    pub angle: f32,
}

/// Per-connection combat counters for one round
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStats {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
    pub kills: u32,
    pub deaths: u32,
    /// Seconds alive accumulated across all lives in the round
    pub time_alive_secs: f32,
    pub games_played: u32,
}

/// Death summary, produced once per death and consumed by the victim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeathInfo {
    pub killer: String,
    pub weapon: String,
    /// Seconds alive for the life that just ended
    pub time_alive_secs: f32,
    /// Snapshot of the victim's stats at time of death
    pub stats: RoundStats,
}

/// One connection's final line in the round-end summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundSummary {
    pub id: Uuid,
    pub username: String,
    pub stats: RoundStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_parses_and_pong_serializes_with_timestamps() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"ping","t":123}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Ping { t: 123 }));

        let json = serde_json::to_string(&ServerMsg::Pong { t: 456 }).unwrap();
        assert_eq!(json, r#"{"type":"pong","t":456}"#);
    }
}
