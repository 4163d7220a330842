//! Per-round stat accounting

use std::collections::HashMap;
use uuid::Uuid;

use crate::ws::protocol::{PlayerRoundSummary, RoundStats};

use super::{PlayerSlot, DAMAGE_PER_HIT};

/// Fields the shared stats cache can increment, one per counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    ShotsFired,
    ShotsHit,
    DamageDealt,
    Kills,
    Deaths,
    GamesPlayed,
}

impl StatField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatField::ShotsFired => "shotsFired",
            StatField::ShotsHit => "shotsHit",
            StatField::DamageDealt => "damageDealt",
            StatField::Kills => "kills",
            StatField::Deaths => "deaths",
            StatField::GamesPlayed => "gamesPlayed",
        }
    }
}

/// Credit a confirmed hit to the shooter
pub fn record_hit(stats: &mut RoundStats) {
    stats.shots_hit += 1;
    stats.damage_dealt += DAMAGE_PER_HIT;
}

/// Credit a kill to the shooter
pub fn record_kill(stats: &mut RoundStats) {
    stats.kills += 1;
}

/// Record the victim's death and the seconds they survived this life
pub fn record_death(stats: &mut RoundStats, time_alive_secs: f32) {
    stats.deaths += 1;
    stats.time_alive_secs += time_alive_secs;
}

/// Build the round-end summary: one line per tracked connection, display
/// names resolved from the player map where the connection is still present.
/// Dead slots still carry their name; only a dropped connection reads as
/// "disconnected".
pub fn build_round_summary(
    players: &HashMap<Uuid, PlayerSlot>,
    stats: &HashMap<Uuid, RoundStats>,
) -> Vec<PlayerRoundSummary> {
    stats
        .iter()
        .map(|(&id, stats)| PlayerRoundSummary {
            id,
            username: players
                .get(&id)
                .map(|slot| slot.display_name().to_string())
                .unwrap_or_else(|| "disconnected".to_string()),
            stats: stats.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;

    #[test]
    fn hit_credits_shots_hit_and_damage() {
        let mut stats = RoundStats::default();
        record_hit(&mut stats);
        assert_eq!(stats.shots_hit, 1);
        assert_eq!(stats.damage_dealt, DAMAGE_PER_HIT);
    }

    #[test]
    fn death_accumulates_time_alive_across_lives() {
        let mut stats = RoundStats::default();
        record_death(&mut stats, 12.5);
        record_death(&mut stats, 7.5);
        assert_eq!(stats.deaths, 2);
        assert_eq!(stats.time_alive_secs, 20.0);
    }

    #[test]
    fn summary_covers_every_tracked_connection() {
        let id_alive = Uuid::new_v4();
        let id_dead = Uuid::new_v4();
        let id_gone = Uuid::new_v4();

        let mut players = HashMap::new();
        players.insert(
            id_alive,
            PlayerSlot::Alive(Player::new(id_alive, "ana".to_string(), 0.0, 0.0)),
        );
        players.insert(
            id_dead,
            PlayerSlot::AwaitingRespawn {
                username: "bob".to_string(),
            },
        );

        let mut stats = HashMap::new();
        stats.insert(id_alive, RoundStats::default());
        stats.insert(id_dead, RoundStats::default());
        stats.insert(id_gone, RoundStats::default());

        let summary = build_round_summary(&players, &stats);
        assert_eq!(summary.len(), 3);
        assert!(summary
            .iter()
            .any(|s| s.id == id_alive && s.username == "ana"));
        assert!(summary
            .iter()
            .any(|s| s.id == id_dead && s.username == "bob"));
        assert!(summary
            .iter()
            .any(|s| s.id == id_gone && s.username == "disconnected"));
    }
}
