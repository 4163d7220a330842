//! Room state and lifecycle
//!
//! One `Room` per match instance. All mutation happens under the room's
//! mutex; handlers and scheduler tasks never hold it across an await point,
//! so every input message and every tick is atomic with respect to the rest.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use uuid::Uuid;

use crate::store::StatsCacheClient;
use crate::util::time::unix_millis;
use crate::ws::gateway::Gateway;
use crate::ws::protocol::{
    DeathInfo, KeyboardInput, PlayerRoundSummary, PlayerView, RoundStats, ServerMsg, Wall,
};

use super::bullets::{self, Bullet};
use super::collision::{self, Aabb};
use super::movement;
use super::spawn;
use super::stats::{self, StatField};
use super::{Player, PlayerSlot, BULLET_SIZE, DAMAGE_PER_HIT, FIRE_COOLDOWN_MS, PLAYER_SIZE, WEAPON_LABEL};

/// One isolated match instance (authoritative)
pub struct Room {
    pub id: String,
    pub players: HashMap<Uuid, PlayerSlot>,
    pub bullets: HashMap<Uuid, Bullet>,
    pub walls: HashMap<String, Wall>,
    /// Per-connection last fire timestamp (unix millis)
    pub last_shot: HashMap<Uuid, u64>,
    /// Set by the first spawn of the round
    pub round_start: Option<u64>,
    pub round_end: Option<u64>,
    pub ended: bool,
    /// Keyed by connection id; rooms are ephemeral
    pub stats: HashMap<Uuid, RoundStats>,
    pub round_duration_secs: u64,
    rng: ChaCha8Rng,
    stats_cache: StatsCacheClient,
}

impl Room {
    pub fn new(id: String, round_duration_secs: u64, stats_cache: StatsCacheClient) -> Self {
        Self {
            id,
            players: HashMap::new(),
            bullets: HashMap::new(),
            walls: HashMap::new(),
            last_shot: HashMap::new(),
            round_start: None,
            round_end: None,
            ended: false,
            stats: HashMap::new(),
            round_duration_secs,
            rng: ChaCha8Rng::seed_from_u64(rand::random()),
            stats_cache,
        }
    }

    /// Process one input message from one connection.
    ///
    /// Order: the ended-hold comes first (an ended room never respawns),
    /// then spawn/respawn, then rotation, fire, movement, the bullet↔player
    /// pass for this player, the bullet↔wall pass, and finally the sender's
    /// own updated state.
    pub fn handle_input(
        &mut self,
        conn: Uuid,
        username: &str,
        rotation: f32,
        fire: bool,
        keyboard: &KeyboardInput,
        gateway: &dyn Gateway,
    ) {
        let now = unix_millis();

        if self.ended {
            if let Some(player) = self.players.get_mut(&conn).and_then(PlayerSlot::alive_mut) {
                player.health = 0.0;
            }
            return;
        }

        let needs_spawn = match self.players.get(&conn) {
            None => true,
            Some(PlayerSlot::AwaitingRespawn { .. }) => true,
            Some(PlayerSlot::Alive(p)) => p.health <= 0.0,
        };
        if needs_spawn {
            self.spawn_player(conn, username, now, gateway);
            return;
        }

        // Facing angle is trusted as reported
        if let Some(player) = self.players.get_mut(&conn).and_then(PlayerSlot::alive_mut) {
            player.rotation = rotation;
        }

        if fire {
            self.try_fire(conn, now, gateway);
        }

        if let Some(PlayerSlot::Alive(player)) = self.players.get_mut(&conn) {
            movement::resolve_movement(player, keyboard, &self.walls);
        }

        self.evaluate_hits(conn, now, gateway);
        collision::sweep_bullet_walls(&mut self.bullets, &self.walls);

        if let Some(player) = self.players.get(&conn).and_then(PlayerSlot::alive) {
            gateway.emit_to_connection(
                conn,
                ServerMsg::UpdateSelf {
                    player: player.view(),
                },
            );
        }
    }

    /// Place a new life for this connection
    fn spawn_player(&mut self, conn: Uuid, username: &str, now: u64, gateway: &dyn Gateway) {
        let occupied: Vec<(f32, f32)> = self
            .players
            .iter()
            .filter(|(id, _)| **id != conn)
            .filter_map(|(_, slot)| slot.alive())
            .map(|p| (p.x, p.y))
            .collect();
        let (x, y) = spawn::select_spawn(&occupied, &mut self.rng);

        let mut player = Player::new(conn, username.to_string(), x, y);
        player.spawned_at = now;

        // First spawn of the round starts the clock; later spawns never
        // restart it
        if self.round_start.is_none() {
            self.round_start = Some(now);
            info!(room_id = %self.id, "Round started");
        }

        if !self.stats.contains_key(&conn) {
            self.stats.insert(
                conn,
                RoundStats {
                    games_played: 1,
                    ..Default::default()
                },
            );
            self.stats_cache.initialize_bg(&self.id, conn, username);
            self.stats_cache
                .increment_bg(&self.id, conn, StatField::GamesPlayed, 1.0);
        }

        gateway.emit_to_connection(
            conn,
            ServerMsg::UpdateSelf {
                player: player.view(),
            },
        );
        self.players.insert(conn, PlayerSlot::Alive(player));
    }

    /// Create a bullet if the per-player cooldown has expired. Early
    /// requests are dropped without an error.
    fn try_fire(&mut self, conn: Uuid, now: u64, gateway: &dyn Gateway) {
        if let Some(&last) = self.last_shot.get(&conn) {
            if now.saturating_sub(last) < FIRE_COOLDOWN_MS {
                return;
            }
        }

        let Some(player) = self.players.get(&conn).and_then(PlayerSlot::alive) else {
            return;
        };
        let bullet = Bullet::new(
            conn,
            player.username.clone(),
            player.x + (PLAYER_SIZE - BULLET_SIZE) / 2.0,
            player.y + (PLAYER_SIZE - BULLET_SIZE) / 2.0,
            player.rotation,
        );

        self.last_shot.insert(conn, now);
        self.stats.entry(conn).or_default().shots_fired += 1;
        self.stats_cache
            .increment_bg(&self.id, conn, StatField::ShotsFired, 1.0);

        gateway.emit_to_room(
            &self.id,
            ServerMsg::NewBullet {
                bullet: bullet.view(),
            },
        );
        self.bullets.insert(bullet.id, bullet);
    }

    /// Bullet↔player pass for the player currently being processed. A dead
    /// player takes no further hits in the same pass.
    fn evaluate_hits(&mut self, conn: Uuid, now: u64, gateway: &dyn Gateway) {
        let Some(victim) = self.players.get(&conn).and_then(PlayerSlot::alive) else {
            return;
        };
        let victim_bounds = Aabb::new(victim.x, victim.y, PLAYER_SIZE, PLAYER_SIZE);

        let overlapping: Vec<Uuid> = self
            .bullets
            .iter()
            .filter(|(_, b)| b.owner != conn && collision::overlaps(&b.bounds(), &victim_bounds))
            .map(|(id, _)| *id)
            .collect();

        for bullet_id in overlapping {
            let Some(bullet) = self.bullets.remove(&bullet_id) else {
                continue;
            };

            stats::record_hit(self.stats.entry(bullet.owner).or_default());
            self.stats_cache
                .increment_bg(&self.id, bullet.owner, StatField::ShotsHit, 1.0);
            self.stats_cache.increment_bg(
                &self.id,
                bullet.owner,
                StatField::DamageDealt,
                DAMAGE_PER_HIT as f64,
            );

            let Some(victim) = self.players.get_mut(&conn).and_then(PlayerSlot::alive_mut) else {
                return;
            };
            let (health, dead) = collision::apply_damage(victim.health, DAMAGE_PER_HIT);
            victim.health = health;

            if dead {
                let time_alive = victim.time_alive_secs(now);
                let victim_name = victim.username.clone();

                let victim_stats = self.stats.entry(conn).or_default();
                stats::record_death(victim_stats, time_alive);
                let death = DeathInfo {
                    killer: bullet.owner_name.clone(),
                    weapon: WEAPON_LABEL.to_string(),
                    time_alive_secs: time_alive,
                    stats: victim_stats.clone(),
                };

                let killer_stats = self.stats.entry(bullet.owner).or_default();
                stats::record_kill(killer_stats);
                let killer_stats = killer_stats.clone();

                self.stats_cache
                    .increment_bg(&self.id, bullet.owner, StatField::Kills, 1.0);
                self.stats_cache
                    .increment_bg(&self.id, conn, StatField::Deaths, 1.0);

                self.players.insert(
                    conn,
                    PlayerSlot::AwaitingRespawn {
                        username: victim_name.clone(),
                    },
                );

                gateway.emit_to_connection(conn, ServerMsg::ShowDeathScreen { death });
                gateway.emit_to_room(
                    &self.id,
                    ServerMsg::KillNotification {
                        killer: bullet.owner_name.clone(),
                        victim: victim_name.clone(),
                        weapon: WEAPON_LABEL.to_string(),
                        killer_stats,
                    },
                );
                gateway.emit_to_room(
                    &self.id,
                    ServerMsg::KillFeed {
                        killer: bullet.owner_name,
                        victim: victim_name,
                        weapon: WEAPON_LABEL.to_string(),
                    },
                );

                info!(room_id = %self.id, victim = %conn, killer = %bullet.owner, "Kill");
                return;
            }
        }
    }

    /// Register a static obstacle; walls are immutable once registered
    pub fn add_wall(&mut self, wall: Wall) {
        self.walls.entry(wall.id.clone()).or_insert(wall);
    }

    /// One bullet physics step plus the wall pass, then the room broadcast.
    /// Skips entirely (including the broadcast) when there are no bullets.
    pub fn step_bullet_physics(&mut self, dt: f32, gateway: &dyn Gateway) {
        if self.bullets.is_empty() {
            return;
        }
        bullets::step_bullets(&mut self.bullets, dt);
        collision::sweep_bullet_walls(&mut self.bullets, &self.walls);

        let views = self.bullets.values().map(Bullet::view).collect();
        gateway.emit_to_room(&self.id, ServerMsg::UpdateAllBullets { bullets: views });
    }

    /// Send every alive player's state to each recipient, excluding that
    /// recipient's own entry
    pub fn broadcast_enemies(&self, recipients: &[Uuid], gateway: &dyn Gateway) {
        if recipients.is_empty() {
            return;
        }
        let views: Vec<(Uuid, PlayerView)> = self
            .players
            .iter()
            .filter_map(|(id, slot)| slot.alive().map(|p| (*id, p.view())))
            .collect();

        for &conn in recipients {
            let players: Vec<PlayerView> = views
                .iter()
                .filter(|(id, _)| *id != conn)
                .map(|(_, view)| view.clone())
                .collect();
            gateway.emit_to_connection(conn, ServerMsg::UpdateAllEnemies { players });
        }
    }

    /// Round-end check plus remaining-time broadcast. Returns the final
    /// summary exactly once, on the tick that ends the round.
    pub fn tick_timer(&mut self, now: u64, gateway: &dyn Gateway) -> Option<Vec<PlayerRoundSummary>> {
        if self.ended {
            return None;
        }
        let start = self.round_start?;
        let elapsed_secs = now.saturating_sub(start) / 1000;

        if elapsed_secs >= self.round_duration_secs {
            Some(self.end_round(now, gateway))
        } else {
            gateway.emit_to_room(
                &self.id,
                ServerMsg::TimerUpdate {
                    remaining_time: self.round_duration_secs - elapsed_secs,
                },
            );
            None
        }
    }

    fn end_round(&mut self, now: u64, gateway: &dyn Gateway) -> Vec<PlayerRoundSummary> {
        // Merge final time-alive for everyone still standing, then hold the
        // whole room at 0 health until the reset
        for (id, slot) in self.players.iter_mut() {
            if let Some(player) = slot.alive_mut() {
                if player.health > 0.0 {
                    self.stats.entry(*id).or_default().time_alive_secs +=
                        player.time_alive_secs(now);
                }
                player.health = 0.0;
            }
        }

        self.ended = true;
        self.round_end = Some(now);

        let summary = stats::build_round_summary(&self.players, &self.stats);
        gateway.emit_to_room(
            &self.id,
            ServerMsg::RoundEnded {
                final_stats: summary.clone(),
            },
        );

        info!(room_id = %self.id, players = summary.len(), "Round ended");
        summary
    }

    /// In-place reset back to WAITING: transient collections go, players
    /// and walls stay so connected sockets don't rejoin
    pub fn reset(&mut self) {
        self.bullets.clear();
        self.last_shot.clear();
        self.stats.clear();
        self.round_start = None;
        self.round_end = None;
        self.ended = false;
        info!(room_id = %self.id, "Room reset for new round");
    }

    /// Remove a disconnected player and its cooldown entry. Stats stay so
    /// the round summary still covers the connection. Removing an absent
    /// entry is a no-op.
    pub fn remove_player(&mut self, conn: Uuid) {
        self.players.remove(&conn);
        self.last_shot.remove(&conn);
    }

    /// Drop cooldown entries whose connection no longer has a player slot
    pub fn prune_stale(&mut self) {
        let players = &self.players;
        self.last_shot.retain(|conn, _| players.contains_key(conn));
    }

    /// A room is collected only when it is empty and its round has ended.
    /// An empty room mid-round is left to finish naturally.
    pub fn is_collectable(&self) -> bool {
        self.players.is_empty() && self.ended
    }
}

/// Explicit registry of active rooms, shared by the gateway and the tick
/// scheduler. Rooms are created lazily on first join.
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Mutex<Room>>>,
    round_duration_secs: u64,
    stats_cache: StatsCacheClient,
}

impl RoomRegistry {
    pub fn new(round_duration_secs: u64, stats_cache: StatsCacheClient) -> Self {
        Self {
            rooms: DashMap::new(),
            round_duration_secs,
            stats_cache,
        }
    }

    pub fn get_or_create(&self, room_id: &str) -> Arc<Mutex<Room>> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!(room_id, "Room created");
                Arc::new(Mutex::new(Room::new(
                    room_id.to_string(),
                    self.round_duration_secs,
                    self.stats_cache.clone(),
                )))
            })
            .clone()
    }

    pub fn get(&self, room_id: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).map(|r| r.value().clone())
    }

    /// Snapshot of all rooms for a scheduler pass
    pub fn snapshot(&self) -> Vec<Arc<Mutex<Room>>> {
        self.rooms.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn total_players(&self) -> usize {
        self.rooms
            .iter()
            .map(|entry| entry.value().lock().players.len())
            .sum()
    }

    /// Delete rooms that are empty and whose round has ended
    pub fn sweep_ended(&self) {
        self.rooms.retain(|room_id, room| {
            let collect = room.lock().is_collectable();
            if collect {
                info!(room_id, "Room garbage collected");
            }
            !collect
        });
    }
}
