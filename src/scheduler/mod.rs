//! Periodic tick activities over the shared room registry
//!
//! Four independent interval tasks: enemy-state broadcast, bullet physics,
//! round timing, and housekeeping. Each task takes a room's mutex only for
//! the duration of one room's work and never holds it across an await.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::game::RoomRegistry;
use crate::store::{ResultsStore, StatsCacheClient};
use crate::store::results::RoundSummary;
use crate::util::time::{
    bullet_physics_interval, enemy_broadcast_interval, unix_millis, CLEANUP_INTERVAL,
    TIMER_CHECK_INTERVAL,
};
use crate::ws::gateway::Gateway;

/// Drives every room's periodic work
pub struct TickScheduler {
    registry: Arc<RoomRegistry>,
    gateway: Arc<dyn Gateway>,
    results: ResultsStore,
    stats_cache: StatsCacheClient,
    reset_delay: Duration,
}

impl TickScheduler {
    pub fn new(
        registry: Arc<RoomRegistry>,
        gateway: Arc<dyn Gateway>,
        results: ResultsStore,
        stats_cache: StatsCacheClient,
        reset_delay: Duration,
    ) -> Self {
        Self {
            registry,
            gateway,
            results,
            stats_cache,
            reset_delay,
        }
    }

    /// Spawn the four periodic tasks; they run for the life of the process
    pub fn start(self: Arc<Self>) {
        info!("Tick scheduler started");

        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run_enemy_broadcast().await });

        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run_bullet_physics().await });

        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run_round_timer().await });

        tokio::spawn(async move { self.run_housekeeping().await });
    }

    /// Broadcast every alive player's state, excluding each recipient's own
    /// entry
    async fn run_enemy_broadcast(&self) {
        let mut ticker = interval(enemy_broadcast_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            for room in self.registry.snapshot() {
                let room = room.lock();
                let recipients = self.gateway.connections_in(&room.id);
                room.broadcast_enemies(&recipients, self.gateway.as_ref());
            }
        }
    }

    /// Step bullet physics and run the wall pass for every room with at
    /// least one bullet. The delta is measured wall-clock time since the
    /// previous step, so skipped ticks never slow bullets down.
    async fn run_bullet_physics(&self) {
        let mut ticker = interval(bullet_physics_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_step = Instant::now();

        loop {
            ticker.tick().await;
            let dt = last_step.elapsed().as_secs_f32();
            last_step = Instant::now();
            for room in self.registry.snapshot() {
                room.lock().step_bullet_physics(dt, self.gateway.as_ref());
            }
        }
    }

    /// Check the round-end condition and broadcast remaining time for every
    /// active room; on a round ending, hand off the summary and schedule the
    /// in-place reset
    async fn run_round_timer(&self) {
        let mut ticker = interval(TIMER_CHECK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let now = unix_millis();

            for room in self.registry.snapshot() {
                let ended = { room.lock().tick_timer(now, self.gateway.as_ref()) };

                let Some(final_stats) = ended else { continue };

                let (room_id, duration_secs) = {
                    let room = room.lock();
                    (room.id.clone(), room.round_duration_secs)
                };

                // Persistence handoff runs off the simulation path
                self.results.submit_bg(
                    RoundSummary {
                        room_id,
                        ended_at: chrono::Utc::now(),
                        duration_secs,
                        final_stats,
                        cached_totals: None,
                    },
                    self.stats_cache.clone(),
                );

                // In-place reset after the hold delay; the room id survives
                let room = room.clone();
                let delay = self.reset_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    room.lock().reset();
                });
            }
        }
    }

    /// Prune stale per-connection bookkeeping and sweep ended, emptied rooms
    async fn run_housekeeping(&self) {
        let mut ticker = interval(CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            for room in self.registry.snapshot() {
                room.lock().prune_stale();
            }
            self.registry.sweep_ended();
        }
    }
}
