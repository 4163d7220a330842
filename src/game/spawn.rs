//! Spawn point selection

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Fixed pre-authored spawn candidates
pub const SPAWN_POINTS: [(f32, f32); 5] = [
    (200.0, 200.0),
    (1800.0, 200.0),
    (1000.0, 1000.0),
    (200.0, 1800.0),
    (1800.0, 1800.0),
];

/// Pick a placement for a (re)spawning player.
///
/// With no players present, any candidate is as good as another, so one is
/// chosen uniformly at random. Otherwise the candidate whose nearest player
/// is farthest away wins (max-min placement, spreads spawns away from
/// current combat). Ties resolve to the first candidate in iteration order.
pub fn select_spawn(occupied: &[(f32, f32)], rng: &mut ChaCha8Rng) -> (f32, f32) {
    if occupied.is_empty() {
        return SPAWN_POINTS[rng.gen_range(0..SPAWN_POINTS.len())];
    }

    let mut best = SPAWN_POINTS[0];
    let mut best_dist = f32::MIN;

    for candidate in SPAWN_POINTS {
        let nearest = occupied
            .iter()
            .map(|&(px, py)| {
                let dx = candidate.0 - px;
                let dy = candidate.1 - py;
                (dx * dx + dy * dy).sqrt()
            })
            .fold(f32::MAX, f32::min);

        if nearest > best_dist {
            best_dist = nearest;
            best = candidate;
        }
    }

    best
}
