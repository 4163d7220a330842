//! Axis-aligned box collision tests and damage arithmetic

use std::collections::HashMap;
use uuid::Uuid;

use crate::ws::protocol::Wall;

use super::bullets::Bullet;

/// Axis-aligned bounding box, origin at top-left
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_wall(wall: &Wall) -> Self {
        Self::new(wall.x, wall.y, wall.width, wall.height)
    }
}

/// Overlap test between two boxes
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Delete every bullet overlapping a wall. No damage, no event.
pub fn sweep_bullet_walls(bullets: &mut HashMap<Uuid, Bullet>, walls: &HashMap<String, Wall>) {
    bullets.retain(|_, bullet| {
        let bounds = bullet.bounds();
        !walls
            .values()
            .any(|wall| overlaps(&bounds, &Aabb::from_wall(wall)))
    });
}

/// Apply damage to health, returns (new_health, is_dead).
/// Health is floored at zero, never stored negative.
pub fn apply_damage(current_health: f32, damage: f32) -> (f32, bool) {
    let new_health = (current_health - damage).max(0.0);
    (new_health, new_health <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DAMAGE_PER_HIT, MAX_HEALTH};

    #[test]
    fn overlap_detects_intersection() {
        let a = Aabb::new(0.0, 0.0, 70.0, 70.0);
        let b = Aabb::new(50.0, 50.0, 20.0, 20.0);
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn wall_sweep_removes_only_overlapping_bullets() {
        let mut bullets = HashMap::new();
        let inside = Bullet::new(Uuid::new_v4(), "a".into(), 100.0, 100.0, 0.0);
        let clear = Bullet::new(Uuid::new_v4(), "b".into(), 500.0, 500.0, 0.0);
        let inside_id = inside.id;
        let clear_id = clear.id;
        bullets.insert(inside.id, inside);
        bullets.insert(clear.id, clear);

        let mut walls = HashMap::new();
        walls.insert(
            "w1".to_string(),
            Wall {
                id: "w1".to_string(),
                x: 90.0,
                y: 90.0,
                width: 40.0,
                height: 40.0,
            },
        );

        sweep_bullet_walls(&mut bullets, &walls);

        assert!(!bullets.contains_key(&inside_id));
        assert!(bullets.contains_key(&clear_id));
    }

    #[test]
    fn health_after_n_hits_is_exact_and_never_negative() {
        let mut health = MAX_HEALTH;
        for n in 1..=9 {
            let (next, dead) = apply_damage(health, DAMAGE_PER_HIT);
            health = next;
            assert_eq!(health, MAX_HEALTH - n as f32 * DAMAGE_PER_HIT);
            assert!(!dead);
        }
        let (next, dead) = apply_damage(health, DAMAGE_PER_HIT);
        assert_eq!(next, 0.0);
        assert!(dead);

        // Overkill still floors at zero
        let (next, dead) = apply_damage(5.0, DAMAGE_PER_HIT);
        assert_eq!(next, 0.0);
        assert!(dead);
    }
}
