//! Bullet state and physics integration

use std::collections::HashMap;
use uuid::Uuid;

use crate::ws::protocol::BulletView;

use super::collision::Aabb;
use super::{BULLET_SIZE, BULLET_SPEED, WORLD_BOUND};

/// Transient projectile, alive between firing and wall hit / player hit /
/// leaving world bounds
#[derive(Debug, Clone)]
pub struct Bullet {
    pub id: Uuid,
    /// Owner connection id
    pub owner: Uuid,
    /// Denormalized for kill messages
    pub owner_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Heading angle in radians
    pub angle: f32,
}

impl Bullet {
    pub fn new(owner: Uuid, owner_name: String, x: f32, y: f32, angle: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            owner_name,
            x,
            y,
            width: BULLET_SIZE,
            height: BULLET_SIZE,
            angle,
        }
    }

    /// Advance along the heading, returns false once out of world bounds
    pub fn step(&mut self, dt: f32) -> bool {
        self.x += self.angle.cos() * BULLET_SPEED * dt;
        self.y += self.angle.sin() * BULLET_SPEED * dt;
        self.x.abs() <= WORLD_BOUND && self.y.abs() <= WORLD_BOUND
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn view(&self) -> BulletView {
        BulletView {
            id: self.id,
            owner: self.owner,
            owner_name: self.owner_name.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            angle: self.angle,
        }
    }
}

/// Integrate every bullet over `dt` and prune the out-of-bounds ones
pub fn step_bullets(bullets: &mut HashMap<Uuid, Bullet>, dt: f32) {
    bullets.retain(|_, bullet| bullet.step(dt));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_advances_along_heading() {
        let mut bullet = Bullet::new(Uuid::new_v4(), "shooter".into(), 0.0, 0.0, 0.0);
        assert!(bullet.step(0.1));
        assert!((bullet.x - 200.0).abs() < 1e-3);
        assert!(bullet.y.abs() < 1e-3);
    }

    #[test]
    fn displacement_scales_with_elapsed_time() {
        // A delayed step covers the full elapsed interval, so a doubled
        // delta doubles the distance travelled
        let mut slow = Bullet::new(Uuid::new_v4(), "a".into(), 0.0, 0.0, 0.0);
        let mut fast = Bullet::new(Uuid::new_v4(), "b".into(), 0.0, 0.0, 0.0);
        slow.step(0.05);
        fast.step(0.1);
        assert!((fast.x - 2.0 * slow.x).abs() < 1e-3);
    }

    #[test]
    fn out_of_bounds_bullet_is_pruned() {
        let mut bullets = HashMap::new();
        let far = Bullet::new(Uuid::new_v4(), "a".into(), WORLD_BOUND - 1.0, 0.0, 0.0);
        let near = Bullet::new(Uuid::new_v4(), "b".into(), 0.0, 0.0, 0.0);
        let far_id = far.id;
        let near_id = near.id;
        bullets.insert(far.id, far);
        bullets.insert(near.id, near);

        step_bullets(&mut bullets, 0.1);

        assert!(!bullets.contains_key(&far_id));
        assert!(bullets.contains_key(&near_id));

        // Pruned bullets never come back on later steps
        step_bullets(&mut bullets, 0.1);
        assert!(!bullets.contains_key(&far_id));
    }

    #[test]
    fn negative_axis_bound_also_prunes() {
        let mut bullets = HashMap::new();
        let bullet = Bullet::new(
            Uuid::new_v4(),
            "a".into(),
            0.0,
            -(WORLD_BOUND - 1.0),
            -std::f32::consts::FRAC_PI_2,
        );
        bullets.insert(bullet.id, bullet);

        step_bullets(&mut bullets, 0.1);
        assert!(bullets.is_empty());
    }
}
