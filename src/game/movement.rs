//! Authoritative movement resolution against static obstacles

use std::collections::HashMap;

use crate::ws::protocol::{KeyboardInput, Wall};

use super::collision::{overlaps, Aabb};
use super::{Player, BASE_SPEED, PLAYER_SIZE, SPRINT_BONUS};

/// Resolve keyboard intent into a new authoritative position.
///
/// Each of the four directions is tested independently: the player's box is
/// shifted by `speed` along that axis alone and marked blocked if the
/// shifted box overlaps any wall. Diagonal movement into a corner therefore
/// still slides along the open axis. Up is decreasing y.
pub fn resolve_movement(player: &mut Player, keyboard: &KeyboardInput, walls: &HashMap<String, Wall>) {
    let speed = if keyboard.sprint {
        BASE_SPEED + SPRINT_BONUS
    } else {
        BASE_SPEED
    };

    let bounds = Aabb::new(player.x, player.y, PLAYER_SIZE, PLAYER_SIZE);

    let blocked_up = blocked(&bounds, 0.0, -speed, walls);
    let blocked_down = blocked(&bounds, 0.0, speed, walls);
    let blocked_left = blocked(&bounds, -speed, 0.0, walls);
    let blocked_right = blocked(&bounds, speed, 0.0, walls);

    if keyboard.up && !blocked_up {
        player.y -= speed;
    }
    if keyboard.down && !blocked_down {
        player.y += speed;
    }
    if keyboard.left && !blocked_left {
        player.x -= speed;
    }
    if keyboard.right && !blocked_right {
        player.x += speed;
    }
}

/// Would the box, shifted by (dx, dy), overlap any wall?
fn blocked(bounds: &Aabb, dx: f32, dy: f32, walls: &HashMap<String, Wall>) -> bool {
    let shifted = Aabb::new(bounds.x + dx, bounds.y + dy, bounds.w, bounds.h);
    walls
        .values()
        .any(|wall| overlaps(&shifted, &Aabb::from_wall(wall)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Uuid::new_v4(), "tester".to_string(), x, y)
    }

    fn wall(id: &str, x: f32, y: f32, width: f32, height: f32) -> (String, Wall) {
        (
            id.to_string(),
            Wall {
                id: id.to_string(),
                x,
                y,
                width,
                height,
            },
        )
    }

    #[test]
    fn open_field_movement_applies_requested_deltas() {
        let mut player = player_at(100.0, 100.0);
        let keyboard = KeyboardInput {
            down: true,
            right: true,
            ..Default::default()
        };
        resolve_movement(&mut player, &keyboard, &HashMap::new());
        assert_eq!(player.x, 103.0);
        assert_eq!(player.y, 103.0);
    }

    #[test]
    fn sprint_adds_bonus_speed() {
        let mut player = player_at(0.0, 0.0);
        let keyboard = KeyboardInput {
            right: true,
            sprint: true,
            ..Default::default()
        };
        resolve_movement(&mut player, &keyboard, &HashMap::new());
        assert_eq!(player.x, 5.0);
    }

    #[test]
    fn wall_above_blocks_upward_movement() {
        // Moving up by 3 from (0,0) would overlap the wall box at (0,-5).
        let mut player = player_at(0.0, 0.0);
        let walls = HashMap::from([wall("w", 0.0, -5.0, 10.0, 10.0)]);
        let keyboard = KeyboardInput {
            up: true,
            ..Default::default()
        };
        resolve_movement(&mut player, &keyboard, &walls);
        assert_eq!(player.y, 0.0);
    }

    #[test]
    fn blocked_axis_still_allows_sliding_on_the_other() {
        // Wall strip just above the player: up is blocked, right is open.
        let mut player = player_at(0.0, 0.0);
        let walls = HashMap::from([wall("w", 0.0, -10.0, 200.0, 8.0)]);
        let keyboard = KeyboardInput {
            up: true,
            right: true,
            ..Default::default()
        };
        resolve_movement(&mut player, &keyboard, &walls);
        assert_eq!(player.y, 0.0, "up is blocked by the wall");
        assert_eq!(player.x, 3.0, "right slides along the blocked corner");
    }

    #[test]
    fn unrequested_directions_never_move() {
        let mut player = player_at(50.0, 50.0);
        resolve_movement(&mut player, &KeyboardInput::default(), &HashMap::new());
        assert_eq!((player.x, player.y), (50.0, 50.0));
    }
}
