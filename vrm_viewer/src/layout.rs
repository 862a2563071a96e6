//! Placement of multiple avatars in a shared room: a circle facing the
//! center for small groups, and a fixed-width plaza grid for full rosters.
//! Both formulas give every avatar a unique slot by construction.

use glam::Vec3;

const CIRCLE_BASE_RADIUS: f32 = 3.0;
const CIRCLE_RADIUS_PER_AVATAR: f32 = 0.3;
const CIRCLE_RADIUS_GROWTH_CAP: f32 = 5.0;

const GRID_SPACING: f32 = 2.2;
const GRID_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub position: Vec3,
    /// Rotation around +Y, with yaw 0 facing +Z.
    pub yaw: f32,
}

impl Slot {
    pub const CENTER: Slot = Slot {
        position: Vec3::ZERO,
        // Single-avatar rooms face the camera, which sits on +Z.
        yaw: 0.0,
    };
}

/// Evenly spaced ring whose radius grows with the group size (capped), every
/// slot turned toward the center.
pub fn circle_slots(count: usize) -> Vec<Slot> {
    if count == 0 {
        return Vec::new();
    }
    let radius = CIRCLE_BASE_RADIUS
        + (count as f32 * CIRCLE_RADIUS_PER_AVATAR).min(CIRCLE_RADIUS_GROWTH_CAP);
    (0..count)
        .map(|index| {
            let angle = index as f32 / count as f32 * std::f32::consts::TAU;
            let position = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
            Slot {
                position,
                yaw: f32::atan2(-position.x, -position.z),
            }
        })
        .collect()
}

/// Plaza grid: rows of five, 2.2 units apart, centered on the origin.
pub fn grid_slots(count: usize) -> Vec<Slot> {
    let start_x = -GRID_SPACING * (GRID_PER_ROW - 1) as f32 / 2.0;
    let start_z = -GRID_SPACING;
    (0..count)
        .map(|index| {
            let row = index / GRID_PER_ROW;
            let col = index % GRID_PER_ROW;
            Slot {
                position: Vec3::new(
                    start_x + col as f32 * GRID_SPACING,
                    0.0,
                    start_z + row as f32 * GRID_SPACING,
                ),
                yaw: 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distinct(slots: &[Slot]) {
        for (i, a) in slots.iter().enumerate() {
            for b in slots.iter().skip(i + 1) {
                assert!(
                    a.position.distance(b.position) > 0.5,
                    "slots {a:?} and {b:?} coincide"
                );
            }
        }
    }

    #[test]
    fn five_circle_slots_are_distinct() {
        let slots = circle_slots(5);
        assert_eq!(slots.len(), 5);
        assert_distinct(&slots);
    }

    #[test]
    fn circle_slots_face_the_center() {
        for slot in circle_slots(8) {
            let forward = Vec3::new(slot.yaw.sin(), 0.0, slot.yaw.cos());
            let to_center = -slot.position.normalize();
            assert!(forward.dot(to_center) > 0.99, "slot {slot:?} looks away");
        }
    }

    #[test]
    fn circle_radius_growth_is_capped() {
        let few = circle_slots(2);
        let many = circle_slots(100);
        assert!(few[0].position.length() < CIRCLE_BASE_RADIUS + CIRCLE_RADIUS_GROWTH_CAP + 1e-3);
        assert!(
            (many[0].position.length() - (CIRCLE_BASE_RADIUS + CIRCLE_RADIUS_GROWTH_CAP)).abs()
                < 1e-3
        );
    }

    #[test]
    fn empty_group_has_no_slots() {
        assert!(circle_slots(0).is_empty());
        assert!(grid_slots(0).is_empty());
    }

    #[test]
    fn full_roster_grid_is_distinct_and_three_rows_deep() {
        let slots = grid_slots(15);
        assert_eq!(slots.len(), 15);
        assert_distinct(&slots);
        assert_eq!(slots[0].position.z, slots[4].position.z);
        assert!(slots[5].position.z > slots[0].position.z);
        assert!(slots[14].position.z > slots[5].position.z);
    }
}
