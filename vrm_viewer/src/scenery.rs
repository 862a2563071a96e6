//! Procedural scenery: each room theme decorates the stage with a small
//! fixed set of flat-colored primitives. Layouts are plain data; the
//! viewer turns the pieces into mesh instances. Randomized themes (the
//! vault coin scatter, library book heights) draw from the caller's
//! generator, so a fixed seed reproduces the same room.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use rand::Rng;

use crate::room::{RoomKind, rgb};

/// Shapes the mesh module can synthesize. All are unit-sized in local space;
/// a piece's non-uniform scale provides the final dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveShape {
    /// Unit cube centered on the origin.
    Box,
    /// Radius-1, height-1 cylinder around +Y.
    Cylinder,
    /// Unit quad in the XY plane facing +Z.
    Plane,
    /// Ring of radius 1 in the XY plane, tube radius 0.06 before scaling.
    Torus,
    /// Upper half of a unit sphere.
    Dome,
    /// Radius-1 disc in the XZ plane facing +Y.
    Disc,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneryPiece {
    pub shape: PrimitiveShape,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub color: [f32; 3],
}

impl SceneryPiece {
    fn new(shape: PrimitiveShape, position: Vec3, scale: Vec3, color: [f32; 3]) -> Self {
        Self {
            shape,
            position,
            rotation: Quat::IDENTITY,
            scale,
            color,
        }
    }

    fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Build the decorative set for a room. Unknown/plain rooms get nothing.
pub fn build_scenery(kind: RoomKind, rng: &mut impl Rng) -> Vec<SceneryPiece> {
    let mut pieces = Vec::new();
    match kind {
        RoomKind::Vault => vault(&mut pieces, rng),
        RoomKind::Mansion => mansion(&mut pieces),
        RoomKind::Museum => museum(&mut pieces),
        RoomKind::Influencer => influencer(&mut pieces),
        RoomKind::Lab => lab(&mut pieces),
        RoomKind::Relay => relay(&mut pieces),
        RoomKind::Compliance => compliance(&mut pieces),
        RoomKind::Judge => judge(&mut pieces),
        RoomKind::Restaurant => restaurant(&mut pieces),
        RoomKind::Dojo => dojo(&mut pieces),
        RoomKind::Observatory => observatory(&mut pieces),
        RoomKind::Cathedral => cathedral(&mut pieces),
        RoomKind::Library => library(&mut pieces, rng),
        RoomKind::Plain => {}
    }
    pieces
}

/// Scattered coins: cylinders and small boxes in a gold palette.
fn vault(pieces: &mut Vec<SceneryPiece>, rng: &mut impl Rng) {
    const GOLDS: [u32; 3] = [0xffd86b, 0xf6c244, 0xd7b98b];
    for index in 0..18 {
        let color = rgb(GOLDS[index % GOLDS.len()]);
        let position = Vec3::new(
            rng.gen_range(-1.3..1.3),
            0.06,
            rng.gen_range(-1.1..1.1) - 0.6,
        );
        let piece = if rng.gen_bool(0.5) {
            let height = rng.gen_range(0.2..0.7);
            SceneryPiece::new(
                PrimitiveShape::Cylinder,
                position,
                Vec3::new(0.12, height, 0.12),
                color,
            )
        } else {
            SceneryPiece::new(
                PrimitiveShape::Box,
                position,
                Vec3::new(0.2, 0.12, 0.2),
                color,
            )
        };
        pieces.push(piece);
    }
}

/// Back wall with horizontal light bars.
fn mansion(pieces: &mut Vec<SceneryPiece>) {
    pieces.push(SceneryPiece::new(
        PrimitiveShape::Plane,
        Vec3::new(0.0, 1.0, -1.4),
        Vec3::new(2.2, 1.1, 1.0),
        rgb(0x102238),
    ));
    for index in 0..6 {
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Plane,
            Vec3::new(0.0, 1.35 - index as f32 * 0.2, -1.39),
            Vec3::new(1.8, 0.06, 1.0),
            rgb(0x2aa4ff),
        ));
    }
}

fn museum(pieces: &mut Vec<SceneryPiece>) {
    for index in -1..=1 {
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Cylinder,
            Vec3::new(index as f32 * 0.9, 0.25, -0.9),
            Vec3::new(0.22, 0.5, 0.22),
            rgb(0x403046),
        ));
    }
}

/// Three dark screens and a neon ring.
fn influencer(pieces: &mut Vec<SceneryPiece>) {
    for index in -1..=1 {
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Plane,
            Vec3::new(index as f32, 1.1, -1.3),
            Vec3::new(0.9, 0.55, 1.0),
            rgb(0x1a1020),
        ));
    }
    pieces.push(SceneryPiece::new(
        PrimitiveShape::Torus,
        Vec3::new(0.0, 1.4, 0.0),
        Vec3::splat(1.2),
        rgb(0xff77aa),
    ));
}

fn lab(pieces: &mut Vec<SceneryPiece>) {
    for index in 0..4 {
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Cylinder,
            Vec3::new(-1.2 + index as f32 * 0.8, 0.7, -1.1),
            Vec3::new(0.05, 1.4, 0.05),
            rgb(0x0e2635),
        ));
    }
    pieces.push(
        SceneryPiece::new(
            PrimitiveShape::Torus,
            Vec3::new(0.0, 0.7, 1.1),
            Vec3::splat(0.5),
            rgb(0x79d0ff),
        )
        .rotated(Quat::from_rotation_x(FRAC_PI_2)),
    );
}

/// Antenna mast with three ring dishes stacked up its height.
fn relay(pieces: &mut Vec<SceneryPiece>) {
    pieces.push(SceneryPiece::new(
        PrimitiveShape::Cylinder,
        Vec3::new(0.0, 1.05, -0.9),
        Vec3::new(0.06, 2.1, 0.06),
        rgb(0x24374a),
    ));
    for height in [0.4, 0.75, 1.1] {
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Torus,
            Vec3::new(0.0, height + 0.2, -0.9),
            Vec3::splat(0.35),
            rgb(0xb8dcff),
        ));
    }
}

/// Three shelf rows, six binders per shelf.
fn compliance(pieces: &mut Vec<SceneryPiece>) {
    for row in 0..3 {
        let shelf_y = 0.35 + row as f32 * 0.42;
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Box,
            Vec3::new(0.0, shelf_y, -1.2),
            Vec3::new(2.2, 0.08, 0.4),
            rgb(0x142123),
        ));
        for index in 0..6 {
            pieces.push(SceneryPiece::new(
                PrimitiveShape::Box,
                Vec3::new(-1.0 + index as f32 * 0.4, shelf_y + 0.11, -1.2),
                Vec3::new(0.18, 0.28, 0.08),
                rgb(0x9fead1),
            ));
        }
    }
}

fn judge(pieces: &mut Vec<SceneryPiece>) {
    pieces.push(SceneryPiece::new(
        PrimitiveShape::Box,
        Vec3::new(0.0, 0.4, -1.2),
        Vec3::new(2.2, 0.8, 0.5),
        rgb(0x1b2230),
    ));
}

/// Round tables on single legs.
fn restaurant(pieces: &mut Vec<SceneryPiece>) {
    for index in -1..=1 {
        let x = index as f32 * 0.9;
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Cylinder,
            Vec3::new(x, 0.43, 0.2),
            Vec3::new(0.35, 0.06, 0.35),
            rgb(0x4d3520),
        ));
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Cylinder,
            Vec3::new(x, 0.2, 0.2),
            Vec3::new(0.07, 0.55, 0.07),
            rgb(0x3a2a1a),
        ));
    }
}

/// 3x3 tatami mats laid flat just above the ground plane.
fn dojo(pieces: &mut Vec<SceneryPiece>) {
    for x in -1..=1 {
        for z in -1..=1 {
            pieces.push(
                SceneryPiece::new(
                    PrimitiveShape::Plane,
                    Vec3::new(x as f32 * 0.95, 0.002, z as f32 * 0.55),
                    Vec3::new(0.9, 0.5, 1.0),
                    rgb(0x262a1d),
                )
                .rotated(Quat::from_rotation_x(-FRAC_PI_2)),
            );
        }
    }
}

fn observatory(pieces: &mut Vec<SceneryPiece>) {
    pieces.push(
        SceneryPiece::new(
            PrimitiveShape::Cylinder,
            Vec3::new(0.5, 0.8, 0.6),
            Vec3::new(0.065, 1.1, 0.065),
            rgb(0x223044),
        )
        .rotated(Quat::from_rotation_z(-0.6)),
    );
    pieces.push(SceneryPiece::new(
        PrimitiveShape::Dome,
        Vec3::new(-0.6, 1.2, -0.6),
        Vec3::splat(1.2),
        rgb(0x1a2333),
    ));
}

/// Stained-glass panes in the original palette.
fn cathedral(pieces: &mut Vec<SceneryPiece>) {
    for (index, color) in [0xd8c0ff, 0xa5d6ff, 0xff9bc0].into_iter().enumerate() {
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Plane,
            Vec3::new(-1.1 + index as f32 * 1.1, 1.1, -1.25),
            Vec3::new(0.4, 1.0, 1.0),
            rgb(color),
        ));
    }
}

/// Shelf blocks with a run of randomly raised books each.
fn library(pieces: &mut Vec<SceneryPiece>, rng: &mut impl Rng) {
    const SPINES: [u32; 3] = [0xd0f0b0, 0xa5d6ff, 0xffc58a];
    for index in -1i32..=1 {
        let shelf_x = index as f32 * 0.9;
        pieces.push(SceneryPiece::new(
            PrimitiveShape::Box,
            Vec3::new(shelf_x, 0.65, -1.2),
            Vec3::new(1.2, 1.2, 0.3),
            rgb(0x23301c),
        ));
        for book in 0..8usize {
            pieces.push(SceneryPiece::new(
                PrimitiveShape::Box,
                Vec3::new(
                    shelf_x - 0.48 + book as f32 * 0.12,
                    rng.gen_range(0.2..1.0),
                    -1.06,
                ),
                Vec3::new(0.16, 0.24, 0.05),
                rgb(SPINES[book % SPINES.len()]),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(kind: RoomKind, seed: u64) -> Vec<SceneryPiece> {
        let mut rng = StdRng::seed_from_u64(seed);
        build_scenery(kind, &mut rng)
    }

    #[test]
    fn plain_room_builds_nothing() {
        assert!(build(RoomKind::Plain, 0).is_empty());
        assert!(build(RoomKind::from_tag("not-a-room"), 0).is_empty());
    }

    #[test]
    fn vault_scatters_eighteen_coins() {
        let pieces = build(RoomKind::Vault, 7);
        assert_eq!(pieces.len(), 18);
        for piece in &pieces {
            assert!(matches!(
                piece.shape,
                PrimitiveShape::Cylinder | PrimitiveShape::Box
            ));
            assert!(piece.position.x.abs() <= 1.3);
        }
    }

    #[test]
    fn vault_coin_stacks_stay_in_height_range() {
        for seed in 0..4 {
            for piece in build(RoomKind::Vault, seed) {
                if piece.shape == PrimitiveShape::Cylinder {
                    assert!(piece.scale.y >= 0.2 && piece.scale.y < 0.7);
                }
            }
        }
    }

    #[test]
    fn identical_seeds_reproduce_the_same_room() {
        assert_eq!(build(RoomKind::Vault, 42), build(RoomKind::Vault, 42));
        assert_eq!(build(RoomKind::Library, 42), build(RoomKind::Library, 42));
    }

    #[test]
    fn different_seeds_shuffle_the_vault() {
        assert_ne!(build(RoomKind::Vault, 1), build(RoomKind::Vault, 2));
    }

    #[test]
    fn library_has_three_shelves_of_eight_books() {
        let pieces = build(RoomKind::Library, 0);
        assert_eq!(pieces.len(), 3 + 3 * 8);
    }

    #[test]
    fn judge_room_is_a_single_bench() {
        let pieces = build(RoomKind::Judge, 0);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].shape, PrimitiveShape::Box);
    }

    #[test]
    fn every_theme_produces_finite_transforms() {
        for kind in [
            RoomKind::Vault,
            RoomKind::Mansion,
            RoomKind::Museum,
            RoomKind::Influencer,
            RoomKind::Lab,
            RoomKind::Relay,
            RoomKind::Compliance,
            RoomKind::Judge,
            RoomKind::Restaurant,
            RoomKind::Dojo,
            RoomKind::Observatory,
            RoomKind::Cathedral,
            RoomKind::Library,
        ] {
            for piece in build(kind, 3) {
                assert!(piece.position.is_finite(), "{kind:?}");
                assert!(piece.scale.is_finite() && piece.scale.min_element() > 0.0);
            }
        }
    }
}
