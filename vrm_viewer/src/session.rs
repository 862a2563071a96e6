//! The viewer session owns everything the original pages kept in module
//! globals: the avatar registry, the scenery set, the HUD log, and the idle
//! animation phase. Operations take the session by reference, so multiple
//! independent sessions (and tests) can coexist.

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::path::Path;

use glam::{Mat4, Vec3};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::avatar::{AvatarAsset, AvatarSource, LoadError, load_avatar};
use crate::framing::{DEFAULT_FOV_Y, DEFAULT_MARGIN, Framing, fit_avatar};
use crate::hud::HudLog;
use crate::layout::{Slot, circle_slots, grid_slots};
use crate::room::RoomKind;
use crate::scenery::{SceneryPiece, build_scenery};

/// Rate the idle sway phase advances at, in radians per second.
const IDLE_RATE: f32 = 0.8;
const IDLE_SWAY_AMPLITUDE: f32 = 0.05;

/// Plaza camera for multi-avatar rooms, matching the fixed perch the
/// original roster page used.
const PLAZA_TARGET: Vec3 = Vec3::new(0.0, 1.3, 0.0);
const PLAZA_EYE: Vec3 = Vec3::new(0.0, 2.5, 7.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Circle,
    Grid,
}

#[derive(Debug, Clone)]
pub struct LoadedAvatar {
    pub key: String,
    pub asset: AvatarAsset,
    pub applied_scale: f32,
    pub framing: Framing,
    pub slot: Slot,
}

impl LoadedAvatar {
    /// Placement transform: slot position and yaw plus the normalization
    /// scale, with the per-frame sway folded into the yaw.
    pub fn model_matrix(&self, sway: f32) -> Mat4 {
        Mat4::from_translation(self.slot.position)
            * Mat4::from_rotation_y(self.slot.yaw + sway)
            * Mat4::from_scale(Vec3::splat(self.applied_scale))
    }
}

pub struct ViewerSession {
    room: RoomKind,
    registry: BTreeMap<String, LoadedAvatar>,
    /// Load order; slots are assigned in this order so relayouts are stable.
    order: Vec<String>,
    scenery: Vec<SceneryPiece>,
    layout: LayoutMode,
    idle_phase: f32,
    pub hud: HudLog,
}

impl ViewerSession {
    pub fn new(room: RoomKind, seed: u64) -> Self {
        let mut hud = HudLog::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let scenery = build_scenery(room, &mut rng);
        hud.info(format!(
            "room '{}' ready ({} scenery pieces, seed {})",
            room.label(),
            scenery.len(),
            seed
        ));
        Self {
            room,
            registry: BTreeMap::new(),
            order: Vec::new(),
            scenery,
            layout: LayoutMode::Circle,
            idle_phase: 0.0,
            hud,
        }
    }

    pub fn room(&self) -> RoomKind {
        self.room
    }

    pub fn scenery(&self) -> &[SceneryPiece] {
        &self.scenery
    }

    pub fn avatar_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.registry.contains_key(key)
    }

    /// Avatars in load order.
    pub fn avatars(&self) -> impl Iterator<Item = &LoadedAvatar> {
        self.order.iter().filter_map(|key| self.registry.get(key))
    }

    /// Load one avatar under a key. A key already in the registry is a
    /// logged no-op; every failure is logged once and terminal. Returns
    /// whether the registry changed.
    pub fn load(&mut self, key: &str, path: Option<&Path>, source: &dyn AvatarSource) -> bool {
        if self.registry.contains_key(key) {
            self.hud.info(format!("{key} is already loaded, skipping"));
            return false;
        }
        let Some(path) = path else {
            self.hud.err(LoadError::MissingConfig.to_string());
            return false;
        };

        match load_avatar(source, path) {
            Ok(asset) => {
                let framing = fit_avatar(&asset.bounds, DEFAULT_FOV_Y, DEFAULT_MARGIN);
                self.hud.ok(format!(
                    "loaded {} ({} triangles, scale {:.2})",
                    asset.file_name,
                    asset.mesh.triangle_count(),
                    framing.scale
                ));
                self.registry.insert(
                    key.to_owned(),
                    LoadedAvatar {
                        key: key.to_owned(),
                        applied_scale: framing.scale,
                        framing,
                        slot: Slot::CENTER,
                        asset,
                    },
                );
                self.order.push(key.to_owned());
                self.relayout();
                true
            }
            Err(err) => {
                self.hud.err(err.to_string());
                false
            }
        }
    }

    /// Sequentially load any not-yet-loaded entries, the roster "load
    /// selected" action.
    pub fn load_many<'a>(
        &mut self,
        items: impl IntoIterator<Item = (&'a str, &'a Path)>,
        source: &dyn AvatarSource,
    ) {
        for (key, path) in items {
            if !self.is_loaded(key) {
                self.load(key, Some(path), source);
            }
        }
    }

    /// Remove one avatar by key. Returns whether the registry changed.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.registry.remove(key).is_none() {
            return false;
        }
        self.order.retain(|loaded| loaded != key);
        self.hud.info(format!("removed {key}"));
        self.relayout();
        true
    }

    /// Remove every avatar and empty the registry; scenery stays.
    pub fn clear(&mut self) {
        let count = self.registry.len();
        self.registry.clear();
        self.order.clear();
        self.hud.info(format!("cleared {count} avatars"));
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout
    }

    pub fn toggle_layout(&mut self) {
        self.layout = match self.layout {
            LayoutMode::Circle => LayoutMode::Grid,
            LayoutMode::Grid => LayoutMode::Circle,
        };
        self.hud.info(match self.layout {
            LayoutMode::Circle => "layout: circle",
            LayoutMode::Grid => "layout: grid",
        });
        self.relayout();
    }

    /// Reassign slots: a lone avatar stands at the center, groups fill the
    /// active layout in load order.
    fn relayout(&mut self) {
        if self.order.len() == 1 {
            if let Some(avatar) = self.registry.get_mut(&self.order[0]) {
                avatar.slot = Slot::CENTER;
            }
            return;
        }
        let slots = match self.layout {
            LayoutMode::Circle => circle_slots(self.order.len()),
            LayoutMode::Grid => grid_slots(self.order.len()),
        };
        for (key, slot) in self.order.iter().zip(slots) {
            if let Some(avatar) = self.registry.get_mut(key) {
                avatar.slot = slot;
            }
        }
    }

    /// Camera framing for the current population: a single avatar is framed
    /// by its own fit, a group gets the fixed plaza perch, an empty room
    /// leaves the camera where it is.
    pub fn camera_framing(&self) -> Option<Framing> {
        match self.order.len() {
            0 => None,
            1 => self
                .registry
                .get(&self.order[0])
                .map(|avatar| avatar.framing),
            _ => Some(Framing {
                scale: 1.0,
                eye: PLAZA_EYE,
                target: PLAZA_TARGET,
                distance: (PLAZA_EYE - PLAZA_TARGET).length(),
            }),
        }
    }

    /// Advance the idle animation phase by the elapsed frame time.
    pub fn advance(&mut self, dt: f32) {
        self.idle_phase = (self.idle_phase + dt * IDLE_RATE).rem_euclid(TAU);
    }

    /// Per-avatar yaw sway for the current phase, offset by load index so a
    /// plaza full of avatars does not move in lockstep.
    pub fn sway_yaw(&self, index: usize) -> f32 {
        (self.idle_phase + index as f32 * 0.7).sin() * IDLE_SWAY_AMPLITUDE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::FileAvatarSource;
    use crate::avatar::test_fixtures::tiny_vrm;
    use crate::hud::LogLevel;
    use std::io::Write;

    fn fixture_file(height: f32) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&tiny_vrm(height)).unwrap();
        file
    }

    fn err_entries(session: &ViewerSession) -> usize {
        session.hud.error_count()
    }

    #[test]
    fn missing_model_path_logs_exactly_one_error() {
        let mut session = ViewerSession::new(RoomKind::Vault, 0);
        assert!(!session.load("abbey", None, &FileAvatarSource));
        assert_eq!(err_entries(&session), 1);
        assert_eq!(session.avatar_count(), 0);
        // Scenery is unaffected by the failed load.
        assert_eq!(session.scenery().len(), 18);
    }

    #[test]
    fn missing_file_logs_exactly_one_error_and_inserts_nothing() {
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        session.load(
            "ghost",
            Some(Path::new("/no/such/ghost.vrm")),
            &FileAvatarSource,
        );
        assert_eq!(err_entries(&session), 1);
        assert_eq!(session.avatar_count(), 0);
    }

    #[test]
    fn duplicate_keys_load_once() {
        let file = fixture_file(1.7);
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        assert!(session.load("abbey", Some(file.path()), &FileAvatarSource));
        assert!(!session.load("abbey", Some(file.path()), &FileAvatarSource));
        assert_eq!(session.avatar_count(), 1);
        let skip_notes = session
            .hud
            .entries()
            .iter()
            .filter(|entry| entry.level == LogLevel::Info && entry.message.contains("skipping"))
            .count();
        assert_eq!(skip_notes, 1);
    }

    #[test]
    fn single_avatar_framing_matches_its_height() {
        let file = fixture_file(2.0);
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        session.load("tall", Some(file.path()), &FileAvatarSource);
        let framing = session.camera_framing().expect("framing for one avatar");
        assert!((framing.scale - 0.85).abs() < 1e-6);
    }

    #[test]
    fn five_avatars_occupy_distinct_slots() {
        let file = fixture_file(1.6);
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        for key in ["a", "b", "c", "d", "e"] {
            session.load(key, Some(file.path()), &FileAvatarSource);
        }
        assert_eq!(session.avatar_count(), 5);
        let positions: Vec<_> = session.avatars().map(|a| a.slot.position).collect();
        for (i, a) in positions.iter().enumerate() {
            for b in positions.iter().skip(i + 1) {
                assert!(a.distance(*b) > 0.5, "slots coincide: {a} vs {b}");
            }
        }
    }

    #[test]
    fn load_many_skips_already_loaded_keys() {
        let file = fixture_file(1.6);
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        session.load("a", Some(file.path()), &FileAvatarSource);
        session.load_many(
            [("a", file.path()), ("b", file.path())],
            &FileAvatarSource,
        );
        assert_eq!(session.avatar_count(), 2);
        // No "skipping" entry: load_many checks before calling load.
        assert!(
            session
                .hud
                .entries()
                .iter()
                .all(|entry| !entry.message.contains("skipping"))
        );
    }

    #[test]
    fn remove_drops_one_avatar_and_recenters_the_survivor() {
        let file = fixture_file(1.6);
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        session.load("a", Some(file.path()), &FileAvatarSource);
        session.load("b", Some(file.path()), &FileAvatarSource);
        assert!(session.remove("a"));
        assert!(!session.remove("a"));
        assert_eq!(session.avatar_count(), 1);
        let survivor = session.avatars().next().unwrap();
        assert_eq!(survivor.key, "b");
        assert_eq!(survivor.slot.position, Slot::CENTER.position);
    }

    #[test]
    fn clear_empties_the_registry_but_keeps_scenery() {
        let file = fixture_file(1.6);
        let mut session = ViewerSession::new(RoomKind::Library, 9);
        session.load("a", Some(file.path()), &FileAvatarSource);
        session.load("b", Some(file.path()), &FileAvatarSource);
        session.clear();
        assert_eq!(session.avatar_count(), 0);
        assert!(session.camera_framing().is_none());
        assert_eq!(session.scenery().len(), 27);
        // The registry accepts the key again after clearing.
        assert!(session.load("a", Some(file.path()), &FileAvatarSource));
    }

    #[test]
    fn layout_toggle_reassigns_group_slots() {
        let file = fixture_file(1.6);
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        for key in ["a", "b", "c"] {
            session.load(key, Some(file.path()), &FileAvatarSource);
        }
        let circle: Vec<_> = session.avatars().map(|a| a.slot.position).collect();
        session.toggle_layout();
        assert_eq!(session.layout_mode(), LayoutMode::Grid);
        let grid: Vec<_> = session.avatars().map(|a| a.slot.position).collect();
        assert_ne!(circle, grid);
    }

    #[test]
    fn idle_phase_advances_and_wraps() {
        let mut session = ViewerSession::new(RoomKind::Plain, 0);
        session.advance(1.0);
        let sway_a = session.sway_yaw(0);
        session.advance(1000.0);
        assert!(session.sway_yaw(0).is_finite());
        assert!(sway_a.abs() <= IDLE_SWAY_AMPLITUDE + 1e-6);
    }
}
