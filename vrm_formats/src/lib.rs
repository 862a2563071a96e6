pub mod glb;
pub mod vrm;

pub use glb::{GlbChunk, GlbFile};
pub use vrm::{Aabb, VrmDocument, VrmMesh};
