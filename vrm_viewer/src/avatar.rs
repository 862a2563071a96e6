//! Avatar loading. The loader probes for the resource first (the native
//! stand-in for the HEAD request the rooms issued), reads and parses it, and
//! insists on the VRM avatar marker before handing geometry back. Every
//! failure kind is terminal for that attempt: reported, never retried.
//!
//! Access to bytes goes through the [`AvatarSource`] strategy object so tests
//! and future transports can substitute their own fetch path instead of the
//! loader probing ambient capabilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use vrm_formats::{Aabb, VrmDocument, VrmMesh};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no model path provided")]
    MissingConfig,
    #[error("missing model: {path} ({status})")]
    NotFound { path: PathBuf, status: String },
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{path} has no VRM avatar extension")]
    MissingAvatarMarker { path: PathBuf },
}

/// Where avatar bytes come from. `probe` is the lightweight existence check
/// performed before any read; a probe failure is final, with no retry.
pub trait AvatarSource {
    fn probe(&self, path: &Path) -> Result<(), LoadError>;
    fn read(&self, path: &Path) -> Result<Vec<u8>, LoadError>;
}

/// Filesystem-backed source: probe via metadata, read the whole file.
#[derive(Debug, Default)]
pub struct FileAvatarSource;

impl AvatarSource for FileAvatarSource {
    fn probe(&self, path: &Path) -> Result<(), LoadError> {
        match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => Ok(()),
            Ok(_) => Err(LoadError::NotFound {
                path: path.to_path_buf(),
                status: "not a file".into(),
            }),
            Err(err) => Err(LoadError::NotFound {
                path: path.to_path_buf(),
                status: err.kind().to_string(),
            }),
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, LoadError> {
        fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A parsed avatar ready for placement: merged geometry, bounds, and the
/// display name the HUD reports.
#[derive(Debug, Clone)]
pub struct AvatarAsset {
    pub mesh: VrmMesh,
    pub bounds: Aabb,
    pub title: Option<String>,
    pub file_name: String,
}

pub fn load_avatar(source: &dyn AvatarSource, path: &Path) -> Result<AvatarAsset, LoadError> {
    source.probe(path)?;
    let bytes = source.read(path)?;

    let document = VrmDocument::parse_unchecked(&bytes).map_err(|err| LoadError::Parse {
        path: path.to_path_buf(),
        message: format!("{err:#}"),
    })?;
    if !document.has_avatar_marker() {
        return Err(LoadError::MissingAvatarMarker {
            path: path.to_path_buf(),
        });
    }

    let mesh = document.merged_mesh().map_err(|err| LoadError::Parse {
        path: path.to_path_buf(),
        message: format!("{err:#}"),
    })?;
    let bounds = document.bounds().map_err(|err| LoadError::Parse {
        path: path.to_path_buf(),
        message: format!("{err:#}"),
    })?;

    Ok(AvatarAsset {
        mesh,
        bounds,
        title: document.title().map(str::to_owned),
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    })
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use serde_json::json;

    /// Minimal single-triangle VRM as GLB bytes, for loader and session
    /// tests that need a real parseable avatar on disk.
    pub fn tiny_vrm(height: f32) -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [0.0, height, 0.0]];
        let mut bin = Vec::new();
        for position in positions {
            for component in position {
                bin.extend_from_slice(&component.to_le_bytes());
            }
        }
        for index in [0u16, 1, 2] {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);

        let gltf = json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": ["VRM"],
            "extensions": { "VRM": { "meta": { "title": "Fixture" } } },
            "nodes": [{ "mesh": 0 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
            "accessors": [
                {
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 3,
                    "type": "VEC3",
                    "min": [0.0, 0.0, 0.0],
                    "max": [0.5, height, 0.0]
                },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "buffers": [{ "byteLength": 44 }]
        });
        glb_bytes(&serde_json::to_vec(&gltf).unwrap(), &bin)
    }

    /// A valid GLB that is not an avatar (no VRM extension).
    pub fn plain_glb() -> Vec<u8> {
        let gltf = json!({ "asset": { "version": "2.0" } });
        glb_bytes(&serde_json::to_vec(&gltf).unwrap(), &[])
    }

    fn glb_bytes(json: &[u8], bin: &[u8]) -> Vec<u8> {
        let mut chunks = Vec::new();
        let mut push_chunk = |chunk_type: u32, data: &[u8], pad: u8| {
            let padded = data.len().div_ceil(4) * 4;
            chunks.extend_from_slice(&(padded as u32).to_le_bytes());
            chunks.extend_from_slice(&chunk_type.to_le_bytes());
            chunks.extend_from_slice(data);
            chunks.resize(chunks.len() + (padded - data.len()), pad);
        };
        push_chunk(0x4E4F_534A, json, b' ');
        if !bin.is_empty() {
            push_chunk(0x004E_4942, bin, 0);
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&((12 + chunks.len()) as u32).to_le_bytes());
        out.extend_from_slice(&chunks);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::{plain_glb, tiny_vrm};
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_avatar() {
        let file = write_temp(&tiny_vrm(1.7));
        let asset = load_avatar(&FileAvatarSource, file.path()).unwrap();
        assert_eq!(asset.mesh.triangle_count(), 1);
        assert_eq!(asset.title.as_deref(), Some("Fixture"));
        assert!((asset.bounds.size().y - 1.7).abs() < 1e-6);
    }

    #[test]
    fn missing_file_fails_the_probe() {
        let err = load_avatar(&FileAvatarSource, Path::new("/no/such/model.vrm")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }), "{err}");
        assert!(err.to_string().contains("/no/such/model.vrm"));
    }

    #[test]
    fn non_avatar_glb_reports_the_missing_marker() {
        let file = write_temp(&plain_glb());
        let err = load_avatar(&FileAvatarSource, file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingAvatarMarker { .. }), "{err}");
    }

    #[test]
    fn garbage_bytes_report_a_parse_failure() {
        let file = write_temp(b"this is not a model");
        let err = load_avatar(&FileAvatarSource, file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }), "{err}");
    }
}
