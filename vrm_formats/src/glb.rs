//! Binary glTF (GLB) container framing. A GLB file is a 12-byte header
//! followed by length-prefixed chunks; VRM avatars ship as GLB version 2 with
//! a `JSON` chunk holding the glTF document and an optional `BIN` chunk
//! holding accessor payloads.

use anyhow::{Result, bail, ensure};

const HEADER_SIZE: usize = 12;
const CHUNK_HEADER_SIZE: usize = 8;

pub const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A; // "JSON"
pub const CHUNK_TYPE_BIN: u32 = 0x004E_4942; // "BIN\0"

#[derive(Debug, Clone)]
pub struct GlbChunk {
    pub chunk_type: u32,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct GlbFile {
    pub json: Vec<u8>,
    pub bin: Option<Vec<u8>>,
}

impl GlbFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= HEADER_SIZE,
            "GLB container is too small to hold a header ({} bytes)",
            bytes.len()
        );

        if &bytes[0..4] != b"glTF" {
            bail!("GLB container missing glTF magic");
        }

        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        ensure!(version == 2, "unsupported GLB version {version} (expected 2)");

        let declared_length = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        ensure!(
            declared_length >= HEADER_SIZE,
            "GLB header declares {declared_length} bytes, less than its own header"
        );
        ensure!(
            declared_length <= bytes.len(),
            "GLB header declares {declared_length} bytes but only {} are present",
            bytes.len()
        );

        let mut json = None;
        let mut bin = None;
        for chunk in walk_chunks(&bytes[HEADER_SIZE..declared_length])? {
            match chunk.chunk_type {
                CHUNK_TYPE_JSON if json.is_none() => json = Some(chunk.data),
                CHUNK_TYPE_BIN if bin.is_none() => bin = Some(chunk.data),
                // Unknown chunk types are skipped per the glTF spec.
                _ => {}
            }
        }

        let json = json.ok_or_else(|| anyhow::anyhow!("GLB container has no JSON chunk"))?;
        ensure!(!json.is_empty(), "GLB JSON chunk is empty");

        Ok(GlbFile { json, bin })
    }
}

fn walk_chunks(mut body: &[u8]) -> Result<Vec<GlbChunk>> {
    let mut chunks = Vec::new();
    while !body.is_empty() {
        ensure!(
            body.len() >= CHUNK_HEADER_SIZE,
            "GLB chunk table truncated ({} trailing bytes)",
            body.len()
        );
        let length = u32::from_le_bytes(body[0..4].try_into().unwrap()) as usize;
        let chunk_type = u32::from_le_bytes(body[4..8].try_into().unwrap());
        let end = CHUNK_HEADER_SIZE
            .checked_add(length)
            .ok_or_else(|| anyhow::anyhow!("GLB chunk length overflow"))?;
        ensure!(
            end <= body.len(),
            "GLB chunk of {length} bytes runs past the end of the container"
        );
        chunks.push(GlbChunk {
            chunk_type,
            data: body[CHUNK_HEADER_SIZE..end].to_vec(),
        });
        body = &body[end..];
    }
    Ok(chunks)
}

#[cfg(test)]
pub(crate) fn build_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    let mut chunks = Vec::new();
    let mut push_chunk = |chunk_type: u32, data: &[u8]| {
        // Chunks are 4-byte aligned; JSON pads with spaces, BIN with zeros.
        let pad_byte = if chunk_type == CHUNK_TYPE_JSON { b' ' } else { 0 };
        let padded_len = data.len().div_ceil(4) * 4;
        chunks.extend_from_slice(&(padded_len as u32).to_le_bytes());
        chunks.extend_from_slice(&chunk_type.to_le_bytes());
        chunks.extend_from_slice(data);
        chunks.resize(chunks.len() + (padded_len - data.len()), pad_byte);
    };
    push_chunk(CHUNK_TYPE_JSON, json);
    if let Some(bin) = bin {
        push_chunk(CHUNK_TYPE_BIN, bin);
    }

    let mut out = Vec::with_capacity(HEADER_SIZE + chunks.len());
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&((HEADER_SIZE + chunks.len()) as u32).to_le_bytes());
    out.extend_from_slice(&chunks);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_bin_chunks() {
        let bytes = build_glb(br#"{"asset":{"version":"2.0"}}"#, Some(&[1, 2, 3, 4]));
        let glb = GlbFile::parse(&bytes).unwrap();
        assert!(glb.json.starts_with(br#"{"asset""#));
        assert_eq!(glb.bin.as_deref(), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn json_chunk_alone_is_valid() {
        let bytes = build_glb(br#"{"asset":{"version":"2.0"}}"#, None);
        let glb = GlbFile::parse(&bytes).unwrap();
        assert!(glb.bin.is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build_glb(b"{}", None);
        bytes[0..4].copy_from_slice(b"NOPE");
        let err = GlbFile::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("magic"), "{err}");
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = build_glb(b"{}", None);
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes());
        let err = GlbFile::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"), "{err}");
    }

    #[test]
    fn rejects_truncated_chunk() {
        let mut bytes = build_glb(br#"{"asset":{"version":"2.0"}}"#, None);
        // Claim a chunk larger than the remaining body.
        bytes[12..16].copy_from_slice(&0xFFFF_u32.to_le_bytes());
        // Keep the declared container length in sync with the buffer.
        assert!(GlbFile::parse(&bytes).is_err());
    }

    #[test]
    fn rejects_declared_length_shorter_than_the_header() {
        let mut bytes = build_glb(br#"{"asset":{"version":"2.0"}}"#, None);
        bytes[8..12].copy_from_slice(&4u32.to_le_bytes());
        let err = GlbFile::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("less than its own header"), "{err}");
    }

    #[test]
    fn rejects_missing_json_chunk() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"glTF");
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&12u32.to_le_bytes());
        let err = GlbFile::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("JSON"), "{err}");
    }
}
