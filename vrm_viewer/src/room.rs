//! Room configuration: the native analogue of the page-level data attributes
//! the original rooms were driven by. A room names a model file, a scenery
//! theme, a window title, and a background gradient; all of it is fixed for
//! the lifetime of the viewer.

use std::path::PathBuf;

use anyhow::{Result, bail, ensure};

/// Scenery themes. Tags are matched case-insensitively and anything outside
/// the known set falls back to `Plain`, which draws no extra scenery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Vault,
    Mansion,
    Museum,
    Influencer,
    Lab,
    Relay,
    Compliance,
    Judge,
    Restaurant,
    Dojo,
    Observatory,
    Cathedral,
    Library,
    Plain,
}

impl RoomKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "vault" => RoomKind::Vault,
            "mansion" => RoomKind::Mansion,
            "museum" => RoomKind::Museum,
            "influencer" => RoomKind::Influencer,
            "lab" => RoomKind::Lab,
            "relay" => RoomKind::Relay,
            "compliance" => RoomKind::Compliance,
            "judge" => RoomKind::Judge,
            "restaurant" => RoomKind::Restaurant,
            "dojo" => RoomKind::Dojo,
            "observatory" => RoomKind::Observatory,
            "cathedral" => RoomKind::Cathedral,
            "library" => RoomKind::Library,
            _ => RoomKind::Plain,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RoomKind::Vault => "vault",
            RoomKind::Mansion => "mansion",
            RoomKind::Museum => "museum",
            RoomKind::Influencer => "influencer",
            RoomKind::Lab => "lab",
            RoomKind::Relay => "relay",
            RoomKind::Compliance => "compliance",
            RoomKind::Judge => "judge",
            RoomKind::Restaurant => "restaurant",
            RoomKind::Dojo => "dojo",
            RoomKind::Observatory => "observatory",
            RoomKind::Cathedral => "cathedral",
            RoomKind::Library => "library",
            RoomKind::Plain => "plain",
        }
    }
}

/// Vertical background gradient, top and bottom colors as normalized RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub top: [f32; 3],
    pub bottom: [f32; 3],
}

impl Default for Gradient {
    fn default() -> Self {
        // The original page palette: #0b0f16 over #0a0e1a.
        Self {
            top: rgb(0x0b0f16),
            bottom: rgb(0x0a0e1a),
        }
    }
}

impl Gradient {
    /// Parse a `"#rrggbb,#rrggbb"` pair as supplied via `--bg`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut colors = spec.split(',');
        let top = parse_hex_color(colors.next().unwrap_or_default())?;
        let bottom = parse_hex_color(
            colors
                .next()
                .ok_or_else(|| anyhow::anyhow!("gradient {spec:?} needs two comma-separated colors"))?,
        )?;
        ensure!(
            colors.next().is_none(),
            "gradient {spec:?} has more than two colors"
        );
        Ok(Self { top, bottom })
    }
}

pub fn parse_hex_color(text: &str) -> Result<[f32; 3]> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 {
        bail!("color {text:?} is not #rrggbb");
    }
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| anyhow::anyhow!("color {text:?} is not valid hex"))?;
    Ok(rgb(value))
}

pub const fn rgb(value: u32) -> [f32; 3] {
    [
        ((value >> 16) & 0xff) as f32 / 255.0,
        ((value >> 8) & 0xff) as f32 / 255.0,
        (value & 0xff) as f32 / 255.0,
    ]
}

#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub model: Option<PathBuf>,
    pub room: RoomKind,
    pub title: String,
    pub background: Gradient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse_case_insensitively() {
        assert_eq!(RoomKind::from_tag("Vault"), RoomKind::Vault);
        assert_eq!(RoomKind::from_tag("  LIBRARY "), RoomKind::Library);
        assert_eq!(RoomKind::from_tag("dojo"), RoomKind::Dojo);
    }

    #[test]
    fn unknown_tags_fall_back_to_plain() {
        assert_eq!(RoomKind::from_tag("palace"), RoomKind::Plain);
        assert_eq!(RoomKind::from_tag(""), RoomKind::Plain);
    }

    #[test]
    fn gradient_parses_hex_pair() {
        let gradient = Gradient::parse("#0b0f16,#0a0e1a").unwrap();
        assert_eq!(gradient, Gradient::default());
    }

    #[test]
    fn gradient_rejects_malformed_specs() {
        assert!(Gradient::parse("#0b0f16").is_err());
        assert!(Gradient::parse("#0b0f16,#xyzxyz").is_err());
        assert!(Gradient::parse("#0b0f16,#0a0e1a,#ffffff").is_err());
    }

    #[test]
    fn rgb_unpacks_channels() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        let [r, g, b] = rgb(0x102238);
        assert!((r - 16.0 / 255.0).abs() < 1e-6);
        assert!((g - 34.0 / 255.0).abs() < 1e-6);
        assert!((b - 56.0 / 255.0).abs() < 1e-6);
    }
}
