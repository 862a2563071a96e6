use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;

use crate::room::{Gradient, RoomConfig, RoomKind};

/// Room viewer for VRM avatars.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Path to a .vrm avatar to load at startup.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Room theme tag (vault, mansion, museum, ...). Unknown tags fall back
    /// to an empty room.
    #[arg(long, default_value = "plain")]
    pub room: String,

    /// Window title override.
    #[arg(long)]
    pub title: Option<String>,

    /// Background gradient as "#rrggbb,#rrggbb" (top, bottom).
    #[arg(long)]
    pub bg: Option<String>,

    /// JSON roster of avatars selectable at runtime.
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Roster keys to load at startup (repeatable or comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Seed for scenery randomness.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Load everything, print a summary, and exit without opening a window.
    #[arg(long)]
    pub headless: bool,
}

impl Args {
    pub fn room_config(&self) -> Result<RoomConfig> {
        let background = match &self.bg {
            Some(spec) => Gradient::parse(spec)
                .with_context(|| format!("invalid --bg gradient '{spec}'"))?,
            None => Gradient::default(),
        };
        let room = RoomKind::from_tag(&self.room);
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| format!("VRM Room - {}", room.label()));
        Ok(RoomConfig {
            model: self.model.clone(),
            room,
            title,
            background,
        })
    }
}

/// One selectable avatar in a roster file.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    pub key: String,
    pub name: String,
    pub file: PathBuf,
}

/// Read a roster JSON file: an array of `{key, name, file}` objects.
/// Relative `file` paths resolve against the roster's own directory.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    let mut entries: Vec<RosterEntry> = serde_json::from_str(&text)
        .with_context(|| format!("parsing roster {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for entry in &mut entries {
        if entry.file.is_relative() {
            entry.file = base.join(&entry.file);
        }
    }
    for (i, entry) in entries.iter().enumerate() {
        if entries[..i].iter().any(|other| other.key == entry.key) {
            bail!("roster {} repeats key '{}'", path.display(), entry.key);
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn roster_parses_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = dir.path().join("roster.json");
        let mut file = fs::File::create(&roster_path).unwrap();
        write!(
            file,
            r#"[
                {{"key": "abbey", "name": "Abbey", "file": "abbey.vrm"}},
                {{"key": "juno", "name": "Juno", "file": "/abs/juno.vrm"}}
            ]"#
        )
        .unwrap();

        let entries = load_roster(&roster_path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, dir.path().join("abbey.vrm"));
        assert_eq!(entries[1].file, PathBuf::from("/abs/juno.vrm"));
    }

    #[test]
    fn roster_rejects_duplicate_keys() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = dir.path().join("roster.json");
        fs::write(
            &roster_path,
            r#"[{"key": "a", "name": "A", "file": "a.vrm"},
                {"key": "a", "name": "B", "file": "b.vrm"}]"#,
        )
        .unwrap();
        let err = load_roster(&roster_path).unwrap_err();
        assert!(err.to_string().contains("repeats key"));
    }

    #[test]
    fn args_build_a_room_config() {
        let args = Args::parse_from([
            "vrm_viewer",
            "--room",
            "museum",
            "--bg",
            "#102030,#000000",
        ]);
        let config = args.room_config().unwrap();
        assert_eq!(config.room, RoomKind::Museum);
        assert!((config.background.top[0] - 0x10 as f32 / 255.0).abs() < 1e-6);
        assert!(config.model.is_none());
    }

    #[test]
    fn bad_gradient_is_rejected() {
        let args = Args::parse_from(["vrm_viewer", "--bg", "red,blue"]);
        assert!(args.room_config().is_err());
    }
}
