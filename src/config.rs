use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Presentation settings. Gameplay constants live in `Rules`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) emoji: bool,
    /// 0 seeds from the clock.
    pub(crate) seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            emoji: true,
            seed: 0,
        }
    }
}

impl Settings {
    pub(crate) fn session_seed(&self) -> u64 {
        if self.seed != 0 {
            return self.seed;
        }
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .map(|n| n as u64)
            .unwrap_or(0xC0FFEE)
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "emojipet", "EmojiPet")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data dir {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("emojipet.log"),
    })
}

/// Missing or unreadable settings fall back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("replacing {}", to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("emojipet-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join("settings.json")
    }

    #[test]
    fn settings_survive_a_save_and_load() {
        let path = scratch("save");
        let s = Settings {
            fps_cap: 60,
            enable_color: false,
            emoji: false,
            seed: 7,
        };
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_or_partial_files_fall_back() {
        let path = scratch("corrupt");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());

        fs::write(&path, r#"{ "fps_cap": 12 }"#).unwrap();
        let s = load_settings(&path);
        assert_eq!(s.fps_cap, 12);
        assert!(s.emoji);
    }

    #[test]
    fn fixed_seed_is_used_verbatim() {
        let s = Settings {
            seed: 99,
            ..Settings::default()
        };
        assert_eq!(s.session_seed(), 99);
    }
}
