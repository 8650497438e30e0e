use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::naming::NameMode;
use crate::run::ConflictMode;

/// Persisted user settings, `config.json` in the platform config directory.
///
/// Missing fields fall back to their defaults, so older config files keep
/// loading after upgrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub market: String,
    /// Comma-separated market codes tried after the primary one.
    pub fallback_markets: String,
    pub image_count: usize,
    pub download_folder: PathBuf,
    /// Comma-separated resolution tags, most preferred first.
    pub resolution: String,
    pub file_mode: ConflictMode,
    pub name_mode: NameMode,
    pub set_latest: bool,
    /// Set by the tray when the user browsed away from the newest image.
    pub user_paused: bool,
    pub last_manual_selection: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            market: "de-DE".to_string(),
            fallback_markets: "en-US".to_string(),
            image_count: 8,
            download_folder: default_download_folder(),
            resolution: "UHD,3840x2160,2560x1440,1920x1200,1920x1080".to_string(),
            file_mode: ConflictMode::Skip,
            name_mode: NameMode::Slug,
            set_latest: false,
            user_paused: false,
            last_manual_selection: None,
        }
    }
}

impl Settings {
    /// Load settings, seeding the config file with defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                Ok(Settings::default())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn fallback_market_list(&self) -> Vec<String> {
        split_list(&self.fallback_markets)
    }

    pub fn resolution_list(&self) -> Vec<String> {
        split_list(&self.resolution)
    }
}

/// Split a comma-separated config value, trimming and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `config.json` under the platform config directory.
pub fn config_file() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "bingwall", "bingwall")
        .context("failed to resolve project directories")?;
    Ok(proj_dirs.config_dir().join("config.json"))
}

fn default_download_folder() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.picture_dir().map(|p| p.join("BingWallpapers")))
        .unwrap_or_else(|| PathBuf::from("BingWallpapers"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_seeds_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.market, "de-DE");
        assert_eq!(settings.image_count, 8);
        assert!(path.exists());
    }

    #[test]
    fn invalid_json_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "invalid json {{{").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.fallback_markets, "en-US");
        assert_eq!(settings.file_mode, ConflictMode::Skip);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"market": "en-GB", "image_count": 5}"#).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.market, "en-GB");
        assert_eq!(settings.image_count, 5);
        assert_eq!(settings.name_mode, NameMode::Slug);
    }

    #[test]
    fn roundtrip_preserves_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            market: "ja-JP".to_string(),
            file_mode: ConflictMode::Unique,
            user_paused: true,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.market, "ja-JP");
        assert_eq!(loaded.file_mode, ConflictMode::Unique);
        assert!(loaded.user_paused);
    }

    #[test]
    fn list_splitting_trims_and_drops_empties() {
        assert_eq!(split_list(" en-US , ja-JP ,, "), ["en-US", "ja-JP"]);
        assert!(split_list("").is_empty());
    }
}
