use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::archive::{fetch_descriptor, ImageDescriptor};
use crate::candidates::build_candidate_urls;
use crate::download::{download_first, Download};
use crate::error::Result;
use crate::naming::{build_filename, NameMode};

/// The service retains at most eight days of history.
pub const MAX_HISTORY: usize = 8;

/// Policy when the derived filename already exists on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictMode {
    /// Keep the existing file and count it as saved.
    #[default]
    Skip,
    /// Append `_1`, `_2`, ... to the stem until an unused name is found.
    Unique,
    /// Replace the existing file unconditionally.
    Overwrite,
}

impl std::str::FromStr for ConflictMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skip" => Ok(ConflictMode::Skip),
            "unique" => Ok(ConflictMode::Unique),
            "overwrite" => Ok(ConflictMode::Overwrite),
            other => Err(format!(
                "unknown conflict mode '{}', expected skip, unique or overwrite",
                other
            )),
        }
    }
}

impl std::fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConflictMode::Skip => "skip",
            ConflictMode::Unique => "unique",
            ConflictMode::Overwrite => "overwrite",
        })
    }
}

/// Everything one run needs, passed in explicitly instead of read from
/// process-global state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub market: String,
    pub fallback_markets: Vec<String>,
    pub resolutions: Vec<String>,
    pub output_dir: PathBuf,
    pub count: usize,
    pub conflict_mode: ConflictMode,
    pub name_mode: NameMode,
    pub set_latest: bool,
}

impl RunConfig {
    /// Primary market first, then the fallbacks in order.
    pub fn markets(&self) -> Vec<String> {
        let mut markets = vec![self.market.clone()];
        markets.extend(self.fallback_markets.iter().cloned());
        markets
    }

    fn offsets(&self) -> usize {
        self.count.clamp(1, MAX_HISTORY)
    }
}

/// Outcome of one orchestrator run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files considered saved this run, including ones left untouched
    /// under the skip policy.
    pub saved: Vec<PathBuf>,
    /// Path for day offset 0, input to the optional wallpaper step.
    pub latest: Option<PathBuf>,
}

impl RunSummary {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}

/// Walk day offsets 0..N, saving the first usable image per offset.
///
/// Per-market and per-offset failures are logged and skipped; the run
/// itself only fails on filesystem errors.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    fs::create_dir_all(&config.output_dir)?;
    let markets = config.markets();
    info!(markets = ?markets, resolutions = ?config.resolutions, "starting download run");

    let mut summary = RunSummary::default();
    for idx in 0..config.offsets() {
        let Some((download, descriptor)) = pick_and_download(&markets, idx, &config.resolutions)
        else {
            warn!(idx, "no market yielded a usable image for this offset");
            continue;
        };
        let filename = build_filename(&descriptor, Some(&download.content_type), config.name_mode);
        let target = config.output_dir.join(&filename);
        let target = save_with_policy(target, &download.bytes, config.conflict_mode)?;
        if idx == 0 {
            summary.latest = Some(target.clone());
        }
        summary.saved.push(target);
    }
    Ok(summary)
}

/// First market that produces an accepted download wins; the remaining
/// markets are not contacted.
fn pick_and_download(
    markets: &[String],
    idx: usize,
    resolutions: &[String],
) -> Option<(Download, ImageDescriptor)> {
    let mut last_error = None;
    for market in markets {
        let descriptor = match fetch_descriptor(market, idx) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        };
        let urls = build_candidate_urls(&descriptor, resolutions);
        if urls.is_empty() {
            // No url fragments at all means "no image available" here.
            continue;
        }
        match download_first(&urls) {
            Ok(download) => return Some((download, descriptor)),
            Err(e) => last_error = Some(e),
        }
    }
    if let Some(error) = last_error {
        warn!(idx, error = %error, "every market failed for this offset");
    }
    None
}

/// Apply the conflict policy; returns the path that now counts as saved.
fn save_with_policy(target: PathBuf, bytes: &[u8], mode: ConflictMode) -> Result<PathBuf> {
    match mode {
        ConflictMode::Skip if target.exists() => {
            info!(path = %target.display(), "keeping existing file");
            Ok(target)
        }
        ConflictMode::Unique => {
            let target = next_unique_path(target);
            fs::write(&target, bytes)?;
            info!(path = %target.display(), "saved");
            Ok(target)
        }
        ConflictMode::Skip | ConflictMode::Overwrite => {
            fs::write(&target, bytes)?;
            info!(path = %target.display(), "saved");
            Ok(target)
        }
    }
}

/// Append `_1`, `_2`, ... to the stem until the name is unused.
fn next_unique_path(base: PathBuf) -> PathBuf {
    if !base.exists() {
        return base;
    }
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    let extension = base
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let parent = base.parent().map(Path::to_path_buf).unwrap_or_default();
    for i in 1u32.. {
        let candidate = parent.join(format!("{}_{}{}", stem, i, extension));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &Path) -> RunConfig {
        RunConfig {
            market: "de-DE".to_string(),
            fallback_markets: vec!["en-US".to_string(), "ja-JP".to_string()],
            resolutions: vec!["UHD".to_string()],
            output_dir: dir.to_path_buf(),
            count: 8,
            conflict_mode: ConflictMode::Skip,
            name_mode: NameMode::Slug,
            set_latest: false,
        }
    }

    #[test]
    fn markets_lists_primary_first() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        assert_eq!(config.markets(), ["de-DE", "en-US", "ja-JP"]);
    }

    #[test]
    fn offsets_clamped_to_service_history() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path());
        config.count = 20;
        assert_eq!(config.offsets(), MAX_HISTORY);
        config.count = 0;
        assert_eq!(config.offsets(), 1);
        config.count = 3;
        assert_eq!(config.offsets(), 3);
    }

    #[test]
    fn conflict_mode_parses() {
        assert_eq!("skip".parse::<ConflictMode>().unwrap(), ConflictMode::Skip);
        assert_eq!(
            "unique".parse::<ConflictMode>().unwrap(),
            ConflictMode::Unique
        );
        assert_eq!(
            "overwrite".parse::<ConflictMode>().unwrap(),
            ConflictMode::Overwrite
        );
        assert!("nope".parse::<ConflictMode>().is_err());
    }

    #[test]
    fn unique_path_suffixes_until_free() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("2025-01-17_Test.jpg");
        assert_eq!(next_unique_path(base.clone()), base);

        fs::write(&base, b"x").unwrap();
        let first = next_unique_path(base.clone());
        assert_eq!(first, dir.path().join("2025-01-17_Test_1.jpg"));

        fs::write(&first, b"x").unwrap();
        assert_eq!(
            next_unique_path(base),
            dir.path().join("2025-01-17_Test_2.jpg")
        );
    }

    #[test]
    fn skip_mode_keeps_existing_bytes() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        fs::write(&target, b"original").unwrap();
        let saved = save_with_policy(target.clone(), b"replacement", ConflictMode::Skip).unwrap();
        assert_eq!(saved, target);
        assert_eq!(fs::read(&target).unwrap(), b"original");
    }

    #[test]
    fn skip_mode_writes_missing_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        let saved = save_with_policy(target.clone(), b"bytes", ConflictMode::Skip).unwrap();
        assert_eq!(saved, target);
        assert_eq!(fs::read(&target).unwrap(), b"bytes");
    }

    #[test]
    fn overwrite_mode_replaces_existing_bytes() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        fs::write(&target, b"original").unwrap();
        let saved =
            save_with_policy(target.clone(), b"replacement", ConflictMode::Overwrite).unwrap();
        assert_eq!(saved, target);
        assert_eq!(fs::read(&target).unwrap(), b"replacement");
    }

    #[test]
    fn unique_mode_never_touches_existing_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        fs::write(&target, b"original").unwrap();
        let saved = save_with_policy(target.clone(), b"new", ConflictMode::Unique).unwrap();
        assert_eq!(saved, dir.path().join("a_1.jpg"));
        assert_eq!(fs::read(&target).unwrap(), b"original");
        assert_eq!(fs::read(&saved).unwrap(), b"new");
    }
}
