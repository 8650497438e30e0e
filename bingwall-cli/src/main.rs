use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use bingwall_core::conf::split_list;
use bingwall_core::{run, set_wallpaper, RunConfig, Settings};

#[derive(Parser)]
#[command(name = "bingwall")]
#[command(about = "Downloads Bing's image of the day with market and resolution fallback")]
#[command(version)]
struct Cli {
    /// Primary market, e.g. de-DE
    #[arg(long = "mkt")]
    market: Option<String>,

    /// Comma-separated fallback markets
    #[arg(long = "fallback-mkts")]
    fallback_markets: Option<String>,

    /// Day offsets to fetch, capped at the service's 8-day history
    #[arg(long)]
    count: Option<usize>,

    /// Output directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Comma-separated resolution tags, most preferred first
    #[arg(long)]
    res: Option<String>,

    /// skip: keep an existing file; unique: append _1, _2, ...; overwrite: replace
    #[arg(long)]
    mode: Option<String>,

    /// slug: name from the OHR url fragment; title: name from the image title
    #[arg(long = "name-mode")]
    name_mode: Option<String>,

    /// Set the newest downloaded image as wallpaper afterwards
    #[arg(long = "set-latest")]
    set_latest: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    let config = build_run_config(&cli, &settings)?;

    let summary = run(&config)?;
    if summary.is_empty() {
        println!("Nothing to do: no images downloaded and none already present.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Saved:");
    for path in &summary.saved {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            println!("- {}", name);
        }
    }

    if config.set_latest {
        if let Some(latest) = &summary.latest {
            if let Err(e) = set_wallpaper(latest) {
                error!(error = %e, "failed to set wallpaper");
                return Ok(ExitCode::FAILURE);
            }
            println!("Wallpaper set: {}", latest.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// File settings first, CLI flags override field by field.
fn build_run_config(cli: &Cli, settings: &Settings) -> Result<RunConfig> {
    let conflict_mode = match &cli.mode {
        Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
        None => settings.file_mode,
    };
    let name_mode = match &cli.name_mode {
        Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
        None => settings.name_mode,
    };
    let fallback_markets = match &cli.fallback_markets {
        Some(raw) => split_list(raw),
        None => settings.fallback_market_list(),
    };
    let resolutions = match &cli.res {
        Some(raw) => split_list(raw),
        None => settings.resolution_list(),
    };

    Ok(RunConfig {
        market: cli
            .market
            .clone()
            .unwrap_or_else(|| settings.market.clone()),
        fallback_markets,
        resolutions,
        output_dir: cli
            .out
            .clone()
            .unwrap_or_else(|| settings.download_folder.clone()),
        count: cli.count.unwrap_or(settings.image_count),
        conflict_mode,
        name_mode,
        set_latest: cli.set_latest || settings.set_latest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bingwall_core::{ConflictMode, NameMode};

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("bingwall").chain(args.iter().copied()))
    }

    #[test]
    fn flags_override_settings() {
        let settings = Settings::default();
        let cli = cli(&[
            "--mkt",
            "en-GB",
            "--res",
            "1920x1080",
            "--mode",
            "unique",
            "--name-mode",
            "title",
            "--count",
            "3",
        ]);
        let config = build_run_config(&cli, &settings).unwrap();
        assert_eq!(config.market, "en-GB");
        assert_eq!(config.resolutions, ["1920x1080"]);
        assert_eq!(config.conflict_mode, ConflictMode::Unique);
        assert_eq!(config.name_mode, NameMode::Title);
        assert_eq!(config.count, 3);
    }

    #[test]
    fn settings_fill_unspecified_flags() {
        let settings = Settings::default();
        let config = build_run_config(&cli(&[]), &settings).unwrap();
        assert_eq!(config.market, settings.market);
        assert_eq!(config.fallback_markets, settings.fallback_market_list());
        assert_eq!(config.conflict_mode, settings.file_mode);
        assert!(!config.set_latest);
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let settings = Settings::default();
        assert!(build_run_config(&cli(&["--mode", "replace"]), &settings).is_err());
    }
}
