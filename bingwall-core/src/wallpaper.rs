use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

/// Ask the OS to set `path` as the desktop background.
pub fn set_wallpaper(path: &Path) -> Result<()> {
    let location = path.to_string_lossy();
    match wallpaper::set_from_path(&location) {
        Ok(()) => {
            info!(path = %location, "wallpaper applied");
            Ok(())
        }
        Err(e) => {
            #[cfg(target_os = "linux")]
            {
                tracing::warn!(error = %e, "wallpaper crate failed, trying desktop fallback");
                set_wallpaper_fallback(path)
            }
            #[cfg(not(target_os = "linux"))]
            {
                Err(Error::WallpaperApply(e.to_string()))
            }
        }
    }
}

/// Path of the wallpaper currently applied, when the OS reports one.
pub fn current_wallpaper() -> Option<PathBuf> {
    wallpaper::get()
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

#[cfg(target_os = "linux")]
fn set_wallpaper_fallback(path: &Path) -> Result<()> {
    use std::process::Command;

    let location = path.to_string_lossy();
    let location: &str = location.as_ref();
    let desktop = desktop_environment();
    let status = match desktop.as_str() {
        "gnome" | "unity" | "cinnamon" => {
            let uri = format!("file://{}", location);
            Command::new("gsettings")
                .args(["set", "org.gnome.desktop.background", "picture-uri", &uri])
                .status()
        }
        "mate" => Command::new("gsettings")
            .args(["set", "org.mate.background", "picture-filename", location])
            .status(),
        "xfce4" => Command::new("xfconf-query")
            .args([
                "-c",
                "xfce4-desktop",
                "-p",
                "/backdrop/screen0/monitor0/image-path",
                "-s",
                location,
            ])
            .status(),
        "lxde" => Command::new("pcmanfm")
            .args(["--set-wallpaper", location, "--wallpaper-mode=scaled"])
            .status(),
        other => {
            return Err(Error::WallpaperApply(format!(
                "desktop environment '{}' not supported",
                other
            )))
        }
    };
    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(Error::WallpaperApply(format!(
            "wallpaper setter exited with {}",
            status
        ))),
        Err(e) => Err(Error::WallpaperApply(e.to_string())),
    }
}

#[cfg(target_os = "linux")]
fn desktop_environment() -> String {
    if let Ok(session) = std::env::var("DESKTOP_SESSION") {
        let session = session.to_lowercase();
        if ["gnome", "unity", "cinnamon", "mate", "xfce4", "lxde", "kde"]
            .contains(&session.as_str())
        {
            return session;
        }
        if session.contains("xfce") || session.starts_with("xubuntu") {
            return "xfce4".to_string();
        }
        if session.starts_with("lubuntu") {
            return "lxde".to_string();
        }
        if session.starts_with("ubuntu") {
            return "gnome".to_string();
        }
    }
    if std::env::var("GNOME_DESKTOP_SESSION_ID").is_ok() {
        return "gnome".to_string();
    }
    "unknown".to_string()
}
