//! Scheduled-task control for the automatic downloader, `schtasks` based.
//!
//! The task itself is registered by the installer; this module only
//! queries, toggles and triggers it. Platforms without a task scheduler
//! report the feature as unavailable instead of erroring.

use anyhow::Result;

/// Scheduled-task name registered by the installer.
pub const TASK_NAME: &str = "BingwallDownloader";

#[cfg(target_os = "windows")]
pub fn is_auto_download_enabled() -> bool {
    use std::process::Command;

    let output = match Command::new("schtasks")
        .args(["/Query", "/TN", TASK_NAME, "/FO", "LIST"])
        .output()
    {
        Ok(output) => output,
        Err(_) => return false,
    };
    if !output.status.success() {
        return false;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().any(|line| {
        (line.contains("Status:") || line.contains("Scheduled Task State:"))
            && (line.contains("Ready") || line.contains("Running") || line.contains("Enabled"))
    })
}

/// Enable or disable the scheduled task; `Ok(false)` when schtasks refused.
#[cfg(target_os = "windows")]
pub fn set_auto_download(enabled: bool) -> Result<bool> {
    use std::process::Command;

    let flag = if enabled { "/ENABLE" } else { "/DISABLE" };
    let output = Command::new("schtasks")
        .args(["/Change", "/TN", TASK_NAME, flag])
        .output()?;
    Ok(output.status.success())
}

/// Trigger an immediate run of the scheduled task.
#[cfg(target_os = "windows")]
pub fn run_download_task() -> Result<bool> {
    use std::process::Command;

    let output = Command::new("schtasks")
        .args(["/Run", "/TN", TASK_NAME])
        .output()?;
    Ok(output.status.success())
}

#[cfg(not(target_os = "windows"))]
pub fn is_auto_download_enabled() -> bool {
    false
}

#[cfg(not(target_os = "windows"))]
pub fn set_auto_download(_enabled: bool) -> Result<bool> {
    Ok(false)
}

#[cfg(not(target_os = "windows"))]
pub fn run_download_task() -> Result<bool> {
    Ok(false)
}
