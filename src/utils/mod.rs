use std::future::Future;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::{Result, SubtitlrError};

/// Run a pipeline stage, aborting it if the cancellation token fires first
pub async fn cancellable<T, F>(cancel: &CancellationToken, stage: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::warn!("Cancellation requested during {}", stage);
            Err(SubtitlrError::Cancelled(stage))
        }
        result = fut => result,
    }
}

/// Fail fast when cancellation was requested before a stage starts
pub fn ensure_not_cancelled(cancel: &CancellationToken, stage: &'static str) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(SubtitlrError::Cancelled(stage));
    }
    Ok(())
}

/// Create a spinner for a long-running stage; hidden when progress is disabled
pub fn spinner(message: &str, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(120));
    progress.set_message(message.to_string());
    progress
}

/// Validate the spoken language passed to the transcription API (ISO 639-1)
pub fn validate_spoken_language(lang: &str) -> Result<String> {
    let lang = lang.trim();
    if lang.len() != 2 || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SubtitlrError::Validation(format!(
            "language must be a two-letter ISO 639-1 code, got '{}'",
            lang
        )));
    }

    Ok(lang.to_ascii_lowercase())
}

/// Normalize a translation target language ("de", "en-us", "PT-BR") to the
/// uppercase form the document API expects
pub fn normalize_target_language(lang: &str) -> Result<String> {
    let lang = lang.trim();
    let mut parts = lang.split('-');
    let primary = parts.next().unwrap_or_default();
    let region = parts.next();

    let primary_ok = primary.len() == 2 && primary.chars().all(|c| c.is_ascii_alphabetic());
    let region_ok = region.map_or(true, |r| {
        (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphabetic())
    });

    if !primary_ok || !region_ok || parts.next().is_some() {
        return Err(SubtitlrError::Validation(format!(
            "target language must look like 'de' or 'en-US', got '{}'",
            lang
        )));
    }

    Ok(lang.to_ascii_uppercase())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Size of a file on disk, or zero when it cannot be read
pub fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Check if the current environment has the external tools the generate
/// command needs
pub async fn check_dependencies(downloader: &str, converter: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(downloader, "--version").await {
        missing.push(format!("{} - required to download YouTube videos", downloader));
    }

    if !check_command_available(converter, "-version").await {
        missing.push(format!("{} - required to extract the audio track", converter));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, version_flag: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Write a shell script to `dir/name` and mark it executable
#[cfg(all(test, unix))]
pub(crate) fn write_executable(dir: &Path, name: &str, script: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs_err::write(&path, script).unwrap();
    fs_err::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
