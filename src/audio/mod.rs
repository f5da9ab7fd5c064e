use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::utils;
use crate::{Result, SubtitlrError};

/// Fixed bitrate of the extracted audio track
pub const AUDIO_BITRATE: &str = "64k";

/// Converts a downloaded video container into a compressed audio file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Write the audio track of `container` to `audio` and return its path
    async fn extract(&self, container: &Path, audio: &Path) -> Result<PathBuf>;
}

/// Audio extractor backed by the ffmpeg executable
pub struct FfmpegConverter {
    ffmpeg_path: String,
    timeout: Duration,
    show_progress: bool,
}

impl FfmpegConverter {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Arguments for the fixed profile: MP3, 64 kbit/s, channels untouched, no video
    pub fn conversion_args(container: &Path, audio: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            container.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-f".to_string(),
            "mp3".to_string(),
            "-ab".to_string(),
            AUDIO_BITRATE.to_string(),
            audio.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn extract(&self, container: &Path, audio: &Path) -> Result<PathBuf> {
        tracing::debug!("Converting {} to MP3", container.display());
        let progress = utils::spinner("Converting the video to audio...", self.show_progress);

        let child = Command::new(&self.ffmpeg_path)
            .args(Self::conversion_args(container, audio))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                progress.finish_and_clear();
                return Err(SubtitlrError::Timeout {
                    stage: "conversion",
                    after: self.timeout,
                });
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                progress.finish_and_clear();
                return Err(SubtitlrError::Conversion(format!(
                    "{} was not found on PATH; install ffmpeg to extract audio",
                    self.ffmpeg_path
                )));
            }
            Ok(Err(e)) => {
                progress.finish_and_clear();
                return Err(SubtitlrError::Conversion(format!(
                    "failed to run {}: {}",
                    self.ffmpeg_path, e
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            progress.finish_and_clear();
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(SubtitlrError::Conversion(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                error.trim()
            )));
        }

        progress.finish_with_message("Video converted to audio successfully!");
        tracing::info!(
            "Extracted {} of audio to {}",
            utils::format_file_size(utils::file_size(audio)),
            audio.display()
        );
        Ok(audio.to_path_buf())
    }
}
