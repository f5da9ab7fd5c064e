use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use super::{VideoFetcher, VideoId};
use crate::utils;
use crate::{Result, SubtitlrError};

/// YouTube video fetcher using yt-dlp
pub struct YtDlpFetcher {
    yt_dlp_path: String,
    timeout: Duration,
    show_progress: bool,
}

/// The part of `yt-dlp --dump-json` we care about
#[derive(Debug, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
}

/// One downloadable variant of a video
#[derive(Debug, Clone, Deserialize)]
pub struct StreamFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub audio_channels: Option<u32>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl StreamFormat {
    /// Whether the variant reports an audio track
    pub fn has_audio(&self) -> bool {
        match self.audio_channels {
            Some(channels) => channels > 0,
            None => self.acodec.as_deref().map_or(false, |codec| codec != "none"),
        }
    }

    fn container_ext(&self) -> &str {
        self.ext.as_deref().filter(|e| !e.is_empty()).unwrap_or("mp4")
    }
}

/// Pick the first variant that carries audio. No quality negotiation.
pub fn select_audio_stream(formats: &[StreamFormat]) -> Option<&StreamFormat> {
    formats.iter().find(|format| format.has_audio())
}

impl YtDlpFetcher {
    pub fn new(yt_dlp_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            timeout,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Get video information using yt-dlp
    pub async fn probe(&self, video: &VideoId) -> Result<VideoMetadata> {
        tracing::debug!("Probing video info for: {}", video);

        let url = video.watch_url();
        let output = self
            .run(&["--dump-json", "--no-playlist", "--no-warnings", &url])
            .await?;

        serde_json::from_slice(&output.stdout).map_err(|e| {
            SubtitlrError::Retrieval(format!("unreadable yt-dlp metadata for {}: {}", video, e))
        })
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        let child = Command::new(&self.yt_dlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                return Err(SubtitlrError::Timeout {
                    stage: "download",
                    after: self.timeout,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SubtitlrError::Retrieval(format!(
                    "{} is not available. Please install it: https://github.com/yt-dlp/yt-dlp",
                    self.yt_dlp_path
                )))
            }
            Ok(Err(e)) => {
                return Err(SubtitlrError::Retrieval(format!(
                    "failed to run {}: {}",
                    self.yt_dlp_path, e
                )))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(SubtitlrError::Retrieval(format!("yt-dlp failed: {}", error.trim())));
        }

        Ok(output)
    }

    async fn download(&self, video: &VideoId, work_dir: &Path) -> Result<PathBuf> {
        let metadata = self.probe(video).await?;
        if let Some(title) = &metadata.title {
            tracing::info!("Found video {}: {}", metadata.id, title);
        }

        let format = select_audio_stream(&metadata.formats).ok_or_else(|| {
            SubtitlrError::Retrieval(format!("video {} has no stream with audio", video))
        })?;
        tracing::debug!(
            "Selected format {} ({}, {})",
            format.format_id,
            format.acodec.as_deref().unwrap_or("unknown codec"),
            format
                .filesize
                .map(utils::format_file_size)
                .unwrap_or_else(|| "size unknown".to_string())
        );

        fs_err::create_dir_all(work_dir)?;
        let container = work_dir.join(format!("video.{}", format.container_ext()));
        let target = container.to_string_lossy().into_owned();
        let url = video.watch_url();

        self.run(&[
            "--format",
            &format.format_id,
            "--output",
            &target,
            "--no-playlist",
            "--no-part",
            "--force-overwrites",
            "--quiet",
            "--no-warnings",
            &url,
        ])
        .await?;

        let size = utils::file_size(&container);
        if size == 0 {
            return Err(SubtitlrError::Retrieval(format!(
                "download of {} produced no data at {}",
                video,
                container.display()
            )));
        }

        tracing::info!(
            "Downloaded {} to {}",
            utils::format_file_size(size),
            container.display()
        );
        Ok(container)
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch(&self, video: &VideoId, work_dir: &Path) -> Result<PathBuf> {
        let progress = utils::spinner("Downloading the video...", self.show_progress);
        match self.download(video, work_dir).await {
            Ok(container) => {
                progress.finish_with_message("Video downloaded successfully!");
                Ok(container)
            }
            Err(e) => {
                progress.finish_and_clear();
                Err(e)
            }
        }
    }
}
