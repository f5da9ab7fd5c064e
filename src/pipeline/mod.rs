use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioConverter, FfmpegConverter};
use crate::config::{Config, Credential};
use crate::output;
use crate::source::{validate_local_file, Source, VideoFetcher, VideoId, YtDlpFetcher};
use crate::transcribe::{SpeechToText, WhisperClient};
use crate::utils;
use crate::Result;

/// What a successful generate run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Where the subtitles were written
    pub output_path: PathBuf,

    /// Size of the subtitle file
    pub bytes_written: u64,
}

/// Fetch -> extract -> transcribe, for one source at a time
pub struct SubtitlePipeline {
    fetcher: Box<dyn VideoFetcher>,
    converter: Box<dyn AudioConverter>,
    transcriber: Box<dyn SpeechToText>,
    temp_root: Option<PathBuf>,
}

impl SubtitlePipeline {
    /// Create a pipeline backed by yt-dlp, ffmpeg and the Whisper API
    pub fn new(config: &Config, credential: Credential) -> Result<Self> {
        let show_progress = config.app.show_progress;
        let fetcher = YtDlpFetcher::new(config.app.downloader.clone(), config.process_timeout())
            .with_progress(show_progress);
        let converter = FfmpegConverter::new(config.app.converter.clone(), config.process_timeout())
            .with_progress(show_progress);
        let transcriber =
            WhisperClient::new(&config.openai, credential)?.with_progress(show_progress);

        Ok(Self::with_components(
            Box::new(fetcher),
            Box::new(converter),
            Box::new(transcriber),
            config.app.temp_dir.clone(),
        ))
    }

    /// Assemble a pipeline from explicit stages
    pub fn with_components(
        fetcher: Box<dyn VideoFetcher>,
        converter: Box<dyn AudioConverter>,
        transcriber: Box<dyn SpeechToText>,
        temp_root: Option<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            converter,
            transcriber,
            temp_root,
        }
    }

    /// Generate subtitles for `source` and write them to `output_path`
    pub async fn run(
        &self,
        source: &Source,
        language: &str,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<GenerationReport> {
        let language = utils::validate_spoken_language(language)?;

        let subtitles = match source {
            Source::LocalFile(path) => {
                validate_local_file(path)?;
                tracing::info!("Using local audio file: {}", path.display());
                utils::ensure_not_cancelled(cancel, "transcription")?;
                let transcription = self.transcriber.transcribe(path, &language);
                utils::cancellable(cancel, "transcription", transcription).await?
            }
            Source::Video(video) => self.transcribe_video(video, &language, cancel).await?,
        };

        let bytes_written = output::write_document(output_path, &subtitles)?;
        tracing::info!("Subtitles saved to {}", output_path.display());

        Ok(GenerationReport {
            output_path: output_path.to_path_buf(),
            bytes_written,
        })
    }

    /// The video branch owns a scoped working directory, removed on every exit path
    async fn transcribe_video(
        &self,
        video: &VideoId,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let workspace = self.create_workspace()?;
        tracing::debug!("Working directory: {}", workspace.path().display());

        utils::ensure_not_cancelled(cancel, "download")?;
        let download = self.fetcher.fetch(video, workspace.path());
        let container = utils::cancellable(cancel, "download", download).await?;

        let audio_path = workspace.path().join("audio.mp3");
        utils::ensure_not_cancelled(cancel, "conversion")?;
        let conversion = self.converter.extract(&container, &audio_path);
        let audio = utils::cancellable(cancel, "conversion", conversion).await?;

        utils::ensure_not_cancelled(cancel, "transcription")?;
        let transcription = self.transcriber.transcribe(&audio, language);
        let subtitles = utils::cancellable(cancel, "transcription", transcription).await?;

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            tracing::warn!("Failed to remove {}: {}", workspace_path.display(), e);
        }

        Ok(subtitles)
    }

    fn create_workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("subtitlr-");

        let workspace = match &self.temp_root {
            Some(root) => {
                fs_err::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(workspace)
    }
}
