//! Subtitlr - AI-assisted subtitle generation for YouTube videos
//!
//! This library downloads the audio of a YouTube video (or takes a local MP3),
//! transcribes it into SRT subtitles with the OpenAI Whisper API, and translates
//! subtitle files with the DeepL document API.

pub mod audio;
pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod transcribe;
pub mod translate;
pub mod utils;

use std::path::PathBuf;
use std::time::Duration;

pub use cli::{Cli, Commands};
pub use config::{Config, Credential};
pub use pipeline::{GenerationReport, SubtitlePipeline};
pub use source::{Source, VideoId};
pub use transcribe::WhisperClient;
pub use translate::{DeeplClient, DocumentApi, JobHandle, JobStatus, PollPolicy};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, SubtitlrError>;

/// Error types specific to subtitlr
#[derive(thiserror::Error, Debug)]
pub enum SubtitlrError {
    #[error("Video retrieval failed: {0}")]
    Retrieval(String),

    #[error("Audio conversion failed: {0}")]
    Conversion(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File not supported (only .mp3 audio is accepted): {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: &'static str, after: Duration },

    #[error("{0} cancelled")]
    Cancelled(&'static str),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl SubtitlrError {
    /// Name of the pipeline stage the error belongs to, for diagnostics
    pub fn stage(&self) -> &'static str {
        match self {
            SubtitlrError::Retrieval(_) => "download",
            SubtitlrError::Conversion(_) => "conversion",
            SubtitlrError::Transcription(_) => "transcription",
            SubtitlrError::Translation(_) => "translation",
            SubtitlrError::Validation(_)
            | SubtitlrError::FileNotFound(_)
            | SubtitlrError::UnsupportedFile(_) => "validation",
            SubtitlrError::Config(_) => "configuration",
            SubtitlrError::Timeout { stage, .. } | SubtitlrError::Cancelled(stage) => stage,
            SubtitlrError::Io(_) => "filesystem",
        }
    }
}
