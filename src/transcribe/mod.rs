use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;

use crate::config::{Credential, OpenAiConfig};
use crate::output;
use crate::utils;
use crate::{Result, SubtitlrError};

/// Response format requested from the transcription API
pub const RESPONSE_FORMAT: &str = "srt";

/// Turns an audio file into SRT subtitles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe `audio` spoken in `language` (ISO 639-1) and return the raw SRT bytes
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Vec<u8>>;
}

/// Client for the OpenAI audio transcription endpoint
pub struct WhisperClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    credential: Credential,
    show_progress: bool,
}

impl WhisperClient {
    pub fn new(config: &OpenAiConfig, credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SubtitlrError::Transcription(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/audio/transcriptions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            credential,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    async fn send(&self, audio: &Path, language: &str) -> Result<Vec<u8>> {
        let file_bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();
        tracing::debug!(
            "Uploading {} ({})",
            file_name,
            utils::format_file_size(file_bytes.len() as u64)
        );

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| SubtitlrError::Transcription(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", RESPONSE_FORMAT)
            .text("language", language.to_string());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.credential.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubtitlrError::Transcription(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SubtitlrError::Transcription(format!("failed to read response: {}", e)))?;

        if status != StatusCode::OK {
            let detail = String::from_utf8_lossy(&body);
            return Err(SubtitlrError::Transcription(format!(
                "request failed with status {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Vec<u8>> {
        let language = utils::validate_spoken_language(language)?;
        tracing::info!("Generating subtitles for {} (language: {})", audio.display(), language);

        let progress = utils::spinner("Generating the subtitles...", self.show_progress);
        match self.send(audio, &language).await {
            Ok(subtitles) => {
                progress.finish_with_message("Subtitles generated successfully!");
                Ok(subtitles)
            }
            Err(e) => {
                progress.finish_and_clear();
                Err(e)
            }
        }
    }
}

/// Transcribe `audio` and write the subtitles verbatim to `output_path`.
///
/// Nothing is written when the transcription fails.
pub async fn transcribe_to_file(
    client: &dyn SpeechToText,
    audio: &Path,
    language: &str,
    output_path: &Path,
) -> Result<u64> {
    let subtitles = client.transcribe(audio, language).await?;
    output::write_document(output_path, &subtitles)
}
