//! Document translation through the DeepL document API.
//!
//! A translation is an asynchronous job: the document is uploaded, the job
//! is polled until it reports `done`, then the result is downloaded.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub mod processor;

pub use processor::{translate_document, wait_for_completion, PollPolicy};

use crate::config::{Credential, DeeplConfig};
use crate::{Result, SubtitlrError};

const FREE_API_URL: &str = "https://api-free.deepl.com/v2";
const PRO_API_URL: &str = "https://api.deepl.com/v2";

/// Identifies one in-flight translation job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub document_key: String,
}

impl JobHandle {
    /// Parse an upload response. Malformed JSON yields an empty handle.
    pub fn from_response_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|e| {
            tracing::warn!("Unreadable upload response: {}", e);
            Self::default()
        })
    }

    /// Reject handles the service did not fill in
    pub fn ensure_valid(self) -> Result<Self> {
        if self.document_id.trim().is_empty() || self.document_key.trim().is_empty() {
            return Err(SubtitlrError::Translation(
                "upload did not return a document id and key".into(),
            ));
        }
        Ok(self)
    }
}

/// Server-side state of a translation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Queued,
    Translating,
    Done,
    Error,
    #[serde(other)]
    Unknown,
}

/// One status report of a translation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub document_id: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub seconds_remaining: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// The three calls of the document translation protocol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Upload a document for translation into `target_lang`
    async fn upload(&self, document: &Path, target_lang: &str) -> Result<JobHandle>;

    /// Ask for the current state of a job
    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus>;

    /// Fetch the translated document of a finished job
    async fn download(&self, handle: &JobHandle) -> Result<Vec<u8>>;
}

/// HTTP client for the DeepL document API
pub struct DeeplClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
    user_agent: String,
}

impl DeeplClient {
    pub fn new(config: &DeeplConfig, credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SubtitlrError::Translation(format!("cannot build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(&credential).to_string());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("DeepL-Auth-Key {}", self.credential.expose()),
            )
            .header(reqwest::header::USER_AGENT, &self.user_agent)
    }

    async fn send(&self, call: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| SubtitlrError::Translation(format!("{} request failed: {}", call, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubtitlrError::Translation(format!(
                "{} failed with status {}: {}",
                call,
                status.as_u16(),
                body.trim()
            )));
        }

        Ok(response)
    }

    async fn read_body(call: &str, response: Response) -> Result<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| {
                SubtitlrError::Translation(format!("failed to read {} response: {}", call, e))
            })
    }
}

/// Free-tier keys end in `:fx` and use a separate host
fn default_base_url(credential: &Credential) -> &'static str {
    if credential.expose().ends_with(":fx") {
        FREE_API_URL
    } else {
        PRO_API_URL
    }
}

#[async_trait]
impl DocumentApi for DeeplClient {
    async fn upload(&self, document: &Path, target_lang: &str) -> Result<JobHandle> {
        let content = tokio::fs::read(document).await?;
        let file_name = document
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("subtitles.srt");

        // The API accepts subtitle text only as a .txt upload
        let part = Part::bytes(content)
            .file_name(format!("{}.txt", file_name))
            .mime_str("text/plain")
            .map_err(|e| SubtitlrError::Translation(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("target_lang", target_lang.to_string());

        let response = self.send("upload", self.post("/document").multipart(form)).await?;
        let body = Self::read_body("upload", response).await?;

        let handle = JobHandle::from_response_body(&body);
        tracing::info!("Uploaded {} as document {}", document.display(), handle.document_id);
        Ok(handle)
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobStatus> {
        let request = self
            .post(&format!("/document/{}", handle.document_id))
            .query(&[("document_key", handle.document_key.as_str())]);

        let response = self.send("status check", request).await?;
        let body = Self::read_body("status check", response).await?;

        serde_json::from_slice(&body)
            .map_err(|e| SubtitlrError::Translation(format!("unreadable status response: {}", e)))
    }

    async fn download(&self, handle: &JobHandle) -> Result<Vec<u8>> {
        let request = self
            .post(&format!("/document/{}/result", handle.document_id))
            .query(&[("document_key", handle.document_key.as_str())]);

        let response = self.send("download", request).await?;
        Self::read_body("download", response).await
    }
}
