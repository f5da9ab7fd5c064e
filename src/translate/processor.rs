use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::{DocumentApi, DocumentStatus, JobHandle, JobStatus};
use crate::output;
use crate::utils;
use crate::{Result, SubtitlrError};

/// How a translation job is waited for
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Shortest wait between status checks, also used when the server gives no estimate
    pub min_interval: Duration,

    /// Longest wait between status checks
    pub max_interval: Duration,

    /// Overall budget for the job
    pub max_wait: Duration,

    pub show_progress: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(1800),
            show_progress: true,
        }
    }
}

impl PollPolicy {
    /// Wait before the next check: the server's estimate, kept within bounds
    pub fn delay_for(&self, status: &JobStatus) -> Duration {
        let hint = status
            .seconds_remaining
            .map(Duration::from_secs)
            .unwrap_or(self.min_interval);
        hint.max(self.min_interval).min(self.max_interval)
    }
}

/// Poll a job until it is done, fails, runs out of time or is cancelled
pub async fn wait_for_completion(
    api: &dyn DocumentApi,
    handle: &JobHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<JobStatus> {
    let progress = utils::spinner("Waiting for the translation...", policy.show_progress);

    let report = |message: String| progress.set_message(message);
    match poll_until_done(api, handle, policy, cancel, report).await {
        Ok(status) => {
            progress.finish_with_message("Translation completed!");
            Ok(status)
        }
        Err(e) => {
            progress.finish_and_clear();
            Err(e)
        }
    }
}

async fn poll_until_done(
    api: &dyn DocumentApi,
    handle: &JobHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    report: impl Fn(String),
) -> Result<JobStatus> {
    let start_time = Instant::now();
    let mut check_count = 0u32;

    loop {
        check_count += 1;
        utils::ensure_not_cancelled(cancel, "translation")?;
        let status = utils::cancellable(cancel, "translation", api.poll(handle)).await?;

        match status.status {
            DocumentStatus::Done => {
                tracing::info!(
                    "Document {} translated after {} status checks",
                    handle.document_id,
                    check_count
                );
                return Ok(status);
            }
            DocumentStatus::Error => {
                let reason = status.error_message.as_deref().unwrap_or("unknown error");
                return Err(SubtitlrError::Translation(format!(
                    "document {} could not be translated: {}",
                    handle.document_id, reason
                )));
            }
            DocumentStatus::Unknown => {
                tracing::warn!(
                    "Unexpected status for document {}, still waiting",
                    handle.document_id
                );
            }
            DocumentStatus::Queued | DocumentStatus::Translating => {}
        }

        let remaining = status
            .seconds_remaining
            .map(utils::format_duration)
            .unwrap_or_else(|| "unknown".to_string());
        tracing::debug!(
            "Document {} is {:?}, {} remaining",
            handle.document_id,
            status.status,
            remaining
        );
        report(format!(
            "Translating... ({} remaining, {}s elapsed, check #{})",
            remaining,
            start_time.elapsed().as_secs(),
            check_count
        ));

        let elapsed = start_time.elapsed();
        if elapsed >= policy.max_wait {
            return Err(SubtitlrError::Timeout {
                stage: "translation",
                after: policy.max_wait,
            });
        }

        let delay = policy.delay_for(&status).min(policy.max_wait - elapsed);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SubtitlrError::Cancelled("translation")),
            _ = sleep(delay) => {}
        }
    }
}

/// Translate a subtitle file and write the result verbatim to `output_path`.
///
/// Uploads once, polls with the same handle until the job is done, then
/// downloads exactly once. Returns the number of bytes written.
pub async fn translate_document(
    api: &dyn DocumentApi,
    input: &Path,
    target_lang: &str,
    output_path: &Path,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<u64> {
    let target_lang = utils::normalize_target_language(target_lang)?;
    if !input.is_file() {
        return Err(SubtitlrError::FileNotFound(input.to_path_buf()));
    }

    utils::ensure_not_cancelled(cancel, "translation")?;
    tracing::info!("Uploading {} for translation into {}", input.display(), target_lang);
    let handle = utils::cancellable(cancel, "translation", api.upload(input, &target_lang))
        .await?
        .ensure_valid()?;
    tracing::debug!("Document id: {}", handle.document_id);

    wait_for_completion(api, &handle, policy, cancel).await?;

    tracing::info!("Downloading the translated file...");
    utils::ensure_not_cancelled(cancel, "translation")?;
    let document = utils::cancellable(cancel, "translation", api.download(&handle)).await?;
    let written = output::write_document(output_path, &document)?;

    tracing::info!("Translated subtitles saved to {}", output_path.display());
    Ok(written)
}
