use std::path::Path;

use crate::{Result, SubtitlrError};

/// Check that a local audio file can be sent to the transcription API as is.
///
/// The file must exist, be a regular non-empty file and carry an `.mp3`
/// extension. A missing file and an unsupported extension are reported as
/// different errors.
pub fn validate_local_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SubtitlrError::FileNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(SubtitlrError::Validation(format!("path is not a file: {}", path.display())));
    }

    let is_mp3 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("mp3"));
    if !is_mp3 {
        return Err(SubtitlrError::UnsupportedFile(path.to_path_buf()));
    }

    let metadata = std::fs::metadata(path)?;
    if metadata.len() == 0 {
        return Err(SubtitlrError::Validation(format!("file is empty: {}", path.display())));
    }

    Ok(())
}
