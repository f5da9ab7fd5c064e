//! API credentials and the dotfile that stores the transcription key.

use std::fmt;
use std::path::Path;

use crate::{Result, SubtitlrError};

/// Variable name of the transcription key inside the credential file
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Variable name of the translation key in the environment
pub const DEEPL_KEY_VAR: &str = "DEEPL_API_KEY";

/// An opaque API secret. Never printed in clear.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into().trim().to_string();
        if secret.is_empty() {
            return Err(SubtitlrError::Validation("API key must not be empty".into()));
        }
        Ok(Self(secret))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 8 {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            write!(f, "***{}", tail)
        } else {
            f.write_str("***")
        }
    }
}

/// Result of `write_credential_file`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    AlreadyExists,
}

/// Create the credential dotfile. An existing file is left untouched.
pub fn write_credential_file(path: &Path, key: &Credential) -> Result<WriteOutcome> {
    if path.exists() {
        tracing::info!("Credential file {} already exists, leaving it as is", path.display());
        return Ok(WriteOutcome::AlreadyExists);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    fs_err::write(path, format!("{}={}\n", OPENAI_KEY_VAR, key.expose()))?;
    tracing::info!("Wrote credential file {}", path.display());
    Ok(WriteOutcome::Created)
}

/// Read the transcription key from a dotfile, if the file defines one
pub fn read_credential_file(path: &Path) -> Result<Option<Credential>> {
    if !path.exists() {
        return Ok(None);
    }

    let entries = dotenvy::from_path_iter(path)
        .map_err(|e| SubtitlrError::Config(format!("cannot read {}: {}", path.display(), e)))?;

    for entry in entries {
        let (name, value) = entry
            .map_err(|e| SubtitlrError::Config(format!("malformed {}: {}", path.display(), e)))?;
        if name == OPENAI_KEY_VAR && !value.trim().is_empty() {
            return Credential::new(value).map(Some);
        }
    }

    Ok(None)
}

/// Resolve the transcription key: explicit flag first, then the dotfile,
/// then the process environment
pub fn resolve_openai_key(explicit: Option<&str>, dotfile: &Path) -> Result<Credential> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Credential::new(key);
    }

    if let Some(key) = read_credential_file(dotfile)? {
        tracing::debug!("Using transcription key from {}", dotfile.display());
        return Ok(key);
    }

    match std::env::var(OPENAI_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Credential::new(key),
        _ => Err(SubtitlrError::Config(format!(
            "no OpenAI API key: pass --api-key, run `subtitlr configure`, or set {}",
            OPENAI_KEY_VAR
        ))),
    }
}
