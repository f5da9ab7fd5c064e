use std::path::Path;

use crate::Result;

/// Write a subtitle document to `path` byte for byte and return its size.
///
/// Missing parent directories are created.
pub fn write_document(path: &Path, content: &[u8]) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    fs_err::write(path, content)?;
    tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(content.len() as u64)
}
