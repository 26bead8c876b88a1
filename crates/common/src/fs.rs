//! Atomic file writes
//!
//! Both the credential file and the exported playlist are written wholesale.
//! Writing to a temporary sibling and renaming it over the target means a
//! crash mid-write never leaves a truncated file behind.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Write `contents` to `path` atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. When `mode` is given (unix only) the permissions are applied
/// to the temporary file before the rename, so the target never exists with
/// looser permissions.
pub async fn write_atomic(path: &Path, contents: &[u8], mode: Option<u32>) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Config(format!("{} has no parent directory", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Config(format!("{} has no file name", path.display())))?;

    let tmp_path = dir.join(format!(
        ".{}.tmp.{}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    tokio::fs::write(&tmp_path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(mode)).await?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    tokio::fs::rename(&tmp_path, path).await?;

    debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}
