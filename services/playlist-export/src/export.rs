//! Output artifact: `<dir>/<playlist title> - <timestamp>.json`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use youtube_api::Playlist;

/// File name timestamp: ISO-8601 to the second, `:` replaced by `_`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";

/// Path of the export file for `title` at `now`.
///
/// Path separators in the title become `_` so the file stays inside `dir`.
pub fn output_path(dir: &Path, title: &str, now: DateTime<Utc>) -> PathBuf {
    let title: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    dir.join(format!("{title} - {}.json", now.format(TIMESTAMP_FORMAT)))
}

/// Write the playlist as pretty JSON and return the file's path.
///
/// A failure to create `dir` is logged and the write is attempted anyway.
pub async fn write_playlist(
    dir: &Path,
    playlist: &Playlist,
    now: DateTime<Utc>,
) -> common::Result<PathBuf> {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %e, "could not create output directory");
    }

    let path = output_path(dir, &playlist.playlist_title, now);
    let json = serde_json::to_vec_pretty(playlist).map_err(std::io::Error::other)?;
    common::write_atomic(&path, &json, None).await?;

    info!(path = %path.display(), videos = playlist.videos.len(), "wrote playlist export");
    Ok(path)
}
