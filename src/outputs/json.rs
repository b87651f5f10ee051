//! JSON output for a scraping run.
//!
//! Announcements are written as a single pretty-printed array (4-space
//! indent, UTF-8, non-ASCII kept as-is) named after the requested range:
//! `okx_announcements_<start>_<end>.json`.

use crate::models::{Announcement, DateRange};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// File name for the announcements of `range`.
pub fn output_filename(range: &DateRange) -> String {
    format!("okx_announcements_{}_{}.json", range.start(), range.end())
}

/// Serialize announcements as a 4-space indented JSON array.
pub fn to_pretty_json(announcements: &[Announcement]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    announcements.serialize(&mut ser)?;
    Ok(buf)
}

/// Write `announcements` to `<out_dir>/okx_announcements_<start>_<end>.json`.
///
/// Creates `out_dir` if needed. An empty slice still produces a file (`[]`).
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(out_dir = %out_dir.display(), %range))]
pub async fn write_announcements(
    announcements: &[Announcement],
    range: &DateRange,
    out_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = to_pretty_json(announcements)?;

    if let Err(e) = fs::create_dir_all(out_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = out_dir.join(output_filename(range));
    fs::write(&path, json).await?;
    info!(path = %path.display(), count = announcements.len(), "Saved announcements");

    Ok(path)
}
