//! `.nfo` sidecar files for media-library scanners.
//!
//! Field order matters to some consumers, so the descriptor is rendered by
//! hand rather than through a generic serializer.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::metadata::VideoMetadata;

pub const SIDECAR_EXTENSION: &str = "nfo";
const UNKNOWN_DATE: &str = "Unknown Date";
const UNKNOWN_YEAR: &str = "Unknown Year";

/// Renders the `<episodedetails>` descriptor for `metadata`.
pub fn render_sidecar(metadata: &VideoMetadata) -> String {
    let date = parse_upload_date(&metadata.upload_date);
    let release_date = date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_owned());
    let year = date
        .map(|d| d.format("%Y").to_string())
        .unwrap_or_else(|| UNKNOWN_YEAR.to_owned());

    format!(
        "<episodedetails>\n  \
         <title>{}</title>\n  \
         <studio>{}</studio>\n  \
         <releasedate>{}</releasedate>\n  \
         <year>{}</year>\n  \
         <plot>{}</plot>\n  \
         <id>{}</id>\n\
         </episodedetails>\n",
        escape(&metadata.title),
        escape(&metadata.uploader),
        release_date,
        year,
        escape(&metadata.description),
        escape(&metadata.id),
    )
}

/// Writes the descriptor to `path`, replacing any previous file.
pub fn write_sidecar(metadata: &VideoMetadata, path: &Path) -> Result<()> {
    fs::write(path, render_sidecar(metadata))
        .with_context(|| format!("writing sidecar {}", path.display()))
}

/// Parses yt-dlp's `YYYYMMDD` upload date.
fn parse_upload_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> VideoMetadata {
        VideoMetadata {
            id: "abc123".into(),
            title: "Tom & Jerry <Remastered>".into(),
            uploader: "Cartoon Vault".into(),
            upload_date: "20240102".into(),
            description: "A classic.".into(),
        }
    }

    #[test]
    fn render_keeps_field_order_and_formats_dates() {
        let rendered = render_sidecar(&sample());
        assert_eq!(
            rendered,
            "<episodedetails>\n  \
             <title>Tom &amp; Jerry &lt;Remastered&gt;</title>\n  \
             <studio>Cartoon Vault</studio>\n  \
             <releasedate>2024-01-02</releasedate>\n  \
             <year>2024</year>\n  \
             <plot>A classic.</plot>\n  \
             <id>abc123</id>\n\
             </episodedetails>\n"
        );
    }

    #[test]
    fn render_uses_placeholders_for_missing_or_bad_dates() {
        for date in ["", "2024", "20241399"] {
            let mut metadata = sample();
            metadata.upload_date = date.into();
            let rendered = render_sidecar(&metadata);
            assert!(rendered.contains("<releasedate>Unknown Date</releasedate>"), "{date}");
            assert!(rendered.contains("<year>Unknown Year</year>"), "{date}");
        }
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("video.nfo");
        fs::write(&path, "stale").unwrap();
        write_sidecar(&sample(), &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<episodedetails>"));
        assert!(!written.contains("stale"));
    }

    #[test]
    fn write_reports_unwritable_target() {
        let dir = tempdir().unwrap();
        // A directory in place of the file makes the write fail on every platform.
        let err = write_sidecar(&sample(), dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("writing sidecar"));
    }
}
