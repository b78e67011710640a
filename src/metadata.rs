//! Video metadata as the archiver sees it, plus the contracts for the remote
//! side that produces it.
//!
//! Only the handful of fields that end up in filenames and sidecars are kept.
//! Anything the remote side leaves out is replaced with a readable
//! placeholder instead of failing the entry.

use serde::Deserialize;

use crate::error::RemoteError;

pub const UNKNOWN_ID: &str = "Unknown ID";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";
pub const UNKNOWN_DESCRIPTION: &str = "Unknown Description";

/// Immutable metadata record for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub uploader: String,
    /// `YYYYMMDD`, or empty when the remote side did not report a date.
    pub upload_date: String,
    pub description: String,
}

/// One video discovered while listing a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub id: String,
}

impl PlaylistEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Canonical watch URL handed to the fetchers.
    pub fn video_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Lists the entries of a playlist without downloading anything.
pub trait PlaylistLister {
    fn list(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, RemoteError>;
}

/// Resolves a video URL into its metadata.
pub trait MetadataFetcher {
    fn fetch(&self, video_url: &str) -> Result<VideoMetadata, RemoteError>;
}

/// Subset of yt-dlp's `--dump-single-json` payload. Everything is optional
/// because older or restricted videos routinely omit fields.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct InfoJson {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    upload_date: Option<String>,
    description: Option<String>,
}

impl From<InfoJson> for VideoMetadata {
    fn from(info: InfoJson) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            id: present(info.id).unwrap_or_else(|| UNKNOWN_ID.to_owned()),
            title: present(info.title).unwrap_or_else(|| UNKNOWN_TITLE.to_owned()),
            uploader: present(info.uploader)
                .or_else(|| present(info.channel))
                .unwrap_or_else(|| UNKNOWN_CHANNEL.to_owned()),
            upload_date: present(info.upload_date).unwrap_or_default(),
            description: info
                .description
                .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_owned()),
        }
    }
}
