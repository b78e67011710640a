//! Contract for the component that turns a video URL into files on disk.
//!
//! A fetcher reports explicit success or failure and, on success, the paths
//! it actually produced. Callers never guess extensions.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::RemoteError;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "mov", "m4v"];
const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "webp", "png"];
const SUBTITLE_EXTENSION: &str = "srt";

/// Everything a fetcher needs to place the artifacts of one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub video_url: String,
    pub output_dir: PathBuf,
    /// Sanitized `{title}_{channel}` shared by every artifact.
    pub base_name: String,
}

impl MediaRequest {
    pub fn new(
        video_url: impl Into<String>,
        output_dir: &Path,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            video_url: video_url.into(),
            output_dir: output_dir.to_path_buf(),
            base_name: base_name.into(),
        }
    }

    /// yt-dlp template for the merged video file.
    pub fn output_template(&self) -> String {
        self.template()
    }

    /// yt-dlp template for subtitles. yt-dlp inserts `.{lang}` before the
    /// extension, giving `{base}.{lang}.srt`.
    pub fn subtitle_template(&self) -> String {
        self.template()
    }

    /// yt-dlp template for the converted thumbnail.
    pub fn thumbnail_template(&self) -> String {
        self.template()
    }

    fn template(&self) -> String {
        self.output_dir
            .join(format!("{}.%(ext)s", self.base_name))
            .to_string_lossy()
            .into_owned()
    }
}

/// Files a successful fetch left on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaOutcome {
    pub video: Option<PathBuf>,
    pub subtitles: Vec<PathBuf>,
    pub thumbnail: Option<PathBuf>,
}

impl MediaOutcome {
    /// Scans the request's output directory for artifacts named after its
    /// base filename. `reported_video` wins over the scan when it exists.
    pub fn discover(request: &MediaRequest, reported_video: Option<PathBuf>) -> Self {
        let mut outcome = MediaOutcome {
            video: reported_video.filter(|path| path.is_file()),
            ..MediaOutcome::default()
        };
        let prefix = format!("{}.", request.base_name);

        for entry in WalkDir::new(&request.output_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            let file_name = entry.file_name().to_string_lossy();
            let Some(rest) = file_name.strip_prefix(&prefix) else {
                continue;
            };
            let path = entry.path().to_path_buf();

            // `rest` is `ext` for video/thumbnail and `lang.ext` for subtitles.
            match rest.rsplit_once('.') {
                Some((_lang, ext)) if ext.eq_ignore_ascii_case(SUBTITLE_EXTENSION) => {
                    outcome.subtitles.push(path);
                }
                None if is_one_of(rest, VIDEO_EXTENSIONS) => {
                    if outcome.video.is_none() {
                        outcome.video = Some(path);
                    }
                }
                None if is_one_of(rest, THUMBNAIL_EXTENSIONS) => {
                    if outcome.thumbnail.is_none() {
                        outcome.thumbnail = Some(path);
                    }
                }
                _ => {}
            }
        }

        outcome
    }
}

fn is_one_of(ext: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| ext.eq_ignore_ascii_case(c))
}

/// Downloads the media, subtitles and thumbnail of one video.
pub trait MediaFetcher {
    fn fetch(&self, request: &MediaRequest) -> Result<MediaOutcome, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn templates_share_the_base_name() {
        let request = MediaRequest::new(
            "https://www.youtube.com/watch?v=abc",
            Path::new("/archive/music"),
            "song_artist",
        );
        assert_eq!(request.output_template(), "/archive/music/song_artist.%(ext)s");
        assert_eq!(request.subtitle_template(), request.output_template());
        assert_eq!(request.thumbnail_template(), request.output_template());
    }

    #[test]
    fn discover_sorts_artifacts_by_kind() {
        let dir = tempdir().unwrap();
        for name in [
            "song_artist.mp4",
            "song_artist.jpg",
            "song_artist.en.srt",
            "song_artist.de.srt",
            "song_artist.nfo",
            "other_artist.mp4",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let request = MediaRequest::new("url", dir.path(), "song_artist");
        let outcome = MediaOutcome::discover(&request, None);

        assert_eq!(outcome.video, Some(dir.path().join("song_artist.mp4")));
        assert_eq!(outcome.thumbnail, Some(dir.path().join("song_artist.jpg")));
        assert_eq!(
            outcome.subtitles,
            vec![
                dir.path().join("song_artist.de.srt"),
                dir.path().join("song_artist.en.srt"),
            ]
        );
    }

    #[test]
    fn discover_accepts_non_mp4_containers() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("clip_chan.webm"), "x").unwrap();
        let request = MediaRequest::new("url", dir.path(), "clip_chan");
        let outcome = MediaOutcome::discover(&request, None);
        assert_eq!(outcome.video, Some(dir.path().join("clip_chan.webm")));
    }

    #[test]
    fn discover_ignores_missing_reported_path() {
        let dir = tempdir().unwrap();
        let request = MediaRequest::new("url", dir.path(), "clip_chan");
        let outcome = MediaOutcome::discover(&request, Some(dir.path().join("clip_chan.mp4")));
        assert_eq!(outcome, MediaOutcome::default());
    }
}
