//! The yt-dlp boundary: listing, metadata and media downloads all run the
//! external `yt-dlp` program and translate its exit status and output into
//! typed results.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Result, bail};
use tracing::debug;

use crate::config::{DEFAULT_YT_DLP, playlist_url};
use crate::error::RemoteError;
use crate::media::{MediaFetcher, MediaOutcome, MediaRequest};
use crate::metadata::{InfoJson, MetadataFetcher, PlaylistEntry, PlaylistLister, VideoMetadata};

/// Merged mp4 with the best mp4 video and m4a audio, or the best single mp4.
const VIDEO_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/mp4";
const MERGE_FORMAT: &str = "mp4";
const SUBTITLE_DOWNLOAD_FORMAT: &str = "vtt";
const SUBTITLE_FORMAT: &str = "srt";
const THUMBNAIL_FORMAT: &str = "jpg";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/114.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    cookies: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(DEFAULT_YT_DLP)
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cookies: None,
        }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Runs `yt-dlp --version` to fail loudly when the program is missing.
    pub fn ensure_available(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(_) => bail!(
                "{} is installed but returned a failure status",
                self.program.display()
            ),
            Err(err) => bail!(
                "{} is not installed or not in PATH: {}",
                self.program.display(),
                err
            ),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(cookies) = &self.cookies
            && cookies.exists()
        {
            command.arg("--cookies").arg(cookies);
        }
        command
    }

    fn run(
        &self,
        mut command: Command,
        operation: &'static str,
        target: &str,
    ) -> Result<Output, RemoteError> {
        debug!("Running {:?}", command);
        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RemoteError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(RemoteError::Failed {
                operation,
                target: target.to_owned(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }
}

impl PlaylistLister for YtDlp {
    fn list(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>, RemoteError> {
        let url = playlist_url(playlist_id);
        let mut command = self.command();
        command
            .arg("--flat-playlist")
            .arg("--print")
            .arg("id")
            .arg("--no-warnings")
            .arg(&url);

        let output = self.run(command, "playlist listing", &url)?;
        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl MetadataFetcher for YtDlp {
    fn fetch(&self, video_url: &str) -> Result<VideoMetadata, RemoteError> {
        let mut command = self.command();
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--no-progress")
            .arg(video_url);

        let output = self.run(command, "metadata fetch", video_url)?;
        let info: InfoJson =
            serde_json::from_slice(&output.stdout).map_err(|source| RemoteError::Malformed {
                operation: "metadata fetch",
                target: video_url.to_owned(),
                source,
            })?;
        Ok(VideoMetadata::from(info))
    }
}

impl MediaFetcher for YtDlp {
    fn fetch(&self, request: &MediaRequest) -> Result<MediaOutcome, RemoteError> {
        let mut command = self.command();
        command
            .arg("--format")
            .arg(VIDEO_FORMAT)
            .arg("--merge-output-format")
            .arg(MERGE_FORMAT)
            .arg("--write-subs")
            .arg("--sub-langs")
            .arg("all")
            .arg("--sub-format")
            .arg(SUBTITLE_DOWNLOAD_FORMAT)
            .arg("--convert-subs")
            .arg(SUBTITLE_FORMAT)
            .arg("--write-thumbnail")
            .arg("--convert-thumbnails")
            .arg(THUMBNAIL_FORMAT)
            .arg("--user-agent")
            .arg(USER_AGENT)
            .arg("--output")
            .arg(request.output_template())
            .arg("--output")
            .arg(format!("subtitle:{}", request.subtitle_template()))
            .arg("--output")
            .arg(format!("thumbnail:{}", request.thumbnail_template()))
            .arg("--no-simulate")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("--no-progress")
            .arg("--no-warnings")
            .arg(&request.video_url);

        let output = self.run(command, "media download", &request.video_url)?;
        let reported = reported_path(&String::from_utf8_lossy(&output.stdout));
        Ok(MediaOutcome::discover(request, reported))
    }
}

fn parse_listing(stdout: &str) -> Vec<PlaylistEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PlaylistEntry::new)
        .collect()
}

/// yt-dlp prints the final path of the merged file last.
fn reported_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(|line| Path::new(line).to_path_buf())
}
