use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::error::ConfigError;
use crate::pacing::PacingPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "playlists.json";
pub const DEFAULT_YT_DLP: &str = "yt-dlp";
const ARCHIVE_SUBDIR: &str = "YouTube";

/// One playlist to archive and the folder it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistConfig {
    pub id: String,
    pub folder_name: String,
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={playlist_id}")
}

/// Parsed configuration plus the number of records that had to be dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistFile {
    pub playlists: Vec<PlaylistConfig>,
    pub skipped: usize,
}

/// Everything the archiver needs besides the playlist list.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub base_dir: PathBuf,
    pub pacing: PacingPolicy,
    pub cookies: Option<PathBuf>,
    pub yt_dlp: PathBuf,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            pacing: PacingPolicy::default(),
            cookies: None,
            yt_dlp: PathBuf::from(DEFAULT_YT_DLP),
        }
    }
}

impl RuntimeSettings {
    pub fn with_delays(mut self, entry_delay_secs: u64, playlist_delay_secs: u64) -> Self {
        self.pacing.entry_delay = Duration::from_secs(entry_delay_secs);
        self.pacing.playlist_delay = Duration::from_secs(playlist_delay_secs);
        self
    }
}

/// `~/Videos/YouTube`, resolved through the platform's video directory.
pub fn default_base_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("Videos"))
        .join(ARCHIVE_SUBDIR)
}

/// Reads the playlist list. A missing or unparsable file is fatal, a single
/// malformed record is skipped with a warning.
pub fn load_playlists(path: &Path) -> Result<PlaylistFile, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse_playlists(path, &content)
}

fn parse_playlists(path: &Path, content: &str) -> Result<PlaylistFile, ConfigError> {
    let value: Value = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(records) = value else {
        return Err(ConfigError::NotAList(path.to_path_buf()));
    };

    let mut parsed = PlaylistFile::default();
    for (index, record) in records.iter().enumerate() {
        match playlist_from_record(record) {
            Some(playlist) => parsed.playlists.push(playlist),
            None => {
                warn!("Invalid playlist entry #{} in {}. Skipping.", index + 1, path.display());
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

fn playlist_from_record(record: &Value) -> Option<PlaylistConfig> {
    let field = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };
    Some(PlaylistConfig {
        id: field("id")?,
        folder_name: field("folder-name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn make_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn load_playlists_reads_records_in_order() {
        let cfg = make_config(
            r#"[{"id":"PL123","folder-name":"test"},{"id":"PL456","folder-name":"music"}]"#,
        );
        let parsed = load_playlists(cfg.path()).unwrap();
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.playlists,
            vec![
                PlaylistConfig {
                    id: "PL123".into(),
                    folder_name: "test".into()
                },
                PlaylistConfig {
                    id: "PL456".into(),
                    folder_name: "music".into()
                },
            ]
        );
    }

    #[test]
    fn malformed_records_are_skipped() {
        let cfg = make_config(
            r#"[
                {"id":"PL1"},
                {"folder-name":"orphan"},
                {"id":"","folder-name":"empty"},
                {"id":42,"folder-name":"numeric"},
                "just a string",
                {"id":"PL2","folder-name":"kept","extra":true}
            ]"#,
        );
        let parsed = load_playlists(cfg.path()).unwrap();
        assert_eq!(parsed.skipped, 5);
        assert_eq!(parsed.playlists.len(), 1);
        assert_eq!(parsed.playlists[0].folder_name, "kept");
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load_playlists(&dir.path().join("playlists.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn invalid_json_is_fatal() {
        let cfg = make_config("[{\"id\": ");
        assert!(matches!(
            load_playlists(cfg.path()).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn top_level_object_is_rejected() {
        let cfg = make_config(r#"{"id":"PL1","folder-name":"x"}"#);
        assert!(matches!(
            load_playlists(cfg.path()).unwrap_err(),
            ConfigError::NotAList(_)
        ));
    }

    #[test]
    fn playlist_url_embeds_id() {
        assert_eq!(
            playlist_url("PL123"),
            "https://www.youtube.com/playlist?list=PL123"
        );
    }

    #[test]
    fn runtime_settings_override_delays() {
        let settings = RuntimeSettings::default().with_delays(3, 7);
        assert_eq!(settings.pacing.entry_delay, Duration::from_secs(3));
        assert_eq!(settings.pacing.playlist_delay, Duration::from_secs(7));
        assert!(settings.base_dir.ends_with(ARCHIVE_SUBDIR));
    }
}
