//! Typed failures that decide how far an error is allowed to travel.
//!
//! Configuration problems abort the whole run, remote problems only abandon
//! the playlist or entry that triggered them. Local filesystem trouble is
//! carried as `anyhow::Error` with context, like everywhere else in the crate.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Problems with the playlist configuration file. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("reading configuration file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing configuration file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration file {} must contain a JSON array of playlists", .0.display())]
    NotAList(PathBuf),
}

/// Failures reported by the remote side (listing, metadata, media).
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("could not run {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} failed for {target} ({status}){}", format_stderr(.stderr))]
    Failed {
        operation: &'static str,
        target: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unexpected {operation} response for {target}")]
    Malformed {
        operation: &'static str,
        target: String,
        #[source]
        source: serde_json::Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    match stderr.trim().lines().last() {
        Some(line) if !line.is_empty() => format!(": {line}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn failed_remote_error_shows_last_stderr_line() {
        use std::os::unix::process::ExitStatusExt;

        let err = RemoteError::Failed {
            operation: "metadata fetch",
            target: "https://www.youtube.com/watch?v=abc".into(),
            status: ExitStatus::from_raw(1 << 8),
            stderr: "WARNING: something\nERROR: Video unavailable\n".into(),
        };
        let message = err.to_string();
        assert!(
            message.starts_with("metadata fetch failed for https://www.youtube.com/watch?v=abc")
        );
        assert!(message.ends_with(": ERROR: Video unavailable"));
    }

    #[test]
    fn missing_config_names_the_path() {
        let err = ConfigError::Missing(PathBuf::from("/tmp/playlists.json"));
        assert_eq!(
            err.to_string(),
            "configuration file not found: /tmp/playlists.json"
        );
    }
}
