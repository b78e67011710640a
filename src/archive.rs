//! Per-playlist ledger of videos that were archived successfully.
//!
//! The ledger is what makes re-runs cheap: an id found here is skipped
//! without a single remote call. It is append-only and holds one id per line.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const LEDGER_FILE: &str = ".archive.txt";

/// Storage for the set of ids already archived in a playlist directory.
pub trait ArchiveLedger {
    /// Makes sure the (possibly empty) ledger for `playlist_dir` exists.
    fn prepare(&mut self, playlist_dir: &Path) -> Result<()>;

    fn contains(&mut self, playlist_dir: &Path, video_id: &str) -> Result<bool>;

    /// Appends `video_id` unless it is already present.
    fn record(&mut self, playlist_dir: &Path, video_id: &str) -> Result<()>;
}

/// Ledger stored as `.archive.txt` inside each playlist directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLedger;

impl FileLedger {
    pub fn new() -> Self {
        Self
    }

    pub fn ledger_path(playlist_dir: &Path) -> PathBuf {
        playlist_dir.join(LEDGER_FILE)
    }

    fn ensure_file(path: &Path) -> Result<()> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("creating ledger {}", path.display()))?;
        Ok(())
    }

    /// True for an empty file or one whose last byte is `\n`.
    fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
        if file.metadata()?.len() == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    fn read_ids(path: &Path) -> Result<Vec<String>> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut ids = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("reading {}", path.display()))?;
            let id = line.trim_end();
            if !id.is_empty() {
                ids.push(id.to_owned());
            }
        }
        Ok(ids)
    }
}

impl ArchiveLedger for FileLedger {
    fn prepare(&mut self, playlist_dir: &Path) -> Result<()> {
        fs::create_dir_all(playlist_dir)
            .with_context(|| format!("creating {}", playlist_dir.display()))?;
        Self::ensure_file(&Self::ledger_path(playlist_dir))
    }

    fn contains(&mut self, playlist_dir: &Path, video_id: &str) -> Result<bool> {
        let path = Self::ledger_path(playlist_dir);
        if !path.exists() {
            Self::ensure_file(&path)?;
            return Ok(false);
        }
        Ok(Self::read_ids(&path)?.iter().any(|id| id == video_id))
    }

    fn record(&mut self, playlist_dir: &Path, video_id: &str) -> Result<()> {
        if self.contains(playlist_dir, video_id)? {
            return Ok(());
        }
        let path = Self::ledger_path(playlist_dir);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening ledger {}", path.display()))?;

        // A hand-edited file or an interrupted append may lack the final
        // newline; without it the new id would be glued to the last one.
        let mut line = String::with_capacity(video_id.len() + 2);
        if !Self::ends_with_newline(&mut file)
            .with_context(|| format!("reading {}", path.display()))?
        {
            line.push('\n');
        }
        line.push_str(video_id);
        line.push('\n');

        file.write_all(line.as_bytes())
            .with_context(|| format!("writing ledger entry for {video_id}"))?;
        Ok(())
    }
}

/// Ledger kept in memory, keyed by playlist directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    entries: HashMap<PathBuf, Vec<String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids recorded for `playlist_dir`, in recording order.
    pub fn ids(&self, playlist_dir: &Path) -> &[String] {
        self.entries
            .get(playlist_dir)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn with_ids<I, S>(mut self, playlist_dir: &Path, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(playlist_dir.to_path_buf())
            .or_default()
            .extend(ids.into_iter().map(Into::into));
        self
    }
}

impl ArchiveLedger for MemoryLedger {
    fn prepare(&mut self, playlist_dir: &Path) -> Result<()> {
        self.entries.entry(playlist_dir.to_path_buf()).or_default();
        Ok(())
    }

    fn contains(&mut self, playlist_dir: &Path, video_id: &str) -> Result<bool> {
        Ok(self.ids(playlist_dir).iter().any(|id| id == video_id))
    }

    fn record(&mut self, playlist_dir: &Path, video_id: &str) -> Result<()> {
        let ids = self.entries.entry(playlist_dir.to_path_buf()).or_default();
        if !ids.iter().any(|id| id == video_id) {
            ids.push(video_id.to_owned());
        }
        Ok(())
    }
}
