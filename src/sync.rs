//! The playlist sync loop.
//!
//! For every configured playlist the archiver lists the remote entries,
//! skips anything the ledger already knows, and for new entries fetches
//! metadata, downloads media, writes the `.nfo` sidecar and finally records
//! the id. Failures stay inside the smallest unit that produced them: one
//! entry, then one playlist. Nothing here aborts the run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::archive::ArchiveLedger;
use crate::config::PlaylistConfig;
use crate::media::{MediaFetcher, MediaRequest};
use crate::metadata::{MetadataFetcher, PlaylistEntry, PlaylistLister};
use crate::pacing::Pacer;
use crate::sanitize::base_filename;
use crate::sidecar::{SIDECAR_EXTENSION, write_sidecar};

/// Counters for one playlist pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub playlist_id: String,
    pub listed: usize,
    pub skipped: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub sidecars: usize,
    /// Set when the playlist could not be prepared or listed.
    pub aborted: Option<String>,
}

/// Aggregate over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub playlists: Vec<SyncReport>,
    pub invalid_records: usize,
}

impl RunReport {
    pub fn downloaded(&self) -> usize {
        self.playlists.iter().map(|p| p.downloaded).sum()
    }

    pub fn skipped(&self) -> usize {
        self.playlists.iter().map(|p| p.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.playlists.iter().map(|p| p.failed).sum()
    }

    pub fn aborted_playlists(&self) -> usize {
        self.playlists.iter().filter(|p| p.aborted.is_some()).count()
    }

    pub fn log_summary(&self) {
        info!(
            "Run finished: {} playlist(s), {} downloaded, {} already archived, {} failed, \
             {} playlist(s) aborted, {} invalid config record(s)",
            self.playlists.len(),
            self.downloaded(),
            self.skipped(),
            self.failed(),
            self.aborted_playlists(),
            self.invalid_records,
        );
        for playlist in &self.playlists {
            if let Some(reason) = &playlist.aborted {
                warn!("  {}: {}", playlist.playlist_id, reason);
            }
        }
    }
}

/// What happened to a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
    AlreadyArchived,
    Archived { sidecar: bool },
    /// A remote call failed.
    Failed,
    /// The ledger could not be read, so nothing was sent to the remote.
    LedgerUnreadable,
}

/// The remote side, split along the three calls the loop makes.
pub struct Remote<'a> {
    pub lister: &'a dyn PlaylistLister,
    pub metadata: &'a dyn MetadataFetcher,
    pub media: &'a dyn MediaFetcher,
}

impl<'a, T> From<&'a T> for Remote<'a>
where
    T: PlaylistLister + MetadataFetcher + MediaFetcher,
{
    fn from(backend: &'a T) -> Self {
        Self {
            lister: backend,
            metadata: backend,
            media: backend,
        }
    }
}

pub struct Archiver<'a> {
    base_dir: PathBuf,
    remote: Remote<'a>,
    ledger: &'a mut dyn ArchiveLedger,
    pacer: Pacer<'a>,
}

impl<'a> Archiver<'a> {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        remote: Remote<'a>,
        ledger: &'a mut dyn ArchiveLedger,
        pacer: Pacer<'a>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            remote,
            ledger,
            pacer,
        }
    }

    pub fn playlist_dir(&self, playlist: &PlaylistConfig) -> PathBuf {
        self.base_dir.join(&playlist.folder_name)
    }

    /// Processes every playlist once, pausing between them.
    pub fn run(&mut self, playlists: &[PlaylistConfig]) -> RunReport {
        let mut report = RunReport::default();
        for (index, playlist) in playlists.iter().enumerate() {
            if index > 0 {
                self.pacer.after_playlist();
            }
            report.playlists.push(self.sync_playlist(playlist));
        }
        report
    }

    pub fn sync_playlist(&mut self, playlist: &PlaylistConfig) -> SyncReport {
        let mut report = SyncReport {
            playlist_id: playlist.id.clone(),
            ..SyncReport::default()
        };
        let playlist_dir = self.playlist_dir(playlist);

        info!("Syncing playlist {} into {}", playlist.id, playlist_dir.display());

        let prepared = fs::create_dir_all(&playlist_dir)
            .with_context(|| format!("creating {}", playlist_dir.display()))
            .and_then(|()| self.ledger.prepare(&playlist_dir));
        if let Err(err) = prepared {
            warn!("Could not prepare {}: {:#}", playlist_dir.display(), err);
            report.aborted = Some(format!("{err:#}"));
            return report;
        }

        let entries = match self.remote.lister.list(&playlist.id) {
            Ok(entries) => entries,
            Err(err) => {
                let err = anyhow::Error::from(err);
                warn!(
                    "Error occurred while listing playlist {}: {:#}",
                    playlist.folder_name, err
                );
                report.aborted = Some(format!("{err:#}"));
                return report;
            }
        };

        report.listed = entries.len();
        if entries.is_empty() {
            info!("No entries found in playlist {}", playlist.id);
            return report;
        }
        info!("Found {} entries in playlist {}", entries.len(), playlist.id);

        let total = entries.len();
        for (index, entry) in entries.iter().enumerate() {
            let outcome = self.process_entry(entry, &playlist_dir, index + 1, total);
            match outcome {
                EntryOutcome::AlreadyArchived => {
                    report.skipped += 1;
                    continue;
                }
                EntryOutcome::Archived { sidecar } => {
                    report.downloaded += 1;
                    report.sidecars += usize::from(sidecar);
                }
                EntryOutcome::Failed => report.failed += 1,
                EntryOutcome::LedgerUnreadable => {
                    report.failed += 1;
                    continue;
                }
            }
            if index + 1 < total {
                self.pacer
                    .after_entry(matches!(outcome, EntryOutcome::Archived { .. }));
            }
        }

        info!(
            "Playlist {} done: {} downloaded, {} skipped, {} failed",
            playlist.id, report.downloaded, report.skipped, report.failed
        );
        report
    }

    fn process_entry(
        &mut self,
        entry: &PlaylistEntry,
        playlist_dir: &Path,
        current: usize,
        total: usize,
    ) -> EntryOutcome {
        match self.ledger.contains(playlist_dir, &entry.id) {
            Ok(true) => {
                info!(
                    "[{}/{}] Skipping {} (already archived)",
                    current, total, entry.id
                );
                return EntryOutcome::AlreadyArchived;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(
                    "[{}/{}] Could not read ledger for {}: {:#}",
                    current, total, entry.id, err
                );
                return EntryOutcome::LedgerUnreadable;
            }
        }

        let video_url = entry.video_url();
        info!("[{}/{}] Downloading {}", current, total, video_url);

        let metadata = match self.remote.metadata.fetch(&video_url) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    "Error occurred while fetching metadata for {}: {:#}",
                    video_url,
                    anyhow::Error::from(err)
                );
                return EntryOutcome::Failed;
            }
        };

        let base_name = base_filename(&metadata.title, &metadata.uploader);
        let request = MediaRequest::new(&video_url, playlist_dir, base_name);

        let outcome = match self.remote.media.fetch(&request) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "Error occurred while downloading video {}: {:#}",
                    video_url,
                    anyhow::Error::from(err)
                );
                return EntryOutcome::Failed;
            }
        };

        let Some(video) = outcome.video else {
            warn!("Downloaded video file not found for {}.", video_url);
            return EntryOutcome::Failed;
        };
        info!("Downloaded: {}", video.display());
        for subtitle in &outcome.subtitles {
            info!("  Subtitles: {}", subtitle.display());
        }
        match &outcome.thumbnail {
            Some(thumbnail) => info!("  Thumbnail: {}", thumbnail.display()),
            None => warn!("  No thumbnail produced for {}", video_url),
        }

        let sidecar_path = video.with_extension(SIDECAR_EXTENSION);
        let sidecar = match write_sidecar(&metadata, &sidecar_path) {
            Ok(()) => {
                info!(".nfo file created: {}", sidecar_path.display());
                true
            }
            Err(err) => {
                warn!("Error writing .nfo file {}: {:#}", sidecar_path.display(), err);
                false
            }
        };

        if let Err(err) = self.ledger.record(playlist_dir, &entry.id) {
            warn!("Could not record {} in the ledger: {:#}", entry.id, err);
        }
        EntryOutcome::Archived { sidecar }
    }
}
