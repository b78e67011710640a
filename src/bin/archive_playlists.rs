#![forbid(unsafe_code)]

//! Command-line entry point that archives every playlist listed in a JSON
//! configuration file.
//!
//! Each playlist lands in `<base-dir>/<folder-name>/` together with a
//! `.archive.txt` ledger, so running the command again only fetches videos
//! that were added (or failed) since the previous run.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tubearchive_tools::archive::FileLedger;
use tubearchive_tools::config::{
    DEFAULT_CONFIG_PATH, DEFAULT_YT_DLP, RuntimeSettings, default_base_dir, load_playlists,
};
use tubearchive_tools::pacing::{DEFAULT_ENTRY_DELAY, DEFAULT_PLAYLIST_DELAY, Pacer, SystemClock};
use tubearchive_tools::sync::{Archiver, Remote};
use tubearchive_tools::ytdlp::YtDlp;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Download YouTube playlists and save them in organized directories."
)]
struct Cli {
    #[arg(
        value_name = "CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Path to JSON file containing playlist IDs and folder names"
    )]
    config: PathBuf,
    #[arg(
        long = "base-dir",
        value_name = "PATH",
        help = "Archive root (default: <video dir>/YouTube)"
    )]
    base_dir: Option<PathBuf>,
    #[arg(
        long = "entry-delay",
        value_name = "SECS",
        default_value_t = DEFAULT_ENTRY_DELAY.as_secs(),
        help = "Pause between videos"
    )]
    entry_delay: u64,
    #[arg(
        long = "playlist-delay",
        value_name = "SECS",
        default_value_t = DEFAULT_PLAYLIST_DELAY.as_secs(),
        help = "Pause between playlists"
    )]
    playlist_delay: u64,
    #[arg(long = "cookies", value_name = "PATH", help = "Cookies file passed to yt-dlp")]
    cookies: Option<PathBuf>,
    #[arg(
        long = "yt-dlp",
        value_name = "PATH",
        default_value = DEFAULT_YT_DLP,
        help = "yt-dlp executable to run"
    )]
    yt_dlp: PathBuf,
    #[arg(short = 'v', long = "verbose", help = "Log every yt-dlp invocation")]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            base_dir: self.base_dir.clone().unwrap_or_else(default_base_dir),
            cookies: self.cookies.clone(),
            yt_dlp: self.yt_dlp.clone(),
            ..RuntimeSettings::default()
        }
        .with_delays(self.entry_delay, self.playlist_delay)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stdout)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = cli.settings();

    let playlist_file = load_playlists(&cli.config)?;

    fs::create_dir_all(&settings.base_dir)
        .with_context(|| format!("creating {}", settings.base_dir.display()))?;

    let ytdlp = YtDlp::new(&settings.yt_dlp).with_cookies(settings.cookies.clone());
    ytdlp.ensure_available()?;

    info!("Config: {}", cli.config.display());
    info!("Base directory: {}", settings.base_dir.display());
    info!("Playlists: {}", playlist_file.playlists.len());

    let clock = SystemClock;
    let mut ledger = FileLedger::new();
    let mut archiver = Archiver::new(
        &settings.base_dir,
        Remote::from(&ytdlp),
        &mut ledger,
        Pacer::new(settings.pacing, &clock),
    );

    let mut report = archiver.run(&playlist_file.playlists);
    report.invalid_records = playlist_file.skipped;
    report.log_summary();

    Ok(())
}
