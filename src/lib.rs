#![forbid(unsafe_code)]

//! Public entry point for the playlist archiving tools.
//!
//! The binaries only wire things together; every piece of the sync process
//! (ledger, pacing, sidecars, the yt-dlp boundary) lives here so it can be
//! exercised without touching the network.

pub mod archive;
pub mod config;
pub mod error;
pub mod media;
pub mod metadata;
pub mod pacing;
pub mod sanitize;
pub mod sidecar;
pub mod sync;
pub mod ytdlp;
