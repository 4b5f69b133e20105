use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "bvget", version, about = "Batch downloader for bilibili share links")]
pub struct Args {
    /// File with one video URL per line; blank lines and `#` comments are skipped
    #[arg(short, long, default_value = "get.txt")]
    pub input: PathBuf,

    /// Directory for temporary and final files
    #[arg(short, long, default_value = "download")]
    pub dir: PathBuf,

    /// What to download for each video
    #[arg(short, long, value_enum, default_value_t = Mode::Audio)]
    pub mode: Mode,

    /// Convert downloaded audio to mp3 (audio mode only)
    #[arg(long)]
    pub mp3: bool,

    /// Append the publish date (_YYYY-MM-DD) to output filenames
    #[arg(long)]
    pub date_suffix: bool,

    /// Check the ledger of completed downloads before processing a video
    #[arg(long)]
    pub dedup: bool,

    /// What to do with a video the ledger already records
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Skip)]
    pub on_duplicate: DuplicatePolicy,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Best video and audio streams, merged into one mp4
    Video,
    /// Best audio stream only
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Count the video as done and move on
    Skip,
    /// Download it again
    Force,
}
