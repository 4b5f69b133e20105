//! Media transfer engine: streams remote resources to local files and drives
//! the external ffmpeg/ffprobe tools, reporting progress over a channel so
//! rendering stays out of the transport path.

pub mod error;
pub mod fetch;
pub mod ffmpeg;
pub mod progress;

pub use error::TransferError;
pub use fetch::{download_client, fetch_to_file};
pub use ffmpeg::{Outcome, convert_to_audio, ensure_tools, merge_streams, probe_duration};
pub use progress::{ProgressEvent, ProgressReporter, Stage};
