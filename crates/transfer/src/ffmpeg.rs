//! Thin driver around the external `ffmpeg`/`ffprobe` binaries.
//!
//! The tools are treated as opaque: this module builds command lines, reads
//! the line-oriented stderr output for the embedded `time=` stamps, and maps
//! exit conditions onto [`TransferError`].

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::TransferError;
use crate::progress::{ProgressEvent, ProgressReporter, Stage};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

const AUDIO_BITRATE: &str = "192k";

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})").unwrap());

/// What a post-processing call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The output file was already there; no work performed.
    AlreadyExists,
}

fn command(tool: &'static str) -> Command {
    let mut cmd = Command::new(tool);
    no_window(&mut cmd);
    cmd
}

/// Keep child processes from popping up a console window on Windows.
/// On other targets this is a no-op.
fn no_window(cmd: &mut Command) {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.as_std_mut().creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(windows))]
    let _ = cmd;
}

/// Verify both external tools resolve on PATH. Called once at startup;
/// a missing binary is reported, not discovered mid-task.
pub async fn ensure_tools() -> Result<(), TransferError> {
    for tool in [FFMPEG, FFPROBE] {
        let status = command(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TransferError::ToolMissing { tool });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Total duration of `input` in seconds, if ffprobe can tell.
///
/// Any failure degrades progress reporting to "unknown"; it never fails the
/// surrounding task.
pub async fn probe_duration(input: &Path) -> Option<f64> {
    let output = command(FFPROBE)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| *d > 0.0),
        Ok(out) => {
            warn!(code = ?out.status.code(), "ffprobe failed; progress will be unknown");
            None
        }
        Err(e) => {
            warn!(error = %e, "ffprobe unavailable; progress will be unknown");
            None
        }
    }
}

/// Re-encode `input` into an audio-only file at a fixed bitrate.
///
/// Short-circuits as success when `output` already exists, so a re-run of a
/// previously completed task performs no work.
pub async fn convert_to_audio(
    input: &Path,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<Outcome, TransferError> {
    if output.exists() {
        debug!(path = %output.display(), "output already exists; skipping conversion");
        return Ok(Outcome::AlreadyExists);
    }
    let duration = probe_duration(input).await;
    let mut cmd = command(FFMPEG);
    cmd.arg("-i")
        .arg(input)
        .args(["-vn", "-b:a", AUDIO_BITRATE, "-y"])
        .arg(output);
    run_with_progress(cmd, Stage::Convert, duration, reporter).await?;
    Ok(Outcome::Done)
}

/// Mux separately fetched video and audio streams into one container.
/// Stream copy only, no re-encode. Same already-exists short-circuit as
/// [`convert_to_audio`].
pub async fn merge_streams(
    video: &Path,
    audio: &Path,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<Outcome, TransferError> {
    if output.exists() {
        debug!(path = %output.display(), "output already exists; skipping merge");
        return Ok(Outcome::AlreadyExists);
    }
    let duration = probe_duration(video).await;
    let mut cmd = command(FFMPEG);
    cmd.arg("-i")
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args(["-c", "copy", "-y"])
        .arg(output);
    run_with_progress(cmd, Stage::Merge, duration, reporter).await?;
    Ok(Outcome::Done)
}

async fn run_with_progress(
    mut cmd: Command,
    stage: Stage,
    duration: Option<f64>,
    reporter: &ProgressReporter,
) -> Result<(), TransferError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            TransferError::ToolMissing { tool: FFMPEG }
        } else {
            TransferError::from(e)
        }
    })?;

    // ffmpeg writes its progress lines to stderr.
    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!("ffmpeg: {line}");
            if let (Some(total), Some(done)) = (duration, parse_progress_seconds(&line)) {
                let percent = ((done / total) * 100.0).min(100.0) as f32;
                reporter.report(ProgressEvent::percent(stage, percent));
            }
        }
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(TransferError::ToolFailed {
            tool: FFMPEG,
            code: status.code().unwrap_or(-1),
        });
    }
    if duration.is_some() {
        reporter.report(ProgressEvent::percent(stage, 100.0));
    }
    Ok(())
}

fn parse_progress_seconds(line: &str) -> Option<f64> {
    let caps = TIME_RE.captures(line)?;
    let h: f64 = caps[1].parse().ok()?;
    let m: f64 = caps[2].parse().ok()?;
    let s: f64 = caps[3].parse().ok()?;
    let cs: f64 = caps[4].parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + s + cs / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_seconds() {
        let line = "size=    1024KiB time=00:01:30.50 bitrate= 185.9kbits/s speed=30.2x";
        assert_eq!(parse_progress_seconds(line), Some(90.5));
        assert_eq!(
            parse_progress_seconds("frame=  100 fps=0.0 q=-1.0 size=N/A"),
            None
        );
        assert_eq!(parse_progress_seconds("time=01:00:00.00"), Some(3600.0));
    }

    #[tokio::test]
    async fn test_convert_skips_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("done.mp3");
        std::fs::write(&output, b"already here").unwrap();

        // input does not even exist: the short-circuit must win before any
        // tool is invoked
        let outcome = convert_to_audio(
            &dir.path().join("missing.m4a"),
            &output,
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::AlreadyExists);
        assert_eq!(std::fs::read(&output).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn test_merge_skips_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("done.mp4");
        std::fs::write(&output, b"merged").unwrap();

        let outcome = merge_streams(
            &dir.path().join("v.m4s"),
            &dir.path().join("a.m4s"),
            &output,
            &ProgressReporter::noop(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::AlreadyExists);
    }
}
