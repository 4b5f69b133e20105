//! The per-URL state machine: resolve, dedup-check, pick streams, download,
//! post-process, record. A failure is terminal for the task and for nothing
//! else; the batch loop in `main` just moves on to the next URL.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bili_api::{BiliError, Catalog, MediaKind, VideoIdentity, WbiKeys};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};
use transfer_engine::{ProgressReporter, TransferError, ffmpeg, fetch::fetch_to_file};

use crate::cli::{DuplicatePolicy, Mode};
use crate::filename;
use crate::ledger::Ledger;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(BiliError),
    #[error("stream lookup failed: {0}")]
    StreamLookup(BiliError),
    #[error("no {0} stream available")]
    NoStreamAvailable(MediaKind),
    #[error("download failed: {0}")]
    Download(TransferError),
    #[error("transcode failed: {0}")]
    Transcode(TransferError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// Dedup check hit with the skip policy; nothing was downloaded.
    SkippedDuplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Fetching,
    Fetched,
    Converting,
    Merging,
    Completed,
    Failed,
}

/// Everything a run shares across tasks, threaded explicitly instead of
/// living in globals.
pub struct RunContext {
    pub api_client: Client,
    pub dl_client: Client,
    pub keys: WbiKeys,
    pub dir: PathBuf,
    pub mode: Mode,
    pub to_mp3: bool,
    pub date_suffix: bool,
    pub dedup: bool,
    pub on_duplicate: DuplicatePolicy,
    pub progress: ProgressReporter,
}

struct DownloadTask {
    identity: VideoIdentity,
    status: TaskStatus,
    temps: Vec<PathBuf>,
}

impl DownloadTask {
    fn new(identity: VideoIdentity) -> Self {
        Self {
            identity,
            status: TaskStatus::Pending,
            temps: Vec::new(),
        }
    }

    fn set_status(&mut self, status: TaskStatus) {
        debug!(bvid = %self.identity.bvid, from = ?self.status, to = ?status, "task transition");
        self.status = status;
    }

    fn temp_path(&mut self, dir: &Path, suffix: &str) -> PathBuf {
        let path = dir.join(format!("temp_{}{suffix}", self.identity.bvid));
        self.temps.push(path.clone());
        path
    }

    /// Remove every temporary this task created. Runs on success and on
    /// failure; files that were renamed away are simply no longer there.
    async fn sweep_temps(&mut self) {
        for temp in self.temps.drain(..) {
            match tokio::fs::remove_file(&temp).await {
                Ok(()) => debug!(path = %temp.display(), "removed temp file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %temp.display(), error = %e, "failed to remove temp file"),
            }
        }
    }
}

/// Process one URL end to end. Returns how the task ended; all temporaries
/// are swept regardless.
pub async fn run_url(
    ctx: &RunContext,
    ledger: &mut Ledger,
    url: &str,
) -> Result<TaskOutcome, TaskError> {
    info!(%url, "processing");

    let identity = bili_api::resolve_video(&ctx.api_client, url)
        .await
        .map_err(TaskError::MetadataUnavailable)?;
    info!(bvid = %identity.bvid, title = %identity.title, "resolved video");

    if ctx.dedup && ledger.contains(&identity.bvid) {
        match ctx.on_duplicate {
            DuplicatePolicy::Skip => {
                info!(bvid = %identity.bvid, "already downloaded; skipping");
                return Ok(TaskOutcome::SkippedDuplicate);
            }
            DuplicatePolicy::Force => {
                info!(bvid = %identity.bvid, "already downloaded; re-downloading as requested");
            }
        }
    }

    let mut task = DownloadTask::new(identity);
    let result = drive(ctx, &mut task).await;
    task.sweep_temps().await;

    match result {
        Ok(()) => {
            task.set_status(TaskStatus::Completed);
            // A ledger write failure costs dedup for this id, not the task.
            if let Err(e) = ledger.append(&task.identity.bvid) {
                warn!(bvid = %task.identity.bvid, error = %e, "failed to record download in ledger");
            }
            info!(bvid = %task.identity.bvid, "completed");
            Ok(TaskOutcome::Completed)
        }
        Err(e) => {
            task.set_status(TaskStatus::Failed);
            Err(e)
        }
    }
}

async fn drive(ctx: &RunContext, task: &mut DownloadTask) -> Result<(), TaskError> {
    let catalog = bili_api::fetch_catalog(&ctx.api_client, &task.identity, &ctx.keys)
        .await
        .map_err(TaskError::StreamLookup)?;

    match ctx.mode {
        Mode::Audio => run_audio(ctx, task, &catalog).await,
        Mode::Video => run_video(ctx, task, &catalog).await,
    }
}

fn pick(catalog: &Catalog, kind: MediaKind) -> Result<&bili_api::StreamDescriptor, TaskError> {
    catalog.select_best(kind).map_err(|e| match e {
        BiliError::NoStreamAvailable(kind) => TaskError::NoStreamAvailable(kind),
        other => TaskError::StreamLookup(other),
    })
}

async fn run_audio(
    ctx: &RunContext,
    task: &mut DownloadTask,
    catalog: &Catalog,
) -> Result<(), TaskError> {
    let best = pick(catalog, MediaKind::Audio)?;
    let referer = bili_api::client::video_referer(&task.identity.bvid);
    let temp = task.temp_path(&ctx.dir, ".m4a");

    task.set_status(TaskStatus::Fetching);
    fetch_to_file(
        &ctx.dl_client,
        &best.url,
        &temp,
        bili_api::DEFAULT_UA,
        &referer,
        &ctx.progress,
    )
    .await
    .map_err(TaskError::Download)?;
    task.set_status(TaskStatus::Fetched);

    let ext = if ctx.to_mp3 { "mp3" } else { "m4a" };
    let final_path = ctx.dir.join(filename::final_name(
        &task.identity.title,
        task.identity.pubdate,
        ctx.date_suffix,
        ext,
    ));

    if ctx.to_mp3 {
        task.set_status(TaskStatus::Converting);
        ffmpeg::convert_to_audio(&temp, &final_path, &ctx.progress)
            .await
            .map_err(TaskError::Transcode)?;
    } else if final_path.exists() {
        debug!(path = %final_path.display(), "final output already exists; keeping it");
    } else {
        tokio::fs::rename(&temp, &final_path)
            .await
            .map_err(|e| TaskError::Transcode(e.into()))?;
    }
    info!(path = %final_path.display(), "wrote output");
    Ok(())
}

async fn run_video(
    ctx: &RunContext,
    task: &mut DownloadTask,
    catalog: &Catalog,
) -> Result<(), TaskError> {
    let video = pick(catalog, MediaKind::Video)?;
    let audio = pick(catalog, MediaKind::Audio)?;
    let referer = bili_api::client::video_referer(&task.identity.bvid);
    let video_temp = task.temp_path(&ctx.dir, "_video.m4s");
    let audio_temp = task.temp_path(&ctx.dir, "_audio.m4s");

    task.set_status(TaskStatus::Fetching);
    for (stream, temp) in [(video, &video_temp), (audio, &audio_temp)] {
        fetch_to_file(
            &ctx.dl_client,
            &stream.url,
            temp,
            bili_api::DEFAULT_UA,
            &referer,
            &ctx.progress,
        )
        .await
        .map_err(TaskError::Download)?;
    }
    task.set_status(TaskStatus::Fetched);

    let final_path = ctx.dir.join(filename::final_name(
        &task.identity.title,
        task.identity.pubdate,
        ctx.date_suffix,
        "mp4",
    ));

    task.set_status(TaskStatus::Merging);
    ffmpeg::merge_streams(&video_temp, &audio_temp, &final_path, &ctx.progress)
        .await
        .map_err(TaskError::Transcode)?;
    info!(path = %final_path.display(), "wrote output");
    Ok(())
}
