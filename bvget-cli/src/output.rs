use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use transfer_engine::{ProgressEvent, Stage};

/// Drain the progress channel into a single terminal bar.
///
/// The task ends when every sender is dropped, so the caller only has to
/// drop its reporter and await the handle.
pub fn spawn_renderer(mut rx: mpsc::Receiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{prefix:>8} [{bar:40}] {pos:>3}%")
                .expect("valid progress template")
                .progress_chars("=> "),
        );
        while let Some(event) = rx.recv().await {
            bar.set_prefix(stage_label(event.stage));
            bar.set_position(event.percent.unwrap_or(0.0).round() as u64);
        }
        bar.finish_and_clear();
    })
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Download => "download",
        Stage::Convert => "convert",
        Stage::Merge => "merge",
    }
}
