use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Convert,
    Merge,
}

/// One progress sample from a transfer or an external tool run.
///
/// `percent` is `None` when no total is known (missing content length,
/// failed duration probe); consumers render that however they like.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub percent: Option<f32>,
    pub bytes_done: Option<u64>,
    pub bytes_total: Option<u64>,
}

impl ProgressEvent {
    pub fn percent(stage: Stage, percent: f32) -> Self {
        Self {
            stage,
            percent: Some(percent),
            bytes_done: None,
            bytes_total: None,
        }
    }
}

/// Best-effort sender side of the progress channel.
///
/// Reports never block the producer: a full or closed channel drops the
/// sample, the next one carries the cumulative state anyway.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// A reporter nobody listens to.
    pub fn noop() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self::new(tx)
    }

    pub fn report(&self, event: ProgressEvent) {
        let _ = self.tx.try_send(event);
    }
}
