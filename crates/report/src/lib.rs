//! Progress and error events emitted by delivery operations.
//!
//! Every long-running operation in the workspace reports through an
//! [`mpsc`](tokio::sync::mpsc) channel of [`ReportEvent`]. The receiving
//! side (UI, console, log file) is an external collaborator; a dropped or
//! full receiver must never fail the operation that is reporting, so all
//! sends go through [`send_event`] which discards delivery errors.

use tokio::sync::mpsc;
use tracing::trace;

/// Default event channel capacity.
pub const CHANNEL_CAPACITY: usize = 256;

/// An event on the progress/log sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// A step of a multi-item stage is about to run.
    ///
    /// `index` is 1-based; `index == total` marks the last item.
    Progress {
        index: usize,
        total: usize,
        stage: String,
        detail: String,
        color_hint: String,
    },
    /// A non-fatal failure. The emitting operation continues.
    Error { message: String, cause: String },
}

impl ReportEvent {
    /// Builds a progress event with the given stage labels.
    pub fn progress(
        index: usize,
        total: usize,
        stage: &str,
        detail: &str,
        color_hint: &str,
    ) -> Self {
        Self::Progress {
            index,
            total,
            stage: stage.into(),
            detail: detail.into(),
            color_hint: color_hint.into(),
        }
    }

    /// Builds an error event.
    pub fn error(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            cause: cause.into(),
        }
    }
}

/// Creates a report channel with the default capacity.
pub fn channel() -> (mpsc::Sender<ReportEvent>, mpsc::Receiver<ReportEvent>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Sends an event, ignoring a closed or full sink.
///
/// The sink contract is "never throws back into the caller": an operation
/// must behave identically whether or not anyone is listening.
pub async fn send_event(tx: &mpsc::Sender<ReportEvent>, event: ReportEvent) {
    trace!(?event, "report event");
    let _ = tx.send(event).await;
}
