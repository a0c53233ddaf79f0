//! Batch materialization of artifacts to a destination directory.

use std::path::Path;

use sitedrop_report::{ReportEvent, send_event};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::artifact::Artifact;
use crate::error::DeliverError;

/// Stage label emitted with every progress event of a materialize call.
pub const SAVE_STAGE: &str = "Saving files to disk";

/// Color hint forwarded to the progress sink.
pub const SAVE_COLOR_HINT: &str = "var(--color-green)";

/// Writes `artifacts` under `destination` in order.
///
/// `destination` must be absolute; a relative path fails with
/// [`DeliverError::InvalidDestination`] before any event or write.
///
/// Per artifact, a 1-based `(index, total)` progress event is emitted
/// before the write. A failed write is reported on the sink with the
/// artifact's name and the batch continues with the next item; per-item
/// outcomes are observable only through the sink. An empty sequence is a
/// no-op. Duplicate names overwrite in write order.
pub async fn materialize(
    artifacts: &[&dyn Artifact],
    destination: &Path,
    events_tx: &mpsc::Sender<ReportEvent>,
) -> Result<(), DeliverError> {
    if !destination.is_absolute() {
        return Err(DeliverError::InvalidDestination(destination.to_path_buf()));
    }

    let total = artifacts.len();
    for (i, artifact) in artifacts.iter().enumerate() {
        send_event(
            events_tx,
            ReportEvent::progress(
                i + 1,
                total,
                SAVE_STAGE,
                &format!("Saving: {}", artifact.name()),
                SAVE_COLOR_HINT,
            ),
        )
        .await;

        match artifact.write_to(destination).await {
            Ok(()) => {
                debug!(name = artifact.name(), "artifact saved");
            }
            Err(e) => {
                warn!(name = artifact.name(), error = %e, "could not save artifact");
                send_event(
                    events_tx,
                    ReportEvent::error(
                        format!("Could not save file: {}", artifact.name()),
                        e.to_string(),
                    ),
                )
                .await;
                continue;
            }
        }
    }

    Ok(())
}
