//! Delivery error types.

use std::path::PathBuf;

/// Errors produced by local delivery.
///
/// Per-artifact write failures are not represented here: they are reported
/// on the event sink and the batch continues.
#[derive(Debug, thiserror::Error)]
pub enum DeliverError {
    #[error("destination must be an absolute path: {0}")]
    InvalidDestination(PathBuf),
}
