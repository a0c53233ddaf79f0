//! Local delivery of exported artifacts.
//!
//! Writes a sequence of in-memory artifacts under a destination directory,
//! reporting progress per item and isolating per-item failures: one bad
//! artifact never aborts the batch.

mod artifact;
mod error;
mod materialize;

pub use artifact::{Artifact, BytesArtifact};
pub use error::DeliverError;
pub use materialize::{SAVE_COLOR_HINT, SAVE_STAGE, materialize};
