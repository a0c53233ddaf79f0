//! Artifact abstraction for local delivery.
//!
//! `Artifact` is implemented by the export pipeline that produces the
//! files. Using a trait keeps delivery decoupled from how content is
//! generated and testable with in-memory fakes.

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;

/// A named unit of output content that can write itself under a base
/// directory.
///
/// `name` is destination-relative and may contain `/` separators. The
/// materializer only borrows an artifact for the duration of one write.
pub trait Artifact: Send + Sync {
    /// Destination-relative name, e.g. `css/site.css`.
    fn name(&self) -> &str;

    /// Materializes this artifact's bytes under `base`.
    fn write_to<'a>(
        &'a self,
        base: &'a Path,
    ) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>;
}

/// An artifact backed by an in-memory byte buffer.
#[derive(Debug, Clone)]
pub struct BytesArtifact {
    name: String,
    data: Vec<u8>,
}

impl BytesArtifact {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl Artifact for BytesArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_to<'a>(
        &'a self,
        base: &'a Path,
    ) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let path = base.join(&self.name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &self.data).await
        })
    }
}
