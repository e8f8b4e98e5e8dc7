use super::report_models::Report;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt report data in {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Translates between a report file on disk and the in-memory collection.
///
/// Implementations must not cache: every `load` reads the file and every
/// `save` replaces it.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
    async fn load(&self, path: &Path) -> Result<Vec<Report>, StoreError>;
    async fn save(&self, reports: &[Report], path: &Path) -> Result<(), StoreError>;
}
