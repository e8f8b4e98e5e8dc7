use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::core::reports::{Report, ReportStore, StoreError};

/// JSON file store for guild reports: one pretty-printed array per file.
///
/// Saves go to a sibling `.tmp` file first and are renamed over the target,
/// so a crash mid-write leaves the previous save intact.
#[derive(Debug, Default, Clone)]
pub struct JsonReportStore;

impl JsonReportStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReportStore for JsonReportStore {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn load(&self, path: &Path) -> Result<Vec<Report>, StoreError> {
        let text = fs::read_to_string(path).await?;
        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn save(&self, reports: &[Report], path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let text = serde_json::to_string_pretty(reports)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reports::{ReportDraft, ReportType};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_reports() -> Vec<Report> {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 18, 45, 0).unwrap();

        let mut first = ReportDraft::new(11, "Steve", time, "Banned 3 days").commit(1);
        first.report_type = ReportType::Grief;
        first.blocks_broken = 250;
        first.note = "Burned the spawn church".to_string();
        first.proof_urls = vec![
            "https://cdn.example/a.png".to_string(),
            "https://cdn.example/b.png".to_string(),
        ];

        // Empty note and no proof
        let mut second = ReportDraft::new(0, "Alex", time, "Warned").commit(2);
        second.report_type = ReportType::Chat;

        vec![first, second]
    }

    #[tokio::test]
    async fn test_json_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("123.json");
        let store = JsonReportStore::new();
        let reports = sample_reports();

        assert!(!store.exists(&path).await);
        store.save(&reports, &path).await.unwrap();
        assert!(store.exists(&path).await);

        let loaded = store.load(&path).await.unwrap();
        assert_eq!(loaded, reports);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("files").join("nested").join("1.json");

        JsonReportStore::new().save(&[], &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), "[]");
    }

    #[tokio::test]
    async fn test_type_is_stored_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");

        JsonReportStore::new()
            .save(&sample_reports(), &path)
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"report_type\": \"Grief\""));
        assert!(text.contains("\"proof_urls\""));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1.json");
        std::fs::write(&path, "[{ \"id\": 1, ").unwrap();

        let result = JsonReportStore::new().load(&path).await;
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = JsonReportStore::new().load(&dir.path().join("404.json")).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }
}
