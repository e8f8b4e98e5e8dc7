// Report manager - the authoritative view of one guild's reports.
//
// Every mutation happens under the manager's mutex and is flushed to the store
// before the lock is released, so id assignment (`count + 1`) can never race
// and memory never runs ahead of disk.

use super::report_models::{
    PlayerSummary, Report, ReportDraft, ReportPage, ReportPatch, ReportUpdate,
};
use super::report_store::{ReportStore, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Reports shown per page in the listing.
pub const REPORTS_PER_PAGE: usize = 10;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Id assignment produced an id that already exists. Only reachable with
    /// hand-edited or imported files that have gaps in their ids.
    #[error("Report id {0} is already taken")]
    DuplicateId(u64),

    #[error("Page {page} is out of range (1-{total_pages})")]
    InvalidPage { page: usize, total_pages: usize },
}

/// What to do when a guild's report file exists but cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptDataPolicy {
    /// Refuse to open the guild's manager
    #[default]
    Fail,
    /// Start over with an empty collection and overwrite the file
    Reset,
}

// ============================================================================
// MANAGER
// ============================================================================

pub struct ReportManager<S: ReportStore> {
    guild_id: u64,
    path: PathBuf,
    store: Arc<S>,
    reports: Mutex<Vec<Report>>,
}

impl<S: ReportStore> ReportManager<S> {
    /// Open the manager for `guild_id`, reading `<root>/<guild_id>.json`.
    ///
    /// A missing file is created right away so it always exists after the
    /// first use.
    pub async fn open(
        store: Arc<S>,
        root: &Path,
        guild_id: u64,
        policy: CorruptDataPolicy,
    ) -> Result<Self, ReportError> {
        let path = root.join(format!("{}.json", guild_id));

        let reports = if store.exists(&path).await {
            match store.load(&path).await {
                Ok(reports) => reports,
                Err(StoreError::Corrupt { path, source }) if policy == CorruptDataPolicy::Reset => {
                    tracing::warn!(
                        guild_id,
                        path = %path.display(),
                        "Report file is corrupt, starting over with an empty collection: {}",
                        source
                    );
                    store.save(&[], &path).await?;
                    Vec::new()
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            store.save(&[], &path).await?;
            Vec::new()
        };

        tracing::debug!(guild_id, count = reports.len(), "Loaded guild reports");

        Ok(Self {
            guild_id,
            path,
            store,
            reports: Mutex::new(reports),
        })
    }

    pub fn guild_id(&self) -> u64 {
        self.guild_id
    }

    /// Commit a draft with the next sequential id and persist it.
    pub async fn add_report(&self, draft: ReportDraft) -> Result<Report, ReportError> {
        let mut reports = self.reports.lock().await;

        let id = reports.len() as u64 + 1;
        if reports.iter().any(|r| r.id == id) {
            tracing::error!(
                guild_id = self.guild_id,
                report_id = id,
                "Generated report id already exists, refusing to add report"
            );
            return Err(ReportError::DuplicateId(id));
        }

        let report = draft.commit(id);
        reports.push(report.clone());

        if let Err(e) = self.store.save(&reports, &self.path).await {
            reports.pop();
            return Err(e.into());
        }

        tracing::info!(
            guild_id = self.guild_id,
            report_id = id,
            moderator_id = report.moderator_id,
            "Report committed"
        );
        Ok(report)
    }

    /// Case-insensitive exact match on the reported player's name.
    pub async fn get_reports_by_username(&self, name: &str) -> Vec<Report> {
        let needle = name.to_lowercase();
        let reports = self.reports.lock().await;
        reports
            .iter()
            .filter(|r| r.subject_name.to_lowercase() == needle)
            .cloned()
            .collect()
    }

    /// Totals across everything filed against `name`, or `None` if nothing was.
    pub async fn player_summary(&self, name: &str) -> Option<PlayerSummary> {
        let reports = self.get_reports_by_username(name).await;
        PlayerSummary::from_reports(name, reports)
    }

    pub async fn get_reports_by_moderator(&self, moderator_id: u64) -> Vec<Report> {
        let reports = self.reports.lock().await;
        reports
            .iter()
            .filter(|r| r.moderator_id == moderator_id)
            .cloned()
            .collect()
    }

    pub async fn try_get_report(&self, id: u64) -> Option<Report> {
        let reports = self.reports.lock().await;
        reports.iter().find(|r| r.id == id).cloned()
    }

    /// Every report in insertion (= id) order.
    #[allow(dead_code)]
    pub async fn get_all_reports(&self) -> Vec<Report> {
        self.reports.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.reports.lock().await.len()
    }

    /// Flush the current collection to disk.
    #[allow(dead_code)]
    pub async fn save_reports(&self) -> Result<(), ReportError> {
        let reports = self.reports.lock().await;
        self.store.save(&reports, &self.path).await?;
        Ok(())
    }

    /// Apply `patch` to report `id` and persist. Returns `None` if there is no
    /// such report.
    pub async fn update_report(
        &self,
        id: u64,
        patch: &ReportPatch,
    ) -> Result<Option<ReportUpdate>, ReportError> {
        let mut reports = self.reports.lock().await;
        let index = match reports.iter().position(|r| r.id == id) {
            Some(index) => index,
            None => return Ok(None),
        };

        let before = reports[index].clone();
        patch.apply(&mut reports[index]);
        let after = reports[index].clone();

        if let Err(e) = self.store.save(&reports, &self.path).await {
            reports[index] = before;
            return Err(e.into());
        }

        tracing::info!(guild_id = self.guild_id, report_id = id, "Report edited");
        Ok(Some(ReportUpdate { before, after }))
    }

    /// Append proof URLs to report `id`, keeping call order. Returns `None` if
    /// there is no such report.
    pub async fn add_images(
        &self,
        id: u64,
        urls: Vec<String>,
    ) -> Result<Option<Report>, ReportError> {
        let mut reports = self.reports.lock().await;
        let report = match reports.iter_mut().find(|r| r.id == id) {
            Some(report) => report,
            None => return Ok(None),
        };

        let previous_len = report.proof_urls.len();
        let added = urls.len();
        report.proof_urls.extend(urls);
        let updated = report.clone();

        if let Err(e) = self.store.save(&reports, &self.path).await {
            if let Some(report) = reports.iter_mut().find(|r| r.id == id) {
                report.proof_urls.truncate(previous_len);
            }
            return Err(e.into());
        }

        tracing::info!(
            guild_id = self.guild_id,
            report_id = id,
            added,
            "Proof images added"
        );
        Ok(Some(updated))
    }

    /// Newest-first listing. Page numbers start at 1; an empty collection
    /// still has one (empty) page.
    pub async fn page(&self, page: usize, per_page: usize) -> Result<ReportPage, ReportError> {
        let per_page = per_page.max(1);
        let reports = self.reports.lock().await;
        let total_reports = reports.len();
        let total_pages = total_reports.div_ceil(per_page).max(1);

        if page == 0 || page > total_pages {
            return Err(ReportError::InvalidPage { page, total_pages });
        }

        let items = reports
            .iter()
            .rev()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        Ok(ReportPage {
            page,
            total_pages,
            total_reports,
            reports: items,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use dashmap::{DashMap, DashSet};
    use crate::core::reports::ReportType;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store for testing
    #[derive(Default)]
    pub(crate) struct MockReportStore {
        files: DashMap<PathBuf, Vec<Report>>,
        corrupt: DashSet<PathBuf>,
        fail_saves: AtomicBool,
    }

    impl MockReportStore {
        pub(crate) fn with_file(path: PathBuf, reports: Vec<Report>) -> Self {
            let store = Self::default();
            store.files.insert(path, reports);
            store
        }

        pub(crate) fn saved(&self, path: &Path) -> Option<Vec<Report>> {
            self.files.get(path).map(|r| r.clone())
        }
    }

    #[async_trait]
    impl ReportStore for MockReportStore {
        async fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path) || self.corrupt.contains(path)
        }

        async fn load(&self, path: &Path) -> Result<Vec<Report>, StoreError> {
            if self.corrupt.contains(path) {
                let source = serde_json::from_str::<Vec<Report>>("{ not json").unwrap_err();
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                });
            }
            Ok(self.files.get(path).map(|r| r.clone()).unwrap_or_default())
        }

        async fn save(&self, reports: &[Report], path: &Path) -> Result<(), StoreError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.corrupt.remove(path);
            self.files.insert(path.to_path_buf(), reports.to_vec());
            Ok(())
        }
    }

    const GUILD: u64 = 42;

    fn root() -> PathBuf {
        PathBuf::from("files")
    }

    fn guild_path() -> PathBuf {
        root().join(format!("{}.json", GUILD))
    }

    pub(crate) fn draft(moderator_id: u64, player: &str) -> ReportDraft {
        ReportDraft::new(moderator_id, player, Utc::now(), "Ban")
    }

    async fn open(store: Arc<MockReportStore>) -> ReportManager<MockReportStore> {
        ReportManager::open(store, &root(), GUILD, CorruptDataPolicy::Fail)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;

        assert_eq!(manager.count().await, 0);
        assert_eq!(store.saved(&guild_path()), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;

        for expected in 1..=5u64 {
            let report = manager.add_report(draft(7, "Steve")).await.unwrap();
            assert_eq!(report.id, expected);
        }

        let ids: Vec<u64> = manager.get_all_reports().await.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(store.saved(&guild_path()).unwrap().len(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_get_distinct_ids() {
        let store = Arc::new(MockReportStore::default());
        let manager = Arc::new(open(store).await);

        let mut handles = Vec::new();
        for i in 0..32u64 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.add_report(draft(i, "Steve")).await.unwrap().id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=32).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_reopen_rehydrates_from_store() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();
        manager.add_report(draft(7, "Alex")).await.unwrap();

        let reopened = open(store).await;
        assert_eq!(reopened.count().await, 2);
        assert_eq!(reopened.add_report(draft(7, "Herobrine")).await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_username_lookup_ignores_case() {
        let manager = open(Arc::new(MockReportStore::default())).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();
        manager.add_report(draft(7, "Alex")).await.unwrap();
        manager.add_report(draft(8, "steve")).await.unwrap();

        let upper = manager.get_reports_by_username("Steve").await;
        let mixed = manager.get_reports_by_username("sTEVE").await;
        assert_eq!(upper, mixed);
        assert_eq!(upper.len(), 2);
        assert!(manager.get_reports_by_username("Notch").await.is_empty());
    }

    #[tokio::test]
    async fn test_player_summary_totals_blocks() {
        let manager = open(Arc::new(MockReportStore::default())).await;
        let mut first = draft(7, "Steve");
        first.blocks_broken = 30;
        first.punishment = "Warn".to_string();
        let mut second = draft(8, "STEVE");
        second.blocks_broken = 12;
        second.punishment = "Ban".to_string();
        manager.add_report(first).await.unwrap();
        manager.add_report(draft(7, "Alex")).await.unwrap();
        manager.add_report(second).await.unwrap();

        let summary = manager.player_summary("steve").await.unwrap();
        assert_eq!(summary.total_blocks_broken, 42);
        assert_eq!(summary.last_punishment, "Ban");
        assert_eq!(summary.reports.len(), 2);
        assert!(manager.player_summary("Notch").await.is_none());
    }

    #[tokio::test]
    async fn test_moderator_and_id_lookup() {
        let manager = open(Arc::new(MockReportStore::default())).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();
        manager.add_report(draft(8, "Alex")).await.unwrap();
        manager.add_report(draft(7, "Notch")).await.unwrap();

        let by_seven: Vec<u64> = manager
            .get_reports_by_moderator(7)
            .await
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_seven, vec![1, 3]);
        assert!(manager.get_reports_by_moderator(9).await.is_empty());

        assert_eq!(manager.try_get_report(2).await.unwrap().subject_name, "Alex");
        assert!(manager.try_get_report(4).await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_refused() {
        let existing = vec![draft(1, "Steve").commit(1), draft(1, "Alex").commit(3)];
        let store = Arc::new(MockReportStore::with_file(guild_path(), existing));
        let manager = open(Arc::clone(&store)).await;

        let result = manager.add_report(draft(1, "Notch")).await;
        assert!(matches!(result, Err(ReportError::DuplicateId(3))));
        assert_eq!(manager.count().await, 2);
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_add() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();

        store.fail_saves.store(true, Ordering::SeqCst);
        let result = manager.add_report(draft(7, "Alex")).await;
        assert!(matches!(result, Err(ReportError::Store(StoreError::Io(_)))));
        assert_eq!(manager.count().await, 1);

        store.fail_saves.store(false, Ordering::SeqCst);
        assert_eq!(manager.add_report(draft(7, "Alex")).await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_update_report_persists_patch() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();

        let patch = ReportPatch {
            report_type: Some(ReportType::Hack),
            note: Some("x-ray".to_string()),
            ..Default::default()
        };
        let update = manager.update_report(1, &patch).await.unwrap().unwrap();

        assert_eq!(update.before.note, "");
        assert_eq!(update.after.note, "x-ray");
        let saved = store.saved(&guild_path()).unwrap();
        assert_eq!(saved[0].report_type, ReportType::Hack);

        assert!(manager.update_report(9, &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back_update() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();

        store.fail_saves.store(true, Ordering::SeqCst);
        let patch = ReportPatch {
            punishment: Some("Kick".to_string()),
            ..Default::default()
        };
        assert!(manager.update_report(1, &patch).await.is_err());
        assert_eq!(manager.try_get_report(1).await.unwrap().punishment, "Ban");
    }

    #[tokio::test]
    async fn test_images_are_appended_in_order() {
        let store = Arc::new(MockReportStore::default());
        let manager = open(Arc::clone(&store)).await;
        manager.add_report(draft(7, "Steve")).await.unwrap();

        manager
            .add_images(1, vec!["https://a.png".to_string()])
            .await
            .unwrap();
        let report = manager
            .add_images(1, vec!["https://b.png".to_string(), "https://a.png".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            report.proof_urls,
            vec!["https://a.png", "https://b.png", "https://a.png"]
        );
        assert_eq!(store.saved(&guild_path()).unwrap()[0].proof_urls.len(), 3);
        assert!(manager.add_images(5, vec![]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pagination_is_newest_first() {
        let manager = open(Arc::new(MockReportStore::default())).await;
        for i in 0..23 {
            manager.add_report(draft(7, &format!("player{}", i))).await.unwrap();
        }

        let first = manager.page(1, REPORTS_PER_PAGE).await.unwrap();
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.reports.first().unwrap().id, 23);
        assert_eq!(first.reports.last().unwrap().id, 14);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = manager.page(3, REPORTS_PER_PAGE).await.unwrap();
        let ids: Vec<u64> = last.reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(!last.has_next());

        assert!(matches!(
            manager.page(0, REPORTS_PER_PAGE).await,
            Err(ReportError::InvalidPage { page: 0, total_pages: 3 })
        ));
        assert!(matches!(
            manager.page(4, REPORTS_PER_PAGE).await,
            Err(ReportError::InvalidPage { page: 4, total_pages: 3 })
        ));
    }

    #[tokio::test]
    async fn test_empty_collection_has_one_page() {
        let manager = open(Arc::new(MockReportStore::default())).await;
        let page = manager.page(1, REPORTS_PER_PAGE).await.unwrap();
        assert_eq!(page.total_pages, 1);
        assert!(page.reports.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_policy() {
        let store = Arc::new(MockReportStore::default());
        store.corrupt.insert(guild_path());

        let failed =
            ReportManager::open(Arc::clone(&store), &root(), GUILD, CorruptDataPolicy::Fail).await;
        assert!(matches!(
            failed,
            Err(ReportError::Store(StoreError::Corrupt { .. }))
        ));

        let reset =
            ReportManager::open(Arc::clone(&store), &root(), GUILD, CorruptDataPolicy::Reset)
                .await
                .unwrap();
        assert_eq!(reset.count().await, 0);
        assert_eq!(store.saved(&guild_path()), Some(Vec::new()));
    }
}
