// Report creation workflow.
//
//   start ──► pending ──► confirm(type) ──► committed to the guild's manager
//                    └──► exit          ──► discarded
//
// Checking that the person clicking confirm/exit is the moderator who started
// the report is the Discord layer's job; here every call is keyed by the
// moderator id it is given.

use super::pending_reports::{PendingError, PendingReport, PendingReports};
use super::report_manager::{ReportError, ReportManager};
use super::report_models::{Report, ReportDraft, ReportType};
use super::report_store::ReportStore;
use super::timespan::parse_offense_time;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid time: '{0}' is not a valid span or timestamp")]
    InvalidTime(String),

    #[error(transparent)]
    Pending(#[from] PendingError),

    #[error("No pending report for moderator {0}")]
    NoPendingReport(u64),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ============================================================================
// CLOCK
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// WORKFLOW
// ============================================================================

/// Everything a moderator supplies when starting a report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub moderator_id: u64,
    pub subject_name: String,
    pub punishment: String,
    /// How long ago, or when, the offense happened. Defaults to now.
    pub timespan: Option<String>,
    pub blocks_broken: Option<u64>,
    pub note: Option<String>,
}

pub struct ReportWorkflow<C: Clock> {
    pending: Arc<PendingReports>,
    clock: C,
}

impl<C: Clock> ReportWorkflow<C> {
    pub fn new(pending: Arc<PendingReports>, clock: C) -> Self {
        Self { pending, clock }
    }

    /// Current time according to the workflow's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Validate the request and hold it as the moderator's pending draft.
    pub fn start(&self, request: ReportRequest) -> Result<PendingReport, WorkflowError> {
        let now = self.clock.now();

        let offense_time = match request.timespan.as_deref() {
            Some(input) => parse_offense_time(input, now)
                .ok_or_else(|| WorkflowError::InvalidTime(input.to_string()))?,
            None => now,
        };

        let mut draft = ReportDraft::new(
            request.moderator_id,
            request.subject_name,
            offense_time,
            request.punishment,
        );
        draft.blocks_broken = request.blocks_broken.unwrap_or(0);
        draft.note = request.note.unwrap_or_default();

        let pending = PendingReport {
            draft,
            started_at: now,
        };
        self.pending.add(pending.clone())?;

        tracing::debug!(
            moderator_id = request.moderator_id,
            pending = self.pending.len(),
            "Report creation started"
        );
        Ok(pending)
    }

    /// Await `delivery`, the message that shows the moderator their draft and
    /// its confirm/exit controls. If it fails the draft is dropped, since
    /// nothing could ever confirm or exit it.
    pub async fn deliver<F, T, E>(&self, pending: &PendingReport, delivery: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let result = delivery.await;
        if result.is_err() && self.pending.remove(pending) {
            tracing::warn!(
                moderator_id = pending.moderator_id(),
                "Report draft could not be shown, discarded it"
            );
        }
        result
    }

    /// Discard the moderator's draft. Returns whether there was one.
    pub fn exit(&self, moderator_id: u64) -> bool {
        let removed = self.pending.remove_all_by_moderator(moderator_id);
        if removed {
            tracing::debug!(moderator_id, "Report creation cancelled");
        }
        removed
    }

    /// Commit the moderator's draft with the chosen type.
    ///
    /// If the commit fails the draft is put back so the moderator can retry.
    pub async fn confirm<S: ReportStore>(
        &self,
        moderator_id: u64,
        report_type: ReportType,
        manager: &ReportManager<S>,
    ) -> Result<Report, WorkflowError> {
        let pending = self
            .pending
            .take_by_moderator(moderator_id)
            .ok_or(WorkflowError::NoPendingReport(moderator_id))?;

        let mut draft = pending.draft.clone();
        draft.report_type = report_type;

        match manager.add_report(draft).await {
            Ok(report) => Ok(report),
            Err(e) => {
                if self.pending.add(pending).is_err() {
                    tracing::warn!(
                        moderator_id,
                        "Could not restore pending report after failed commit"
                    );
                }
                Err(e.into())
            }
        }
    }

    pub fn pending(&self) -> &PendingReports {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reports::report_manager::tests::MockReportStore;
    use crate::core::reports::report_manager::CorruptDataPolicy;
    use chrono::TimeZone;
    use std::path::Path;
    use std::sync::Arc;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn workflow() -> ReportWorkflow<FixedClock> {
        ReportWorkflow::new(Arc::new(PendingReports::new()), FixedClock(fixed_now()))
    }

    fn request(moderator_id: u64) -> ReportRequest {
        ReportRequest {
            moderator_id,
            subject_name: "Steve".to_string(),
            punishment: "Ban".to_string(),
            timespan: None,
            blocks_broken: Some(40),
            note: None,
        }
    }

    async fn manager() -> ReportManager<MockReportStore> {
        ReportManager::open(
            Arc::new(MockReportStore::default()),
            Path::new("files"),
            1,
            CorruptDataPolicy::Fail,
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_start_builds_draft() {
        let workflow = workflow();
        let mut req = request(7);
        req.timespan = Some("2h".to_string());
        req.note = Some("caught on camera".to_string());

        let pending = workflow.start(req).unwrap();

        assert_eq!(pending.started_at, fixed_now());
        assert_eq!(
            pending.draft.offense_time,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(pending.draft.blocks_broken, 40);
        assert_eq!(pending.draft.note, "caught on camera");
        assert_eq!(workflow.pending().find_by_moderator(7), Some(pending));
    }

    #[test]
    fn test_start_without_time_uses_now() {
        let workflow = workflow();
        let pending = workflow.start(request(7)).unwrap();
        assert_eq!(pending.draft.offense_time, fixed_now());
        assert_eq!(pending.draft.note, "");
    }

    #[test]
    fn test_invalid_time_changes_nothing() {
        let workflow = workflow();
        let mut req = request(7);
        req.timespan = Some("whenever".to_string());

        assert!(matches!(
            workflow.start(req),
            Err(WorkflowError::InvalidTime(_))
        ));
        assert!(workflow.pending().find_by_moderator(7).is_none());
    }

    #[test]
    fn test_second_start_conflicts() {
        let workflow = workflow();
        workflow.start(request(7)).unwrap();

        assert!(matches!(
            workflow.start(request(7)),
            Err(WorkflowError::Pending(PendingError::AlreadyPending(7)))
        ));
        assert!(workflow.start(request(8)).is_ok());
    }

    #[test]
    fn test_registry_is_shared_with_caller() {
        let registry = Arc::new(PendingReports::new());
        let workflow = ReportWorkflow::new(Arc::clone(&registry), FixedClock(fixed_now()));

        workflow.start(request(7)).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_moderator(7).is_some());
    }

    #[tokio::test]
    async fn test_failed_delivery_frees_the_moderator() {
        let workflow = workflow();
        let mut req = request(7);
        req.note = Some("n".repeat(2000));
        let pending = workflow.start(req).unwrap();

        let result: Result<(), &str> = workflow
            .deliver(&pending, async { Err("embed rejected") })
            .await;

        assert_eq!(result, Err("embed rejected"));
        assert!(workflow.pending().find_by_moderator(7).is_none());
        assert!(workflow.start(request(7)).is_ok());
    }

    #[tokio::test]
    async fn test_successful_delivery_keeps_draft() {
        let workflow = workflow();
        let pending = workflow.start(request(7)).unwrap();

        let result: Result<u8, &str> = workflow.deliver(&pending, async { Ok(1) }).await;

        assert_eq!(result, Ok(1));
        assert_eq!(workflow.pending().find_by_moderator(7), Some(pending));
    }

    #[tokio::test]
    async fn test_exit_discards_draft() {
        let workflow = workflow();
        let manager = manager().await;
        workflow.start(request(7)).unwrap();

        assert!(workflow.exit(7));
        assert!(workflow.pending().find_by_moderator(7).is_none());
        assert_eq!(manager.count().await, 0);

        // Exiting twice is harmless
        assert!(!workflow.exit(7));
    }

    #[tokio::test]
    async fn test_confirm_commits_draft() {
        let workflow = workflow();
        let manager = manager().await;
        workflow.start(request(7)).unwrap();

        let report = workflow
            .confirm(7, ReportType::Grief, &manager)
            .await
            .unwrap();

        assert_eq!(report.id, 1);
        assert_eq!(report.report_type, ReportType::Grief);
        assert_eq!(report.moderator_id, 7);
        assert_eq!(manager.count().await, 1);
        assert!(workflow.pending().find_by_moderator(7).is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_pending_is_not_found() {
        let workflow = workflow();
        let manager = manager().await;

        let result = workflow.confirm(7, ReportType::Hack, &manager).await;

        assert!(matches!(result, Err(WorkflowError::NoPendingReport(7))));
        assert_eq!(manager.count().await, 0);
    }

    #[tokio::test]
    async fn test_confirm_only_commits_once() {
        let workflow = workflow();
        let manager = manager().await;
        workflow.start(request(7)).unwrap();

        workflow.confirm(7, ReportType::Chat, &manager).await.unwrap();
        let again = workflow.confirm(7, ReportType::Chat, &manager).await;

        assert!(matches!(again, Err(WorkflowError::NoPendingReport(7))));
        assert_eq!(manager.count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_restores_draft() {
        let workflow = workflow();
        // Ids 1 and 3 on disk make the next id (3) collide.
        let existing = vec![
            ReportDraft::new(1, "Alex", fixed_now(), "Warn").commit(1),
            ReportDraft::new(1, "Alex", fixed_now(), "Warn").commit(3),
        ];
        let store = MockReportStore::with_file(Path::new("files").join("1.json"), existing);
        let manager = ReportManager::open(
            Arc::new(store),
            Path::new("files"),
            1,
            CorruptDataPolicy::Fail,
        )
        .await
        .unwrap();
        workflow.start(request(7)).unwrap();

        let result = workflow.confirm(7, ReportType::Grief, &manager).await;

        assert!(matches!(
            result,
            Err(WorkflowError::Report(ReportError::DuplicateId(3)))
        ));
        assert!(workflow.pending().find_by_moderator(7).is_some());
    }
}
