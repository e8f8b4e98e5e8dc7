// Core reports module - moderation reports, their storage port, and the
// confirm-before-commit creation workflow.

pub mod pending_reports;
pub mod report_directory;
pub mod report_manager;
pub mod report_models;
pub mod report_store;
pub mod report_workflow;
pub mod timespan;

pub use pending_reports::{PendingReport, PendingReports};
pub use report_directory::ReportDirectory;
pub use report_manager::{CorruptDataPolicy, ReportError, REPORTS_PER_PAGE};
pub use report_models::*;
pub use report_store::{ReportStore, StoreError};
pub use report_workflow::{ReportRequest, ReportWorkflow, SystemClock, WorkflowError};
pub use timespan::parse_offense_time;
