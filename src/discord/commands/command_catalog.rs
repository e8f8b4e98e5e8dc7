// Discord commands module.
// Each feature gets its own command file; shared command state lives here.

use crate::core::reports::{ReportDirectory, ReportWorkflow, SystemClock};
use crate::infra::reports::JsonReportStore;
use crate::infra::settings::Settings;
use std::sync::Arc;

pub mod presence;

pub mod reports;

/// State every command and event handler can reach through `ctx.data()`.
pub struct Data {
    pub reports: Arc<ReportDirectory<JsonReportStore>>,
    pub workflow: Arc<ReportWorkflow<SystemClock>>,
    pub settings: Arc<Settings>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
