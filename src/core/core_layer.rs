// The core module contains all report logic.
// Nothing in here knows about Discord.

#[path = "reports/mod.rs"]
pub mod reports;
