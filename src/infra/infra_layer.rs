// The infra module contains implementations of core traits
// plus the settings file.

#[path = "reports/mod.rs"]
pub mod reports;

#[path = "settings/settings_file.rs"]
pub mod settings;
