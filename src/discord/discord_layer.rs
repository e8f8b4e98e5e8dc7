// Discord layer - commands, component handlers and message events.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "reports/add_image.rs"]
pub mod add_image;
#[path = "reports/components.rs"]
pub mod components;
#[path = "reports/embeds.rs"]
pub mod embeds;
#[path = "reports/staff.rs"]
pub mod staff;

// Re-export command types for convenience
pub use commands::{Context, Data, Error};
