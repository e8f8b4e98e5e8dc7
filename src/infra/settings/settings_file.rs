// Bot settings, stored as JSON next to the binary.
//
// On first run the defaults are written out so there is a file to edit.
// `DISCORD_TOKEN` (from the environment or `.env`) wins over `bot_token`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::reports::CorruptDataPolicy;

pub const DEFAULT_SETTINGS_PATH: &str = "config.json";
const PLACEHOLDER_TOKEN: &str = "new";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Discord bot token
    pub bot_token: String,
    /// Directory holding one `<guild_id>.json` report file per guild
    pub save_path: PathBuf,
    /// Publish slash command definitions on startup
    pub write_commands: bool,
    /// Name of the role allowed to use the bot
    pub staff_role: String,
    /// User who may always use the bot, regardless of roles
    pub owner_id: Option<u64>,
    /// Replace unreadable report files with an empty collection instead of
    /// refusing to serve that guild
    pub reset_corrupt_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: PLACEHOLDER_TOKEN.to_string(),
            save_path: PathBuf::from("files"),
            write_commands: true,
            staff_role: "Staff".to_string(),
            owner_id: None,
            reset_corrupt_files: false,
        }
    }
}

impl Settings {
    /// Read settings from `path`, writing the defaults there first if the file
    /// does not exist yet.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let defaults = Settings::default();
            defaults.save(path)?;
            tracing::info!(path = %path.display(), "Wrote default settings");
            return Ok(defaults);
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Settings file {} is not valid JSON", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    /// The token to log in with: the environment first, then the file.
    pub fn resolve_token(&self, env_token: Option<String>) -> Option<String> {
        env_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                Some(self.bot_token.clone())
                    .filter(|t| !t.trim().is_empty() && t != PLACEHOLDER_TOKEN)
            })
    }

    pub fn corrupt_data_policy(&self) -> CorruptDataPolicy {
        if self.reset_corrupt_files {
            CorruptDataPolicy::Reset
        } else {
            CorruptDataPolicy::Fail
        }
    }
}
