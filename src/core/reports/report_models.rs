// Report domain models - pure data, no Discord types.
//
// A `ReportDraft` is what a moderator builds before confirming; it has no id.
// Committing a draft through the manager turns it into a `Report` with its
// permanent, guild-scoped id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of offense a report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReportType {
    /// Griefing or purposefully destroying builds
    #[serde(alias = "grief")]
    Grief,
    /// Tunnelling, hellevators or mass terraforming
    #[serde(alias = "tunnel")]
    Tunnel,
    /// NSFW, toxicity or other chat offenses
    #[serde(alias = "chat")]
    Chat,
    /// Hacked clients or exploits
    #[serde(alias = "hack")]
    Hack,
    /// Anything else
    #[default]
    #[serde(alias = "other")]
    Other,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::Grief,
        ReportType::Tunnel,
        ReportType::Chat,
        ReportType::Hack,
        ReportType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Grief => "Grief",
            ReportType::Tunnel => "Tunnel",
            ReportType::Chat => "Chat",
            ReportType::Hack => "Hack",
            ReportType::Other => "Other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportType::Grief => "Griefing/purposefully destroying builds.",
            ReportType::Tunnel => "Tunnelling, mass terraforming or making hellevators.",
            ReportType::Chat => "An offense in chat, like NSFW or toxicity.",
            ReportType::Hack => "A hacking player.",
            ReportType::Other => "A different kind of offense.",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown report type '{0}' (expected grief, tunnel, chat, hack or other)")]
pub struct ParseReportTypeError(pub String);

impl FromStr for ReportType {
    type Err = ParseReportTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseReportTypeError(s.to_string()))
    }
}

/// A committed moderation report.
///
/// Field aliases let us read files written by the previous version of the bot,
/// which used PascalCase names and called the moderator the "agent".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(alias = "ID")]
    pub id: u64,
    /// 0 when the report was imported without a moderator
    #[serde(default, alias = "Moderator", alias = "Agent")]
    pub moderator_id: u64,
    #[serde(alias = "Username")]
    pub subject_name: String,
    #[serde(default, alias = "Type")]
    pub report_type: ReportType,
    #[serde(alias = "Time")]
    pub offense_time: DateTime<Utc>,
    #[serde(default, alias = "Punishment")]
    pub punishment: String,
    #[serde(default, alias = "BlocksBroken")]
    pub blocks_broken: u64,
    #[serde(default, alias = "Note")]
    pub note: String,
    #[serde(default, alias = "ProofURLs")]
    pub proof_urls: Vec<String>,
}

impl Report {
    pub fn has_moderator(&self) -> bool {
        self.moderator_id != 0
    }
}

/// A report that has not been confirmed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    pub moderator_id: u64,
    pub subject_name: String,
    pub report_type: ReportType,
    pub offense_time: DateTime<Utc>,
    pub punishment: String,
    pub blocks_broken: u64,
    pub note: String,
    pub proof_urls: Vec<String>,
}

impl ReportDraft {
    pub fn new(
        moderator_id: u64,
        subject_name: impl Into<String>,
        offense_time: DateTime<Utc>,
        punishment: impl Into<String>,
    ) -> Self {
        Self {
            moderator_id,
            subject_name: subject_name.into(),
            report_type: ReportType::Other,
            offense_time,
            punishment: punishment.into(),
            blocks_broken: 0,
            note: String::new(),
            proof_urls: Vec::new(),
        }
    }

    /// Turn the draft into a report with the given id.
    pub fn commit(self, id: u64) -> Report {
        Report {
            id,
            moderator_id: self.moderator_id,
            subject_name: self.subject_name,
            report_type: self.report_type,
            offense_time: self.offense_time,
            punishment: self.punishment,
            blocks_broken: self.blocks_broken,
            note: self.note,
            proof_urls: self.proof_urls,
        }
    }
}

/// Field-by-field edit of a stored report. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPatch {
    pub report_type: Option<ReportType>,
    pub note: Option<String>,
    pub punishment: Option<String>,
    pub offense_time: Option<DateTime<Utc>>,
    pub subject_name: Option<String>,
    pub blocks_broken: Option<u64>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self.report_type.is_none()
            && self.note.is_none()
            && self.punishment.is_none()
            && self.offense_time.is_none()
            && self.subject_name.is_none()
            && self.blocks_broken.is_none()
    }

    pub fn apply(&self, report: &mut Report) {
        if let Some(report_type) = self.report_type {
            report.report_type = report_type;
        }
        if let Some(note) = &self.note {
            report.note = note.clone();
        }
        if let Some(punishment) = &self.punishment {
            report.punishment = punishment.clone();
        }
        if let Some(time) = self.offense_time {
            report.offense_time = time;
        }
        if let Some(name) = &self.subject_name {
            report.subject_name = name.clone();
        }
        if let Some(blocks) = self.blocks_broken {
            report.blocks_broken = blocks;
        }
    }
}

/// Result of an edit, so callers can show what changed.
#[derive(Debug, Clone)]
pub struct ReportUpdate {
    pub before: Report,
    pub after: Report,
}

/// One page of the newest-first report listing.
#[derive(Debug, Clone)]
pub struct ReportPage {
    /// 1-based page number
    pub page: usize,
    pub total_pages: usize,
    pub total_reports: usize,
    pub reports: Vec<Report>,
}

impl ReportPage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Aggregate view of every report filed against one player.
#[derive(Debug, Clone)]
pub struct PlayerSummary {
    pub subject_name: String,
    pub total_blocks_broken: u64,
    pub last_punishment: String,
    pub reports: Vec<Report>,
}

impl PlayerSummary {
    /// Returns `None` when there is nothing to summarise.
    pub fn from_reports(subject_name: &str, reports: Vec<Report>) -> Option<Self> {
        let last_punishment = reports.last()?.punishment.clone();
        Some(Self {
            subject_name: subject_name.to_string(),
            total_blocks_broken: reports.iter().map(|r| r.blocks_broken).sum(),
            last_punishment,
            reports,
        })
    }
}
