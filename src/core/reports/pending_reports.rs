// In-flight report drafts, one per moderator.
//
// Nothing here is persisted: a restart drops every unconfirmed draft and the
// moderator has to start over.

use super::report_models::ReportDraft;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PendingError {
    #[error("Moderator {0} already has a report waiting for confirmation")]
    AlreadyPending(u64),
}

/// A draft waiting for its moderator to confirm or exit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReport {
    pub draft: ReportDraft,
    pub started_at: DateTime<Utc>,
}

impl PendingReport {
    pub fn moderator_id(&self) -> u64 {
        self.draft.moderator_id
    }
}

#[derive(Default)]
pub struct PendingReports {
    entries: DashMap<u64, PendingReport>,
}

impl PendingReports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `pending` for its moderator. Refuses to replace an existing draft.
    pub fn add(&self, pending: PendingReport) -> Result<(), PendingError> {
        match self.entries.entry(pending.moderator_id()) {
            Entry::Occupied(entry) => Err(PendingError::AlreadyPending(*entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(pending);
                Ok(())
            }
        }
    }

    pub fn find_by_moderator(&self, moderator_id: u64) -> Option<PendingReport> {
        self.entries.get(&moderator_id).map(|e| e.value().clone())
    }

    /// Remove exactly this entry. A newer draft by the same moderator is left
    /// alone.
    pub fn remove(&self, pending: &PendingReport) -> bool {
        self.entries
            .remove_if(&pending.moderator_id(), |_, current| current == pending)
            .is_some()
    }

    /// Returns whether anything was removed.
    pub fn remove_all_by_moderator(&self, moderator_id: u64) -> bool {
        self.entries.remove(&moderator_id).is_some()
    }

    /// Remove and return the moderator's draft in one step, so two
    /// confirmations racing each other can't both commit it.
    pub fn take_by_moderator(&self, moderator_id: u64) -> Option<PendingReport> {
        self.entries.remove(&moderator_id).map(|(_, pending)| pending)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
