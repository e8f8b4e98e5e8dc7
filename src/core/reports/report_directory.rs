// Keeps exactly one `ReportManager` per guild for the lifetime of the process.
//
// Handing every command the same shared manager means all writes for a guild
// go through one lock, instead of each command re-reading the file into its
// own copy and the last writer silently winning.

use super::report_manager::{CorruptDataPolicy, ReportError, ReportManager};
use super::report_store::ReportStore;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ReportDirectory<S: ReportStore> {
    store: Arc<S>,
    root: PathBuf,
    policy: CorruptDataPolicy,
    managers: DashMap<u64, Arc<ReportManager<S>>>,
    // Serialises first-time opens so a guild can't end up with two managers.
    opening: Mutex<()>,
}

impl<S: ReportStore> ReportDirectory<S> {
    pub fn new(store: S, root: impl Into<PathBuf>, policy: CorruptDataPolicy) -> Self {
        Self {
            store: Arc::new(store),
            root: root.into(),
            policy,
            managers: DashMap::new(),
            opening: Mutex::new(()),
        }
    }

    /// Get the guild's manager, loading it from disk on first use.
    pub async fn manager(&self, guild_id: u64) -> Result<Arc<ReportManager<S>>, ReportError> {
        if let Some(manager) = self.cached(guild_id) {
            return Ok(manager);
        }

        let _guard = self.opening.lock().await;
        if let Some(manager) = self.cached(guild_id) {
            return Ok(manager);
        }

        let manager = Arc::new(
            ReportManager::open(Arc::clone(&self.store), &self.root, guild_id, self.policy).await?,
        );
        self.managers.insert(guild_id, Arc::clone(&manager));
        tracing::info!(guild_id, "Opened report manager");
        Ok(manager)
    }

    fn cached(&self, guild_id: u64) -> Option<Arc<ReportManager<S>>> {
        self.managers.get(&guild_id).map(|m| Arc::clone(m.value()))
    }
}
