// History cache - client-side mirror of server-held upload records
use crate::application::error::DashboardError;
use crate::application::file_store::FileStore;
use crate::application::generation::RequestGeneration;
use crate::application::session::{BearerToken, SessionContext};
use crate::application::state::{SharedState, expire_session, store_failure};
use crate::domain::history::HistoryEntry;
use std::sync::Arc;

/// Asked before a history entry is deleted.
pub trait ConfirmationGate: Send + Sync {
    fn confirm(&self, entry: &HistoryEntry) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&HistoryEntry) -> bool + Send + Sync,
{
    fn confirm(&self, entry: &HistoryEntry) -> bool {
        self(entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user said no; nothing was sent.
    Declined,
    /// No cached entry with that id.
    Unknown,
}

pub struct HistoryCache {
    store: Arc<dyn FileStore>,
    session: SessionContext,
    state: SharedState,
    generation: RequestGeneration,
}

impl HistoryCache {
    pub fn new(store: Arc<dyn FileStore>, session: SessionContext, state: SharedState) -> Self {
        Self {
            store,
            session,
            state,
            generation: RequestGeneration::new(),
        }
    }

    /// Cached entries in server order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.state.read().history.clone()
    }

    /// Replace the cache wholesale with the server's list.
    pub async fn refresh(&self) -> Result<Vec<HistoryEntry>, DashboardError> {
        let token = self.token()?;
        let ticket = self.generation.begin();
        tracing::debug!("Refreshing upload history (generation {})", ticket);

        let entries = self
            .store
            .list_history(&token)
            .await
            .map_err(|e| store_failure("history refresh", e, &self.session, &self.state))?;

        if !self.generation.is_current(ticket) {
            tracing::warn!("Discarding stale history response (generation {})", ticket);
            return Err(DashboardError::Superseded {
                operation: "history refresh",
            });
        }
        if !self.session.is_active() {
            return Err(expire_session(&self.session, &self.state).into());
        }

        self.state.write().history = entries.clone();
        tracing::debug!("History cache holds {} entries", entries.len());
        Ok(entries)
    }

    /// Restore an entry's snapshot as the live dataset and configuration.
    pub fn load(&self, entry: &HistoryEntry) {
        tracing::info!("Loading history entry {} ({})", entry.id, entry.original_filename);
        self.state
            .write()
            .install(entry.dataset_snapshot(), entry.configuration_snapshot());
    }

    pub fn load_by_id(&self, id: &str) -> Option<HistoryEntry> {
        let entry = self.find(id)?;
        self.load(&entry);
        Some(entry)
    }

    /// Delete an entry remotely, then drop it from the cache. A failed
    /// request leaves the cache untouched and is reported to the caller.
    pub async fn delete(
        &self,
        id: &str,
        gate: &dyn ConfirmationGate,
    ) -> Result<DeleteOutcome, DashboardError> {
        let Some(entry) = self.find(id) else {
            return Ok(DeleteOutcome::Unknown);
        };
        if !gate.confirm(&entry) {
            return Ok(DeleteOutcome::Declined);
        }

        let token = self.token()?;
        self.store
            .delete_history(&token, id)
            .await
            .map_err(|e| store_failure("history delete", e, &self.session, &self.state))?;

        self.state.write().history.retain(|e| e.id != id);
        tracing::info!("Deleted history entry {}", id);
        Ok(DeleteOutcome::Deleted)
    }

    fn find(&self, id: &str) -> Option<HistoryEntry> {
        self.state.read().history.iter().find(|e| e.id == id).cloned()
    }

    fn token(&self) -> Result<BearerToken, DashboardError> {
        self.session
            .token()
            .map_err(|_| expire_session(&self.session, &self.state).into())
    }
}
