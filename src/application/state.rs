// Dashboard session state shared by the pipeline components
use crate::application::error::DashboardError;
use crate::application::file_store::StoreError;
use crate::application::session::{SessionContext, SessionExpired};
use crate::domain::chart::{ChartArtifact, ChartConfiguration};
use crate::domain::dataset::Dataset;
use crate::domain::history::HistoryEntry;
use crate::infrastructure::chart_canvas::RenderedSurface;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub dataset: Dataset,
    pub configuration: ChartConfiguration,
    pub history: Vec<HistoryEntry>,
    pub artifact: Option<ChartArtifact>,
    /// Surface the chart is currently displayed on.
    pub surface: Option<RenderedSurface>,
}

impl DashboardState {
    /// Replace the dataset and configuration together; any displayed chart
    /// belonged to the old data and goes away.
    pub fn install(&mut self, dataset: Dataset, configuration: ChartConfiguration) {
        self.dataset = dataset;
        self.set_configuration(configuration);
    }

    /// Change the configuration. The displayed chart was drawn for the old
    /// one and is dropped until it is rendered again.
    pub fn set_configuration(&mut self, configuration: ChartConfiguration) {
        self.configuration = configuration;
        self.artifact = None;
        self.surface = None;
    }

    /// Chart and export UI is only active with both axes and some rows.
    pub fn chart_ready(&self) -> bool {
        self.configuration.is_complete() && !self.dataset.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<DashboardState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DashboardState {
        self.read().clone()
    }

    pub fn reset(&self) {
        *self.write() = DashboardState::default();
    }
}

/// End the session: drop the token and every piece of in-memory state.
pub(crate) fn expire_session(session: &SessionContext, state: &SharedState) -> SessionExpired {
    session.clear();
    state.reset();
    SessionExpired
}

/// Map a remote-store failure onto the dashboard taxonomy. Authorization
/// failures end the session.
pub(crate) fn store_failure(
    operation: &'static str,
    error: StoreError,
    session: &SessionContext,
    state: &SharedState,
) -> DashboardError {
    if error.is_unauthorized() {
        tracing::warn!("{} refused by remote store ({}), ending session", operation, error);
        DashboardError::SessionExpired(expire_session(session, state))
    } else {
        tracing::warn!("{} failed: {}", operation, error);
        DashboardError::Transport(error)
    }
}
