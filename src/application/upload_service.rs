// Upload controller - submits spreadsheets and installs the parsed dataset
use crate::application::error::{DashboardError, ValidationError};
use crate::application::file_store::{FileStore, UploadFile, UploadRequest};
use crate::application::generation::RequestGeneration;
use crate::application::history_service::HistoryCache;
use crate::application::session::SessionContext;
use crate::application::state::{SharedState, expire_session, store_failure};
use crate::domain::chart::{ChartConfiguration, ChartVariant};
use crate::domain::dataset::Dataset;
use std::sync::Arc;

pub struct UploadController {
    store: Arc<dyn FileStore>,
    session: SessionContext,
    state: SharedState,
    history: Arc<HistoryCache>,
    generation: RequestGeneration,
}

impl UploadController {
    pub fn new(
        store: Arc<dyn FileStore>,
        session: SessionContext,
        state: SharedState,
        history: Arc<HistoryCache>,
    ) -> Self {
        Self {
            store,
            session,
            state,
            history,
            generation: RequestGeneration::new(),
        }
    }

    /// Parse `file` remotely and make the result the live dataset.
    ///
    /// On success the axis selection is cleared, the variant goes back to
    /// bar and the history cache is refreshed. On failure nothing changes.
    pub async fn submit(
        &self,
        file: Option<UploadFile>,
        category_field: Option<String>,
        value_field: Option<String>,
        variant: ChartVariant,
    ) -> Result<Dataset, DashboardError> {
        let file = file.ok_or(ValidationError::MissingFile)?;
        let token = self
            .session
            .token()
            .map_err(|_| DashboardError::from(expire_session(&self.session, &self.state)))?;

        let ticket = self.generation.begin();
        tracing::debug!("Uploading {} (generation {})", file.file_name, ticket);

        let request = UploadRequest {
            file,
            category_field,
            value_field,
            variant,
        };
        let dataset = self
            .store
            .upload(&token, request)
            .await
            .map_err(|e| store_failure("upload", e, &self.session, &self.state))?;

        if !self.generation.is_current(ticket) {
            tracing::warn!("Discarding stale upload response (generation {})", ticket);
            return Err(DashboardError::Superseded { operation: "upload" });
        }
        if !self.session.is_active() {
            return Err(expire_session(&self.session, &self.state).into());
        }

        self.state
            .write()
            .install(dataset.clone(), ChartConfiguration::default());
        tracing::info!(
            "Installed dataset with {} rows and fields {:?}",
            dataset.len(),
            dataset.fields()
        );

        match self.history.refresh().await {
            Ok(_) => {}
            Err(e) if e.is_session_expired() => return Err(e),
            Err(e) => tracing::warn!("History refresh after upload failed: {}", e),
        }

        Ok(dataset)
    }
}
