// Dashboard service - wires the pipeline components around one session
use crate::application::configurator::ChartConfigurator;
use crate::application::error::DashboardError;
use crate::application::export_service::ExportEngine;
use crate::application::file_store::{FileStore, UploadFile};
use crate::application::history_service::{ConfirmationGate, DeleteOutcome, HistoryCache};
use crate::application::renderer::render;
use crate::application::session::SessionContext;
use crate::application::state::{DashboardState, SharedState, expire_session};
use crate::application::upload_service::UploadController;
use crate::domain::chart::{ChartArtifact, ChartVariant};
use crate::domain::dataset::Dataset;
use crate::domain::history::HistoryEntry;
use crate::infrastructure::chart_canvas::{self, RenderedSurface};
use crate::infrastructure::config::ChartSettings;
use std::sync::Arc;

pub struct DashboardService {
    session: SessionContext,
    state: SharedState,
    uploads: UploadController,
    history: Arc<HistoryCache>,
    configurator: ChartConfigurator,
    exports: ExportEngine,
    chart_settings: ChartSettings,
}

impl DashboardService {
    pub fn new(store: Arc<dyn FileStore>, session: SessionContext, chart_settings: ChartSettings) -> Self {
        let state = SharedState::new();
        let history = Arc::new(HistoryCache::new(store.clone(), session.clone(), state.clone()));
        let uploads = UploadController::new(store, session.clone(), state.clone(), history.clone());
        Self {
            configurator: ChartConfigurator::new(state.clone()),
            exports: ExportEngine::new(state.clone()),
            session,
            state,
            uploads,
            history,
            chart_settings,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn configurator(&self) -> &ChartConfigurator {
        &self.configurator
    }

    pub fn exports(&self) -> &ExportEngine {
        &self.exports
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.snapshot()
    }

    pub async fn upload(
        &self,
        file: Option<UploadFile>,
        category_field: Option<String>,
        value_field: Option<String>,
        variant: ChartVariant,
    ) -> Result<Dataset, DashboardError> {
        self.uploads
            .submit(file, category_field, value_field, variant)
            .await
    }

    pub async fn refresh_history(&self) -> Result<Vec<HistoryEntry>, DashboardError> {
        self.history.refresh().await
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    pub fn load_history_by_id(&self, id: &str) -> Option<HistoryEntry> {
        self.history.load_by_id(id)
    }

    pub async fn delete_history(
        &self,
        id: &str,
        gate: &dyn ConfirmationGate,
    ) -> Result<DeleteOutcome, DashboardError> {
        self.history.delete(id, gate).await
    }

    /// Render and display the chart for the current dataset and configuration.
    ///
    /// Returns `None` and clears any displayed chart while the gate is closed.
    /// The first draw of a bar or line chart has no surface to evaluate the
    /// gradient against, so it is drawn flat and then redrawn on the surface
    /// that first pass produced.
    pub fn chart(&self) -> Result<Option<ChartArtifact>, DashboardError> {
        let (dataset, configuration, previous) = {
            let state = self.state.read();
            (
                state.dataset.clone(),
                state.configuration.clone(),
                state.surface.as_ref().map(RenderedSurface::handle),
            )
        };
        if !(configuration.is_complete() && !dataset.is_empty()) {
            let mut state = self.state.write();
            state.artifact = None;
            state.surface = None;
            return Ok(None);
        }

        let (width, height) = (self.chart_settings.width, self.chart_settings.height);
        let mut artifact = render(&dataset, &configuration, previous);
        let mut surface = chart_canvas::draw(&artifact, width, height)?;
        if artifact.awaiting_surface() {
            tracing::debug!("Redrawing {} chart with gradient fill", artifact.variant());
            artifact = render(&dataset, &configuration, Some(surface.handle()));
            surface = chart_canvas::draw(&artifact, width, height)?;
        }

        let mut state = self.state.write();
        state.artifact = Some(artifact.clone());
        state.surface = Some(surface);
        Ok(Some(artifact))
    }

    /// Drop the token and everything loaded under it.
    pub fn logout(&self) {
        expire_session(&self.session, &self.state);
        tracing::info!("Logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::file_store::StoreError;
    use crate::application::session::BearerToken;
    use crate::application::testing::{MemoryStore, entry, sales_dataset, spreadsheet};
    use crate::domain::chart::SeriesFill;
    use serde_json::json;

    fn service(store: Arc<MemoryStore>) -> DashboardService {
        let session = SessionContext::new(Some(BearerToken::new("tok")));
        DashboardService::new(
            store,
            session,
            ChartSettings {
                width: 300,
                height: 200,
            },
        )
    }

    #[tokio::test]
    async fn test_upload_configure_render_end_to_end() {
        let store = Arc::new(MemoryStore::new());
        store.queue_upload(Ok(sales_dataset()));
        let dashboard = service(store);

        dashboard
            .upload(spreadsheet(), None, None, ChartVariant::Bar)
            .await
            .unwrap();
        assert!(dashboard.chart().unwrap().is_none());

        let configurator = dashboard.configurator();
        assert_eq!(configurator.available_fields(), vec!["region", "sales"]);
        configurator.set_category_field(Some("region".into()));
        configurator.set_value_field(Some("sales".into()));
        configurator.set_variant(ChartVariant::Bar);

        let artifact = dashboard.chart().unwrap().unwrap();
        assert_eq!(
            artifact.labels(),
            &[Some(json!("North")), Some(json!("South")), Some(json!("East"))]
        );
        assert_eq!(artifact.values(), &[Some(json!(120)), Some(json!(85)), Some(json!(42))]);
        assert!(matches!(artifact.fill(), SeriesFill::Gradient(_)));

        let snapshot = dashboard.snapshot();
        assert_eq!(snapshot.surface.unwrap().handle().height, 200);
        assert!(dashboard.exports().export_image().unwrap().is_some());
        assert!(dashboard.exports().export_document().unwrap().is_some());
        assert!(dashboard.exports().export_table().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_configuration_change_withdraws_chart_exports() {
        let store = Arc::new(MemoryStore::new());
        store.queue_upload(Ok(sales_dataset()));
        let dashboard = service(store);
        dashboard
            .upload(spreadsheet(), None, None, ChartVariant::Bar)
            .await
            .unwrap();
        let configurator = dashboard.configurator();
        configurator.set_category_field(Some("region".into()));
        configurator.set_value_field(Some("sales".into()));
        dashboard.chart().unwrap().unwrap();

        configurator.set_value_field(None);
        assert!(!configurator.is_ready());
        assert!(dashboard.snapshot().artifact.is_none());
        assert!(dashboard.exports().export_image().unwrap().is_none());
        assert!(dashboard.exports().export_document().unwrap().is_none());
        assert!(dashboard.exports().export_table().unwrap().is_some());

        configurator.set_value_field(Some("sales".into()));
        dashboard.chart().unwrap().unwrap();
        configurator.set_variant(ChartVariant::Pie);
        assert!(dashboard.exports().export_image().unwrap().is_none());
        let artifact = dashboard.chart().unwrap().unwrap();
        assert_eq!(artifact.variant(), ChartVariant::Pie);
        assert_eq!(dashboard.snapshot().artifact.unwrap().variant(), ChartVariant::Pie);
    }

    #[tokio::test]
    async fn test_rejected_delete_keeps_entry_visible() {
        let store = Arc::new(MemoryStore::with_history(vec![
            entry("a", None, None, None, None),
            entry("b", None, None, None, None),
        ]));
        store.fail_delete(StoreError::Rejected {
            status: 500,
            message: "internal".into(),
        });
        let dashboard = service(store);
        dashboard.refresh_history().await.unwrap();

        assert!(dashboard.delete_history("a", &|_: &HistoryEntry| true).await.is_err());
        let ids: Vec<_> = dashboard.history().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unauthorized_refresh_clears_everything() {
        let store = Arc::new(MemoryStore::with_history(vec![entry(
            "a",
            Some(sales_dataset()),
            Some("region"),
            Some("sales"),
            Some("pie"),
        )]));
        let dashboard = service(store.clone());
        dashboard.refresh_history().await.unwrap();
        dashboard.load_history_by_id("a").unwrap();
        dashboard.chart().unwrap().unwrap();

        store.fail_history(StoreError::Unauthorized(401));
        let err = dashboard.refresh_history().await.unwrap_err();

        assert!(err.is_session_expired());
        assert!(!dashboard.session().is_active());
        let snapshot = dashboard.snapshot();
        assert!(snapshot.dataset.is_empty());
        assert!(snapshot.history.is_empty());
        assert!(snapshot.artifact.is_none());
        assert!(snapshot.surface.is_none());
    }

    #[tokio::test]
    async fn test_loading_history_replaces_displayed_chart() {
        let store = Arc::new(MemoryStore::with_history(vec![
            entry("bar", Some(sales_dataset()), Some("region"), Some("sales"), Some("bar")),
            entry("empty", None, None, None, None),
        ]));
        let dashboard = service(store);
        dashboard.refresh_history().await.unwrap();

        dashboard.load_history_by_id("bar").unwrap();
        assert!(dashboard.chart().unwrap().is_some());

        dashboard.load_history_by_id("empty").unwrap();
        assert!(dashboard.snapshot().surface.is_none());
        assert!(dashboard.chart().unwrap().is_none());
        assert!(dashboard.exports().export_image().unwrap().is_none());
        assert!(dashboard.exports().export_table().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_discards_state() {
        let store = Arc::new(MemoryStore::new());
        store.queue_upload(Ok(sales_dataset()));
        let dashboard = service(store);
        dashboard
            .upload(spreadsheet(), None, None, ChartVariant::Bar)
            .await
            .unwrap();

        dashboard.logout();
        assert!(!dashboard.session().is_active());
        assert!(dashboard.snapshot().dataset.is_empty());
        let err = dashboard.refresh_history().await.unwrap_err();
        assert!(err.is_session_expired());
    }
}
