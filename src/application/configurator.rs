// Chart configurator - field discovery and axis/variant selection
use crate::application::state::SharedState;
use crate::domain::chart::{ChartConfiguration, ChartVariant};
use crate::domain::dataset::Dataset;

/// Fields a dataset offers for either axis: the first row's keys.
pub fn available_fields(dataset: &Dataset) -> Vec<String> {
    dataset.fields()
}

/// Setters do not check membership; an unknown field simply yields a
/// degenerate chart downstream.
#[derive(Clone)]
pub struct ChartConfigurator {
    state: SharedState,
}

impl ChartConfigurator {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub fn available_fields(&self) -> Vec<String> {
        available_fields(&self.state.read().dataset)
    }

    pub fn configuration(&self) -> ChartConfiguration {
        self.state.read().configuration.clone()
    }

    pub fn set_category_field(&self, field: Option<String>) {
        self.update(|config| config.category_field = field.filter(|f| !f.is_empty()));
    }

    pub fn set_value_field(&self, field: Option<String>) {
        self.update(|config| config.value_field = field.filter(|f| !f.is_empty()));
    }

    pub fn set_variant(&self, variant: ChartVariant) {
        self.update(|config| config.variant = variant);
    }

    fn update(&self, change: impl FnOnce(&mut ChartConfiguration)) {
        let mut state = self.state.write();
        let mut configuration = state.configuration.clone();
        change(&mut configuration);
        state.set_configuration(configuration);
    }

    pub fn is_ready(&self) -> bool {
        self.state.read().chart_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::sales_dataset;

    fn configurator() -> (ChartConfigurator, SharedState) {
        let state = SharedState::new();
        state.write().install(sales_dataset(), ChartConfiguration::default());
        (ChartConfigurator::new(state.clone()), state)
    }

    #[test]
    fn test_available_fields_come_from_first_row() {
        let (configurator, _) = configurator();
        assert_eq!(configurator.available_fields(), vec!["region", "sales"]);
        assert!(available_fields(&Dataset::default()).is_empty());
    }

    #[test]
    fn test_gate_opens_with_both_axes() {
        let (configurator, _) = configurator();
        assert!(!configurator.is_ready());

        configurator.set_category_field(Some("region".into()));
        assert!(!configurator.is_ready());

        configurator.set_value_field(Some("sales".into()));
        assert!(configurator.is_ready());

        configurator.set_value_field(Some(String::new()));
        assert!(!configurator.is_ready());
    }

    #[test]
    fn test_gate_stays_closed_on_empty_dataset() {
        let (configurator, state) = configurator();
        state.write().install(Dataset::default(), ChartConfiguration::default());
        configurator.set_category_field(Some("region".into()));
        configurator.set_value_field(Some("sales".into()));
        assert!(!configurator.is_ready());
    }

    #[test]
    fn test_setters_accept_unknown_fields() {
        let (configurator, _) = configurator();
        configurator.set_category_field(Some("nope".into()));
        configurator.set_variant(ChartVariant::Pie);

        let config = configurator.configuration();
        assert_eq!(config.category_field.as_deref(), Some("nope"));
        assert_eq!(config.variant, ChartVariant::Pie);
    }

    #[test]
    fn test_setters_drop_displayed_chart() {
        let (configurator, state) = configurator();
        state.write().artifact = Some(crate::application::renderer::render(
            &sales_dataset(),
            &ChartConfiguration::default(),
            None,
        ));

        configurator.set_variant(ChartVariant::Line);

        let snapshot = state.snapshot();
        assert!(snapshot.artifact.is_none());
        assert!(snapshot.surface.is_none());
        assert_eq!(snapshot.dataset, sales_dataset());
    }
}
