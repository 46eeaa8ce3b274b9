// Chart renderer - pure transform from dataset and configuration to an artifact
use crate::domain::chart::{
    BORDER_WIDTH, ChartArtifact, ChartConfiguration, ChartVariant, FALLBACK_FILL, LinearGradient,
    PIE_BORDER, SERIES_BORDER, SeriesFill, SurfaceHandle, coerce_magnitude, palette_color,
};
use crate::domain::dataset::Dataset;
use serde_json::Value;

/// Build the artifact for `configuration` over `dataset`.
///
/// One label and one value per row, in dataset order, with no grouping.
/// Rows lacking a field contribute `None`. Bar and line series get the
/// vertical gradient only when `surface` is given; without a surface the
/// flat fallback is used and the caller re-renders once one exists.
pub fn render(
    dataset: &Dataset,
    configuration: &ChartConfiguration,
    surface: Option<SurfaceHandle>,
) -> ChartArtifact {
    let category = configuration.category_field.as_deref().unwrap_or_default();
    let value = configuration.value_field.as_deref().unwrap_or_default();

    let labels: Vec<Option<Value>> = dataset.column(category).map(|v| v.cloned()).collect();
    let values: Vec<Option<Value>> = dataset.column(value).map(|v| v.cloned()).collect();
    let magnitudes = values.iter().map(|v| coerce_magnitude(v.as_ref())).collect();

    let (fill, border) = match configuration.variant {
        ChartVariant::Pie => (
            SeriesFill::PerPoint((0..dataset.len()).map(palette_color).collect()),
            PIE_BORDER,
        ),
        ChartVariant::Bar | ChartVariant::Line => {
            let fill = match surface {
                Some(handle) => SeriesFill::Gradient(LinearGradient::vertical(handle.height as f64)),
                None => SeriesFill::Flat(FALLBACK_FILL),
            };
            (fill, SERIES_BORDER)
        }
    };

    ChartArtifact {
        variant: configuration.variant,
        series_label: format!("{} by {}", value, category),
        labels,
        values,
        magnitudes,
        fill,
        border,
        border_width: BORDER_WIDTH,
    }
}
