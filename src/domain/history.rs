// Upload history domain model - server-held record of a past upload
use crate::domain::chart::{ChartConfiguration, ChartVariant};
use crate::domain::dataset::Dataset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Created by the remote store; the client only removes or loads entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub original_filename: String,
    /// Absent or unparseable timestamps are kept as `None`.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parsed_data: Option<Dataset>,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub chart_type: Option<String>,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.with_timezone(&Utc))))
}

impl HistoryEntry {
    /// Dataset snapshot, empty when the record carries none.
    pub fn dataset_snapshot(&self) -> Dataset {
        self.parsed_data.clone().unwrap_or_default()
    }

    /// Chart configuration snapshot. Missing, empty or unknown values fall
    /// back to no axis selection and the bar variant.
    pub fn configuration_snapshot(&self) -> ChartConfiguration {
        let variant = self
            .chart_type
            .as_deref()
            .and_then(|t| t.parse::<ChartVariant>().ok())
            .unwrap_or_default();
        ChartConfiguration::new(self.x_axis.clone(), self.y_axis.clone(), variant)
    }
}
