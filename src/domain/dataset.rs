// Dataset domain model - tabular result of an upload or history load
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single spreadsheet row: field name -> scalar cell value.
pub type Row = Map<String, Value>;

/// Ordered rows as returned by the remote parser.
///
/// The field set is taken from the first row and assumed uniform.
/// A dataset is only ever replaced wholesale, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field names of the first row, in column order.
    pub fn fields(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.rows
            .first()
            .map(|row| row.contains_key(field))
            .unwrap_or(false)
    }

    /// Column of `field`, one entry per row. Rows missing the field yield `None`.
    pub fn column<'a>(&'a self, field: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.rows.iter().map(move |row| row.get(field))
    }

    /// Union of keys across all rows, in first-seen order.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !header.iter().any(|h| h == key) {
                    header.push(key.clone());
                }
            }
        }
        header
    }
}

impl From<Vec<Row>> for Dataset {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

/// Text shown for a cell on an axis or in a tooltip.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}
