// In-memory remote store for component tests
use crate::application::file_store::{FileStore, StoreError, UploadFile, UploadRequest};
use crate::application::session::BearerToken;
use crate::domain::dataset::Dataset;
use crate::domain::history::HistoryEntry;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct MemoryStore {
    uploads: Mutex<VecDeque<Result<Dataset, StoreError>>>,
    held_uploads: Mutex<VecDeque<oneshot::Receiver<()>>>,
    history: Mutex<Vec<HistoryEntry>>,
    history_failure: Mutex<Option<StoreError>>,
    delete_failure: Mutex<Option<StoreError>>,
    pub calls: Mutex<Vec<String>>,
    pub upload_requests: Mutex<Vec<UploadRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(entries: Vec<HistoryEntry>) -> Self {
        let store = Self::new();
        store.set_history(entries);
        store
    }

    pub fn queue_upload(&self, result: Result<Dataset, StoreError>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    /// The next upload waits until the returned sender fires.
    pub fn hold_next_upload(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.held_uploads.lock().unwrap().push_back(rx);
        tx
    }

    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        *self.history.lock().unwrap() = entries;
    }

    pub fn fail_history(&self, error: StoreError) {
        *self.history_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_delete(&self, error: StoreError) {
        *self.delete_failure.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn upload(&self, token: &BearerToken, request: UploadRequest) -> Result<Dataset, StoreError> {
        self.record(format!("upload {} {}", request.file.file_name, token.as_str()));
        self.upload_requests.lock().unwrap().push(request);
        let result = self
            .uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Dataset::default()));
        let held = self.held_uploads.lock().unwrap().pop_front();
        if let Some(rx) = held {
            let _ = rx.await;
        }
        result
    }

    async fn list_history(&self, token: &BearerToken) -> Result<Vec<HistoryEntry>, StoreError> {
        self.record(format!("history {}", token.as_str()));
        if let Some(error) = self.history_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn delete_history(&self, token: &BearerToken, id: &str) -> Result<(), StoreError> {
        self.record(format!("delete {} {}", id, token.as_str()));
        if let Some(error) = self.delete_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.history.lock().unwrap().retain(|e| e.id != id);
        Ok(())
    }
}

pub fn sales_dataset() -> Dataset {
    serde_json::from_value(json!([
        {"region": "North", "sales": 120},
        {"region": "South", "sales": 85},
        {"region": "East", "sales": 42}
    ]))
    .unwrap()
}

pub fn entry(id: &str, dataset: Option<Dataset>, x: Option<&str>, y: Option<&str>, chart: Option<&str>) -> HistoryEntry {
    HistoryEntry {
        id: id.to_string(),
        original_filename: format!("{id}.xlsx"),
        created_at: Some("2024-06-01T10:00:00Z".parse().unwrap()),
        parsed_data: dataset,
        x_axis: x.map(str::to_string),
        y_axis: y.map(str::to_string),
        chart_type: chart.map(str::to_string),
    }
}

pub fn spreadsheet() -> Option<UploadFile> {
    Some(UploadFile::new("sales.xlsx", b"PK\x03\x04".to_vec()))
}
