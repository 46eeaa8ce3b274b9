// Remote store trait for parsing uploads and keeping upload history
use crate::application::session::BearerToken;
use crate::domain::chart::ChartVariant;
use crate::domain::dataset::Dataset;
use crate::domain::history::HistoryEntry;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

/// A spreadsheet file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.xlsx".to_string());
        Ok(Self::new(file_name, content))
    }
}

/// The file plus the configuration values sent alongside it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: UploadFile,
    pub category_field: Option<String>,
    pub value_field: Option<String>,
    pub variant: ChartVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// 401 or 403 from the remote side.
    #[error("not authorized (status {0})")]
    Unauthorized(u16),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => StoreError::Unauthorized(status),
            _ => StoreError::Rejected {
                status,
                message: message.into(),
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized(_))
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Send a spreadsheet to the remote parser and return its rows.
    async fn upload(&self, token: &BearerToken, request: UploadRequest) -> Result<Dataset, StoreError>;

    /// Authoritative upload history, in server order.
    async fn list_history(&self, token: &BearerToken) -> Result<Vec<HistoryEntry>, StoreError>;

    async fn delete_history(&self, token: &BearerToken, id: &str) -> Result<(), StoreError>;
}
