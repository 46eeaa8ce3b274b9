// Dashboard error taxonomy
use crate::application::file_store::StoreError;
use crate::application::session::SessionExpired;
use crate::infrastructure::chart_canvas::DrawError;
use crate::infrastructure::export_formats::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please select a file first")]
    MissingFile,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Operation blocked before anything changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Token missing or refused; all in-memory state has been discarded.
    #[error(transparent)]
    SessionExpired(#[from] SessionExpired),

    #[error("remote store request failed: {0}")]
    Transport(#[source] StoreError),

    /// A newer request of the same kind started while this one was in flight.
    #[error("{operation} response discarded, a newer request is pending")]
    Superseded { operation: &'static str },

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl DashboardError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, DashboardError::SessionExpired(_))
    }
}
