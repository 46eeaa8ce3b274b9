// Export engine - PNG, PDF and XLSX downloads of the current chart and data
use crate::application::error::DashboardError;
use crate::application::state::SharedState;
use crate::infrastructure::export_formats::{
    DOCUMENT_FILE_NAME, ExportFile, IMAGE_FILE_NAME, TABLE_FILE_NAME, encode_pdf, encode_png,
    encode_xlsx,
};

/// Each export quietly returns `None` when there is nothing to export.
#[derive(Clone)]
pub struct ExportEngine {
    state: SharedState,
}

impl ExportEngine {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// The displayed chart surface as a PNG.
    pub fn export_image(&self) -> Result<Option<ExportFile>, DashboardError> {
        let Some(surface) = self.state.read().surface.clone() else {
            tracing::debug!("No chart displayed, skipping image export");
            return Ok(None);
        };
        Ok(Some(ExportFile {
            file_name: IMAGE_FILE_NAME,
            content_type: "image/png",
            bytes: encode_png(&surface)?,
        }))
    }

    /// The displayed chart surface on a single A4 page.
    pub fn export_document(&self) -> Result<Option<ExportFile>, DashboardError> {
        let Some(surface) = self.state.read().surface.clone() else {
            tracing::debug!("No chart displayed, skipping document export");
            return Ok(None);
        };
        Ok(Some(ExportFile {
            file_name: DOCUMENT_FILE_NAME,
            content_type: "application/pdf",
            bytes: encode_pdf(&surface)?,
        }))
    }

    /// The dataset rows as a one-sheet workbook.
    pub fn export_table(&self) -> Result<Option<ExportFile>, DashboardError> {
        let dataset = self.state.read().dataset.clone();
        if dataset.is_empty() {
            tracing::debug!("Dataset is empty, skipping table export");
            return Ok(None);
        }
        Ok(Some(ExportFile {
            file_name: TABLE_FILE_NAME,
            content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            bytes: encode_xlsx(&dataset)?,
        }))
    }
}
