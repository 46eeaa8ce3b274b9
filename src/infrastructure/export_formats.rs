// Export encoders - PNG image, single-page PDF and XLSX workbook
use crate::domain::dataset::Dataset;
use crate::infrastructure::chart_canvas::RenderedSurface;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const IMAGE_FILE_NAME: &str = "excel-chart.png";
pub const DOCUMENT_FILE_NAME: &str = "excel-chart.pdf";
pub const TABLE_FILE_NAME: &str = "excel-parsed-data.xlsx";
pub const TABLE_SHEET_NAME: &str = "Data";

/// A4 portrait in points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
/// 10 mm in points.
const PAGE_MARGIN: f32 = 28.35;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("XLSX encoding failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An encoded export offered for download under a fixed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

pub fn encode_png(surface: &RenderedSurface) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        &surface.pixels,
        surface.width,
        surface.height,
        ColorType::Rgb8,
    )?;
    Ok(buffer)
}

/// Placement of the chart image on the page, in PDF user space
/// (origin bottom-left): x, y, width, height.
pub fn document_placement(surface_width: u32, surface_height: u32) -> (f32, f32, f32, f32) {
    let width = PAGE_WIDTH - 2.0 * PAGE_MARGIN;
    let height = if surface_width == 0 {
        0.0
    } else {
        width * surface_height as f32 / surface_width as f32
    };
    let y = PAGE_HEIGHT - PAGE_MARGIN - height;
    (PAGE_MARGIN, y, width, height)
}

pub fn encode_pdf(surface: &RenderedSurface) -> Result<Vec<u8>, ExportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&surface.pixels)?;
    let compressed = encoder.finish()?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => surface.width as i64,
            "Height" => surface.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    );
    let image_id = doc.add_object(image);

    let (x, y, width, height) = document_placement(surface.width, surface.height);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0f32.into(),
                    0f32.into(),
                    height.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im0" => image_id,
        },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0f32.into(), 0f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// One workbook cell as it will be typed in the sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCell {
    Blank,
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl From<Option<&Value>> for TableCell {
    fn from(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => TableCell::Blank,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => TableCell::Number(v),
                None => TableCell::Text(n.to_string()),
            },
            Some(Value::Bool(b)) => TableCell::Boolean(*b),
            Some(Value::String(s)) => TableCell::Text(s.clone()),
            Some(other) => TableCell::Text(other.to_string()),
        }
    }
}

/// Header row with every field seen, then one row of cells per dataset row.
pub fn table_cells(dataset: &Dataset) -> (Vec<String>, Vec<Vec<TableCell>>) {
    let header = dataset.header();
    let rows = dataset
        .rows()
        .iter()
        .map(|row| header.iter().map(|field| TableCell::from(row.get(field))).collect())
        .collect();
    (header, rows)
}

/// The `Data` sheet holding `dataset`.
pub fn table_worksheet(dataset: &Dataset) -> Result<Worksheet, ExportError> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(TABLE_SHEET_NAME)?;

    let (header, rows) = table_cells(dataset);
    for (c, field) in header.iter().enumerate() {
        worksheet.write_string(0, c as u16, field)?;
    }
    for (r, cells) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in cells.iter().enumerate() {
            let c = c as u16;
            match cell {
                TableCell::Blank => {}
                TableCell::Number(v) => {
                    worksheet.write_number(r, c, *v)?;
                }
                TableCell::Boolean(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                TableCell::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
            }
        }
    }
    Ok(worksheet)
}

pub fn encode_xlsx(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    workbook.push_worksheet(table_worksheet(dataset)?);
    Ok(workbook.save_to_buffer()?)
}
