// Chart domain models - configuration, styling and the rendered artifact
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartVariant {
    /// Categorical bar chart
    #[default]
    Bar,
    Line,
    /// Proportional pie chart
    Pie,
}

impl ChartVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartVariant::Bar => "bar",
            ChartVariant::Line => "line",
            ChartVariant::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart variant: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for ChartVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(ChartVariant::Bar),
            "line" => Ok(ChartVariant::Line),
            "pie" => Ok(ChartVariant::Pie),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Axis selection plus chart variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartConfiguration {
    pub category_field: Option<String>,
    pub value_field: Option<String>,
    pub variant: ChartVariant,
}

impl ChartConfiguration {
    pub fn new(
        category_field: Option<String>,
        value_field: Option<String>,
        variant: ChartVariant,
    ) -> Self {
        Self {
            category_field: category_field.filter(|f| !f.is_empty()),
            value_field: value_field.filter(|f| !f.is_empty()),
            variant,
        }
    }

    /// Both axes selected.
    pub fn is_complete(&self) -> bool {
        self.category_field.is_some() && self.value_field.is_some()
    }
}

/// RGBA colour with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Pie slice colours, cycled by datapoint index.
pub const PIE_PALETTE: [Rgba; 8] = [
    Rgba::new(255, 99, 132, 0.7),  // red
    Rgba::new(54, 162, 235, 0.7),  // blue
    Rgba::new(255, 206, 86, 0.7),  // yellow
    Rgba::new(75, 192, 192, 0.7),  // teal
    Rgba::new(153, 102, 255, 0.7), // purple
    Rgba::new(255, 159, 64, 0.7),  // orange
    Rgba::new(100, 255, 218, 0.7), // mint
    Rgba::new(200, 150, 255, 0.7), // lavender
];

pub fn palette_color(index: usize) -> Rgba {
    PIE_PALETTE[index % PIE_PALETTE.len()]
}

pub const GRADIENT_TOP: Rgba = Rgba::new(255, 99, 132, 0.7);
pub const GRADIENT_BOTTOM: Rgba = Rgba::new(54, 162, 235, 0.7);
/// Fill used until a display surface exists to evaluate the gradient against.
pub const FALLBACK_FILL: Rgba = Rgba::new(54, 162, 235, 0.7);
pub const SERIES_BORDER: Rgba = Rgba::opaque(54, 162, 235);
pub const PIE_BORDER: Rgba = Rgba::opaque(255, 255, 255);
pub const BORDER_WIDTH: u32 = 1;

/// Vertical gradient in surface pixel space, `top` at `y0`, `bottom` at `y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
    pub y0: f64,
    pub y1: f64,
    pub top: Rgba,
    pub bottom: Rgba,
}

impl LinearGradient {
    pub fn vertical(height: f64) -> Self {
        Self {
            y0: 0.0,
            y1: height,
            top: GRADIENT_TOP,
            bottom: GRADIENT_BOTTOM,
        }
    }

    pub fn color_at(&self, y: f64) -> Rgba {
        let span = self.y1 - self.y0;
        if span <= 0.0 {
            return self.top;
        }
        self.top.lerp(self.bottom, (y - self.y0) / span)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesFill {
    /// Single colour for the whole series (first render of a session).
    Flat(Rgba),
    Gradient(LinearGradient),
    /// One colour per datapoint.
    PerPoint(Vec<Rgba>),
}

/// Size of the surface the chart is currently displayed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub width: u32,
    pub height: u32,
}

/// Everything needed to draw one chart. Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub(crate) variant: ChartVariant,
    pub(crate) series_label: String,
    pub(crate) labels: Vec<Option<Value>>,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) magnitudes: Vec<f64>,
    pub(crate) fill: SeriesFill,
    pub(crate) border: Rgba,
    pub(crate) border_width: u32,
}

impl ChartArtifact {
    pub fn variant(&self) -> ChartVariant {
        self.variant
    }

    pub fn series_label(&self) -> &str {
        &self.series_label
    }

    /// Category cell per row; `None` when the row lacks the field.
    pub fn labels(&self) -> &[Option<Value>] {
        &self.labels
    }

    /// Raw value cell per row, as uploaded.
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Values coerced to numbers for drawing.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn fill(&self) -> &SeriesFill {
        &self.fill
    }

    pub fn border(&self) -> Rgba {
        self.border
    }

    pub fn border_width(&self) -> u32 {
        self.border_width
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Still painted with the flat fallback because no surface existed yet.
    pub fn awaiting_surface(&self) -> bool {
        self.variant != ChartVariant::Pie && matches!(self.fill, SeriesFill::Flat(_))
    }

    /// Fill of datapoint `index` whose top edge sits at pixel row `y`.
    pub fn fill_at(&self, index: usize, y: f64) -> Rgba {
        match &self.fill {
            SeriesFill::Flat(color) => *color,
            SeriesFill::Gradient(gradient) => gradient.color_at(y),
            SeriesFill::PerPoint(colors) => colors
                .get(index)
                .copied()
                .unwrap_or_else(|| palette_color(index)),
        }
    }
}

/// Numbers pass through, numeric strings are parsed, everything else is zero.
pub fn coerce_magnitude(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub size: u32,
    pub bold: bool,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipStyle {
    pub background: Rgba,
    pub title: Rgba,
    pub body: Rgba,
    pub border: Rgba,
    pub border_width: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStyle {
    pub ticks: Rgba,
    pub grid: Rgba,
}

/// Fixed presentation of data labels, tooltip, legend and axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPresentation {
    pub data_labels: FontSpec,
    pub tooltip: TooltipStyle,
    /// Legend labels, drawn in a band along the bottom of the surface.
    pub legend: FontSpec,
    pub axes: AxisStyle,
}

pub const PRESENTATION: ChartPresentation = ChartPresentation {
    data_labels: FontSpec {
        size: 16,
        bold: true,
        color: Rgba::opaque(255, 255, 255),
    },
    tooltip: TooltipStyle {
        background: Rgba::opaque(0x22, 0x22, 0x22),
        title: Rgba::opaque(0, 255, 255),
        body: Rgba::opaque(255, 255, 255),
        border: Rgba::opaque(0, 255, 255),
        border_width: 1,
        padding: 10,
    },
    legend: FontSpec {
        size: 14,
        bold: true,
        color: Rgba::opaque(0x33, 0x33, 0x33),
    },
    axes: AxisStyle {
        ticks: Rgba::opaque(0x44, 0x44, 0x44),
        grid: Rgba::opaque(0xee, 0xee, 0xee),
    },
};

impl ChartPresentation {
    /// Pie charts have no cartesian axes.
    pub fn axes_for(&self, variant: ChartVariant) -> Option<AxisStyle> {
        match variant {
            ChartVariant::Pie => None,
            _ => Some(self.axes),
        }
    }
}
