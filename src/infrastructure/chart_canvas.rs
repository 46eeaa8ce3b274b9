// Chart canvas - rasterizes a chart artifact with the plotters bitmap backend
use crate::domain::chart::{ChartArtifact, ChartVariant, FontSpec, PRESENTATION, Rgba, SurfaceHandle};
use crate::domain::dataset::display_value;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::f64::consts::PI;

/// Bar and line series are painted as this many horizontal strips so the
/// vertical gradient shows.
const GRADIENT_STRIPS: usize = 32;
const LEGEND_HEIGHT: u32 = 30;
const BAR_WIDTH: f64 = 0.8;
const POINT_RADIUS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("chart drawing failed: {0}")]
pub struct DrawError(String);

impl<E> From<DrawingAreaErrorKind<E>> for DrawError
where
    E: std::error::Error + Send + Sync,
{
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        DrawError(e.to_string())
    }
}

/// RGB pixels of the surface the chart is displayed on.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RenderedSurface {
    pub fn handle(&self) -> SurfaceHandle {
        SurfaceHandle {
            width: self.width,
            height: self.height,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 3) as usize;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }
}

impl std::fmt::Debug for RenderedSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn rgba(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub fn draw(artifact: &ChartArtifact, width: u32, height: u32) -> Result<RenderedSurface, DrawError> {
    let mut pixels = vec![0u8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let (plot, legend) = root.split_vertically(height.saturating_sub(LEGEND_HEIGHT) as i32);

        match artifact.variant() {
            ChartVariant::Pie => draw_pie(&plot, artifact)?,
            ChartVariant::Bar | ChartVariant::Line => draw_cartesian(&plot, artifact)?,
        }
        draw_legend(&legend, artifact)?;
        root.present()?;
    }
    tracing::debug!("Drew {} chart with {} points at {}x{}", artifact.variant(), artifact.len(), width, height);
    Ok(RenderedSurface {
        width,
        height,
        pixels,
    })
}

/// Value axis always includes zero, with a little headroom.
fn value_range(magnitudes: &[f64]) -> (f64, f64) {
    let lo = magnitudes.iter().copied().fold(0.0_f64, f64::min);
    let hi = magnitudes.iter().copied().fold(0.0_f64, f64::max);
    if hi - lo < f64::EPSILON {
        return (lo, lo + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
}

fn draw_cartesian(area: &Area<'_>, artifact: &ChartArtifact) -> Result<(), DrawError> {
    let n = artifact.len().max(1) as f64;
    let (lo, hi) = value_range(artifact.magnitudes());

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(-0.5..n - 0.5, lo..hi)?;

    if let Some(axes) = PRESENTATION.axes_for(artifact.variant()) {
        let grid = rgba(axes.grid);
        let ticks = rgba(axes.ticks);
        let steps = 5;
        for step in 0..=steps {
            let y = lo + (hi - lo) * step as f64 / steps as f64;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, y), (n - 0.5, y)],
                ShapeStyle::from(&grid),
            )))?;
            let (px, py) = chart.backend_coord(&(-0.5, y));
            draw_text(area, &format_tick(y), (px - 36, py - 6), axis_font(axes.ticks))?;
        }
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, lo), (-0.5, hi)],
            ShapeStyle::from(&ticks),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, 0.0), (n - 0.5, 0.0)],
            ShapeStyle::from(&ticks),
        )))?;
        for (i, label) in artifact.labels().iter().enumerate() {
            let (px, py) = chart.backend_coord(&(i as f64, lo));
            let text = display_value(label.as_ref());
            draw_text(area, &text, (px - 10, py + 8), axis_font(axes.ticks))?;
        }
    }

    let border = rgba(artifact.border());
    let stroke = artifact.border_width();
    match artifact.variant() {
        ChartVariant::Line => {
            let points: Vec<(f64, f64)> = artifact
                .magnitudes()
                .iter()
                .enumerate()
                .map(|(i, m)| (i as f64, *m))
                .collect();
            chart.draw_series(LineSeries::new(
                points.iter().copied(),
                ShapeStyle::from(&border).stroke_width(stroke),
            ))?;
            let mut markers = Vec::with_capacity(points.len());
            for (i, point) in points.iter().enumerate() {
                let (_, py) = chart.backend_coord(point);
                markers.push(Circle::new(*point, POINT_RADIUS, rgba(artifact.fill_at(i, py as f64)).filled()));
                markers.push(Circle::new(*point, POINT_RADIUS, ShapeStyle::from(&border).stroke_width(stroke)));
            }
            chart.draw_series(markers)?;
        }
        _ => {
            let mut bars = Vec::new();
            for (i, m) in artifact.magnitudes().iter().enumerate() {
                let x0 = i as f64 - BAR_WIDTH / 2.0;
                let x1 = i as f64 + BAR_WIDTH / 2.0;
                for strip in 0..GRADIENT_STRIPS {
                    let a = m * strip as f64 / GRADIENT_STRIPS as f64;
                    let b = m * (strip + 1) as f64 / GRADIENT_STRIPS as f64;
                    let (_, py) = chart.backend_coord(&(i as f64, a.max(b)));
                    let fill = rgba(artifact.fill_at(i, py as f64));
                    bars.push(Rectangle::new([(x0, a), (x1, b)], fill.filled()));
                }
                bars.push(Rectangle::new(
                    [(x0, 0.0), (x1, *m)],
                    ShapeStyle::from(&border).stroke_width(stroke),
                ));
            }
            chart.draw_series(bars)?;

            let font = PRESENTATION.data_labels;
            for (i, value) in artifact.values().iter().enumerate() {
                let (px, py) = chart.backend_coord(&(i as f64, artifact.magnitudes()[i]));
                let text = display_value(value.as_ref());
                draw_text(area, &text, (px - 8, py + 4), font)?;
            }
        }
    }
    Ok(())
}

fn draw_pie(area: &Area<'_>, artifact: &ChartArtifact) -> Result<(), DrawError> {
    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64 / 2.0 - 10.0).max(1.0);

    let total: f64 = artifact.magnitudes().iter().map(|m| m.abs()).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let border = rgba(artifact.border());
    let mut start = -PI / 2.0;
    for (i, m) in artifact.magnitudes().iter().enumerate() {
        let sweep = 2.0 * PI * m.abs() / total;
        if sweep <= 0.0 {
            continue;
        }
        let steps = ((sweep / (PI / 90.0)).ceil() as usize).max(1);
        let mut outline = Vec::with_capacity(steps + 2);
        outline.push((center.0.round() as i32, center.1.round() as i32));
        for s in 0..=steps {
            let angle = start + sweep * s as f64 / steps as f64;
            outline.push((
                (center.0 + radius * angle.cos()).round() as i32,
                (center.1 + radius * angle.sin()).round() as i32,
            ));
        }

        area.draw(&Polygon::new(outline.clone(), rgba(artifact.fill_at(i, 0.0)).filled()))?;
        outline.push(outline[0]);
        area.draw(&PathElement::new(
            outline,
            ShapeStyle::from(&border).stroke_width(artifact.border_width()),
        ))?;

        let mid = start + sweep / 2.0;
        let text = display_value(artifact.values()[i].as_ref());
        let at = (
            (center.0 + radius * 0.6 * mid.cos()).round() as i32,
            (center.1 + radius * 0.6 * mid.sin()).round() as i32,
        );
        draw_text(area, &text, at, PRESENTATION.data_labels)?;
        start += sweep;
    }
    Ok(())
}

fn draw_legend(area: &Area<'_>, artifact: &ChartArtifact) -> Result<(), DrawError> {
    let font = PRESENTATION.legend;
    match artifact.variant() {
        ChartVariant::Pie => {
            let mut x = 10;
            for (i, label) in artifact.labels().iter().enumerate() {
                let text = display_value(label.as_ref());
                draw_text(area, &text, (x, 8), font)?;
                x += 12 + 9 * text.len() as i32 + 20;
                if i > 0 && x > area.dim_in_pixel().0 as i32 {
                    break;
                }
            }
        }
        _ => {
            let x = area.dim_in_pixel().0 as i32 / 2 - 60;
            draw_text(area, artifact.series_label(), (x, 8), font)?;
        }
    }
    Ok(())
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn axis_font(color: Rgba) -> FontSpec {
    FontSpec {
        size: 12,
        bold: false,
        color,
    }
}

#[cfg(feature = "fonts")]
const FONT_FAMILY: &str = "sans-serif";

/// Register the embedded faces with plotters, once per process.
#[cfg(feature = "fonts")]
fn register_fonts() -> Result<(), DrawError> {
    use plotters::style::{FontStyle, register_font};
    use std::sync::OnceLock;

    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            let faces: [(FontStyle, &'static [u8]); 2] = [
                (FontStyle::Normal, include_bytes!("../../assets/fonts/DejaVuSans.ttf")),
                (FontStyle::Bold, include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf")),
            ];
            for (style, bytes) in faces {
                register_font(FONT_FAMILY, style, bytes).map_err(|_| "invalid font".to_string())?;
            }
            Ok(())
        })
        .clone()
        .map_err(DrawError)
}

#[cfg(feature = "fonts")]
fn draw_text(area: &Area<'_>, text: &str, at: (i32, i32), font: FontSpec) -> Result<(), DrawError> {
    use plotters::style::FontStyle;

    register_fonts()?;
    let style = if font.bold { FontStyle::Bold } else { FontStyle::Normal };
    let text_style = (FONT_FAMILY, font.size as f64)
        .into_font()
        .style(style)
        .color(&rgba(font.color));
    area.draw(&Text::new(text.to_string(), at, text_style))?;
    Ok(())
}

/// Built without `fonts`: plotters has no glyph backend, so text is skipped.
#[cfg(not(feature = "fonts"))]
fn draw_text(_area: &Area<'_>, _text: &str, _at: (i32, i32), _font: FontSpec) -> Result<(), DrawError> {
    Ok(())
}
