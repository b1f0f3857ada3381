//! Line charts for CPU, memory and I/O series.
//!
//! A chart is first built as a [`Figure`], then either saved as an image
//! (PNG, or SVG when the output path ends in `.svg`) or shown in the terminal.

use crate::display;
use crate::metrics::{CpuPoint, IoPoint, MemoryPoint, MetricFamily, MetricsSeries};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// 12 x 6 inch figure
const FIGURE_INCHES: (u32, u32) = (12, 6);
const PNG_DPI: u32 = 300;
const SVG_DPI: u32 = 100;
const FONT: &str = "sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceColor {
    Blue,
    Red,
    Green,
}

impl TraceColor {
    pub fn rgb(self) -> RGBColor {
        match self {
            Self::Blue => BLUE,
            Self::Red => RED,
            Self::Green => GREEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
}

/// One plotted line; x is seconds since the Unix epoch
#[derive(Debug, Clone)]
pub struct Trace {
    pub label: &'static str,
    pub color: TraceColor,
    pub marker: Marker,
    pub points: Vec<(f64, f64)>,
}

impl Trace {
    pub fn new<I>(label: &'static str, color: TraceColor, marker: Marker, points: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Local>, f64)>,
    {
        Self {
            label,
            color,
            marker,
            points: points
                .into_iter()
                .map(|(t, v)| (t.timestamp() as f64, v))
                .collect(),
        }
    }
}

/// Everything needed to draw one chart, independent of the output
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: &'static str,
    pub y_desc: &'static str,
    pub traces: Vec<Trace>,
}

impl Figure {
    pub fn new(title: &'static str, y_desc: &'static str) -> Self {
        Self {
            title,
            y_desc,
            traces: Vec::new(),
        }
    }

    pub fn trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    /// A single line needs no legend
    pub fn has_legend(&self) -> bool {
        self.traces.len() > 1
    }

    fn all_points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.traces.iter().flat_map(|t| t.points.iter())
    }

    /// Time span covered, widened when all samples share one second
    pub fn x_range(&self) -> (f64, f64) {
        let (min, max) = self
            .all_points()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
                (lo.min(x), hi.max(x))
            });
        if !min.is_finite() {
            return (0.0, 1.0);
        }
        if max <= min {
            (min - 1.0, max + 1.0)
        } else {
            (min, max)
        }
    }

    /// Value span from zero (or the lowest negative value) with 10% headroom
    pub fn y_range(&self) -> (f64, f64) {
        let max = self
            .all_points()
            .map(|&(_, y)| y)
            .fold(0.0_f64, f64::max)
            .max(1.0)
            * 1.1;
        let min = self.all_points().map(|&(_, y)| y).fold(0.0_f64, f64::min) * 1.1;
        (min, max)
    }
}

/// Format an epoch-seconds axis value as local wall-clock time
pub fn clock_label(secs: f64) -> String {
    Local
        .timestamp_opt(secs.round() as i64, 0)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Where figures end up
pub trait Renderer {
    /// Write the figure to an image file
    fn save(&mut self, figure: &Figure, path: &Path) -> Result<()>;

    /// Show the figure interactively. Returns false if it could not be shown.
    fn show(&mut self, figure: &Figure) -> Result<bool>;
}

/// Image files through plotters, interactive view through the terminal
pub struct ChartRenderer;

impl Renderer for ChartRenderer {
    fn save(&mut self, figure: &Figure, path: &Path) -> Result<()> {
        render_file(figure, path)
    }

    fn show(&mut self, figure: &Figure) -> Result<bool> {
        display::show_figure(figure)
    }
}

/// What happened to one requested chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
    Saved(PathBuf),
    Displayed,
    NotDisplayed,
    NoData,
    MissingInput,
    Failed,
}

pub fn plot_family<R: Renderer>(
    renderer: &mut R,
    family: MetricFamily,
    series: &MetricsSeries,
    output: Option<&Path>,
) -> PlotOutcome {
    let missing = series.missing_columns(family);
    if !series.is_empty() && !missing.is_empty() {
        log::warn!("{} metrics are missing columns: {}", family.label(), missing.join(", "));
    }

    match family {
        MetricFamily::Cpu => plot_cpu(renderer, series, output),
        MetricFamily::Memory => plot_memory(renderer, series, output),
        MetricFamily::Io => plot_io(renderer, series, output),
    }
}

/// Plot CPU usage
pub fn plot_cpu<R: Renderer>(
    renderer: &mut R,
    series: &MetricsSeries,
    output: Option<&Path>,
) -> PlotOutcome {
    let points: Vec<CpuPoint> = series.points();
    if points.is_empty() {
        println!("No valid data to plot");
        return PlotOutcome::NoData;
    }

    let figure = Figure::new("CPU Usage Over Time", "CPU Usage (%)").trace(Trace::new(
        "CPU",
        TraceColor::Blue,
        Marker::Circle,
        points.iter().map(|p| (p.time, p.cpu_percent)),
    ));
    emit(renderer, &figure, output)
}

/// Plot resident and virtual memory size
pub fn plot_memory<R: Renderer>(
    renderer: &mut R,
    series: &MetricsSeries,
    output: Option<&Path>,
) -> PlotOutcome {
    let points: Vec<MemoryPoint> = series.points();
    if points.is_empty() {
        println!("No valid data to plot");
        return PlotOutcome::NoData;
    }

    let figure = Figure::new("Memory Usage Over Time", "Memory (MB)")
        .trace(Trace::new(
            "RSS",
            TraceColor::Red,
            Marker::Circle,
            points.iter().map(|p| (p.time, p.rss_mb)),
        ))
        .trace(Trace::new(
            "VSZ",
            TraceColor::Green,
            Marker::Square,
            points.iter().map(|p| (p.time, p.vsz_mb)),
        ));
    emit(renderer, &figure, output)
}

/// Plot read and write throughput
pub fn plot_io<R: Renderer>(
    renderer: &mut R,
    series: &MetricsSeries,
    output: Option<&Path>,
) -> PlotOutcome {
    let points: Vec<IoPoint> = series.points();
    if points.is_empty() {
        println!("No valid data to plot");
        return PlotOutcome::NoData;
    }

    let figure = Figure::new("I/O Throughput Over Time", "I/O Rate (KB/s)")
        .trace(Trace::new(
            "Read Rate",
            TraceColor::Blue,
            Marker::Circle,
            points.iter().map(|p| (p.time, p.read_kbps)),
        ))
        .trace(Trace::new(
            "Write Rate",
            TraceColor::Red,
            Marker::Square,
            points.iter().map(|p| (p.time, p.write_kbps)),
        ));
    emit(renderer, &figure, output)
}

fn emit<R: Renderer>(renderer: &mut R, figure: &Figure, output: Option<&Path>) -> PlotOutcome {
    match output {
        Some(path) => match renderer.save(figure, path) {
            Ok(()) => {
                println!("Plot saved to {}", path.display());
                PlotOutcome::Saved(path.to_path_buf())
            }
            Err(e) => {
                eprintln!("Error: failed to render {}: {:#}", path.display(), e);
                PlotOutcome::Failed
            }
        },
        None => match renderer.show(figure) {
            Ok(true) => PlotOutcome::Displayed,
            Ok(false) => PlotOutcome::NotDisplayed,
            Err(e) => {
                eprintln!("Error: failed to display chart: {:#}", e);
                PlotOutcome::Failed
            }
        },
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

fn figure_pixels(dpi: u32) -> (u32, u32) {
    (FIGURE_INCHES.0 * dpi, FIGURE_INCHES.1 * dpi)
}

/// Render a figure to `path`; the backend is picked from the extension.
/// Nothing is written unless the whole figure was drawn.
pub fn render_file(figure: &Figure, path: &Path) -> Result<()> {
    write_rendered(path, || {
        if is_svg(path) {
            render_svg(figure)
        } else {
            render_png(figure)
        }
    })
}

fn write_rendered<F>(path: &Path, render: F) -> Result<()>
where
    F: FnOnce() -> Result<Vec<u8>>,
{
    let bytes = render()?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn render_svg(figure: &Figure) -> Result<Vec<u8>> {
    let size = figure_pixels(SVG_DPI);
    log::debug!("rendering {:?} as SVG {}x{}", figure.title, size.0, size.1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(&root, figure, 1.0)?;
    }
    Ok(svg.into_bytes())
}

fn render_png(figure: &Figure) -> Result<Vec<u8>> {
    let (width, height) = figure_pixels(PNG_DPI);
    log::debug!("rendering {:?} as PNG {}x{}", figure.title, width, height);

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw_figure(&root, figure, PNG_DPI as f64 / SVG_DPI as f64)?;
    }

    let bitmap = RgbImage::from_raw(width, height, pixels)
        .context("bitmap buffer does not match the figure size")?;
    let mut png = Vec::new();
    bitmap
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(png)
}

/// Draw onto any backend; `scale` grows fonts, margins and strokes with resolution
fn draw_figure<DB>(root: &DrawingArea<DB, Shift>, figure: &Figure, scale: f64) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let px = |v: f64| (v * scale).round() as u32;
    let (x_min, x_max) = figure.x_range();
    let (y_min, y_max) = figure.y_range();

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(figure.title, (FONT, 30.0 * scale))
        .margin(px(10.0))
        .x_label_area_size(px(50.0))
        .y_label_area_size(px(70.0))
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc(figure.y_desc)
        .x_labels(8)
        .x_label_formatter(&|x| clock_label(*x))
        .label_style((FONT, 14.0 * scale))
        .axis_desc_style((FONT, 16.0 * scale))
        .bold_line_style(BLACK.mix(0.3))
        .light_line_style(BLACK.mix(0.08))
        .draw()?;

    let marker_size = (3.0 * scale).round() as i32;
    for trace in &figure.traces {
        let color = trace.color.rgb();
        let legend_len = px(20.0) as i32;

        chart
            .draw_series(LineSeries::new(
                trace.points.iter().copied(),
                color.stroke_width(px(2.0)),
            ))?
            .label(trace.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + legend_len, y)], color.stroke_width(2))
            });

        match trace.marker {
            Marker::Circle => {
                chart.draw_series(
                    trace
                        .points
                        .iter()
                        .map(|&p| Circle::new(p, marker_size, color.filled())),
                )?;
            }
            Marker::Square => {
                chart.draw_series(trace.points.iter().map(|&p| {
                    EmptyElement::at(p)
                        + Rectangle::new(
                            [(-marker_size, -marker_size), (marker_size, marker_size)],
                            color.filled(),
                        )
                }))?;
            }
        }
    }

    if figure.has_legend() {
        chart
            .configure_series_labels()
            .label_font((FONT, 14.0 * scale))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
