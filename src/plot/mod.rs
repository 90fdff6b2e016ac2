//! Synchronization-check figures
//!
//! Every data stream is drawn as a panel: one or more traces over time plus
//! the marker events as red points on the trace's minimum. Two layouts share
//! the panel rendering:
//!
//! - [`combined_plot`]: all panels stacked in `combined_sync_check.png`
//! - [`single_plot`]: one `<stream>_sync_check.png` per stream

pub mod fonts;
pub mod style;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::merger::align_to_markers;
use crate::table::{AlignedTable, MarkerTable, StreamTables};
use self::fonts::FONT_FAMILY;
use self::style::{EYE_TRACKER_CHANNELS, FigureSize, MARKER_RED, TRACE_BLACK};

/// File name of the combined figure
pub const COMBINED_FIGURE: &str = "combined_sync_check.png";

/// Output path of a stream's individual figure
pub fn single_figure_path(output_dir: &Path, stream_name: &str) -> PathBuf {
    output_dir.join(format!("{}_sync_check.png", stream_name))
}

/// Y-axis bounds per stream, keyed by stream name or a fragment of it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YLimits {
    entries: Vec<(String, (f64, f64))>,
}

impl YLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the bounds for `key`
    pub fn insert(&mut self, key: impl Into<String>, bounds: (f64, f64)) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = bounds,
            None => self.entries.push((key, bounds)),
        }
    }

    /// Bounds for a stream: exact key first, then the first key contained in
    /// the stream name. Keys matching nothing are ignored.
    pub fn lookup(&self, stream_name: &str) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .find(|(k, _)| k == stream_name)
            .or_else(|| self.entries.iter().find(|(k, _)| stream_name.contains(k.as_str())))
            .map(|&(_, bounds)| bounds)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, (f64, f64))> for YLimits {
    fn from_iter<I: IntoIterator<Item = (K, (f64, f64))>>(iter: I) -> Self {
        let mut limits = YLimits::new();
        for (key, bounds) in iter {
            limits.insert(key, bounds);
        }
        limits
    }
}

/// Order in which eye tracker channels are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Order of [`EYE_TRACKER_CHANNELS`]
    AllowList,
    /// Order of the stream's columns
    Columns,
}

/// One line of a panel
#[derive(Debug, Clone)]
pub struct Trace {
    pub label: String,
    pub colour: RGBColor,
    pub points: Vec<(f64, f64)>,
}

/// Everything needed to draw one stream
#[derive(Debug, Clone)]
pub struct Panel {
    pub name: String,
    pub traces: Vec<Trace>,
    pub markers: Vec<(f64, f64)>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

fn column_points(table: &AlignedTable, column: usize) -> Option<Vec<(f64, f64)>> {
    let values = table.numeric_column(column)?;
    Some(
        table
            .timestamps
            .iter()
            .zip(values)
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|(&t, v)| (t, v))
            .collect(),
    )
}

/// Traces drawn for a stream.
///
/// Eye tracker streams get every allow-listed channel they carry, in fixed
/// colours; any other stream gets its first column in black.
pub fn traces(table: &AlignedTable, order: ChannelOrder) -> Vec<Trace> {
    if !style::is_eye_tracker(&table.name) {
        return column_points(table, 0)
            .map(|points| Trace {
                label: format!("{} Data", table.name),
                colour: TRACE_BLACK,
                points,
            })
            .into_iter()
            .collect();
    }

    let picked: Vec<(usize, &str, RGBColor)> = match order {
        ChannelOrder::AllowList => EYE_TRACKER_CHANNELS
            .iter()
            .filter_map(|&(name, colour)| {
                table
                    .columns
                    .iter()
                    .position(|c| c == name)
                    .map(|i| (i, name, colour))
            })
            .collect(),
        ChannelOrder::Columns => table
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| style::eye_tracker_colour(c).map(|colour| (i, c.as_str(), colour)))
            .collect(),
    };

    picked
        .into_iter()
        .filter_map(|(index, label, colour)| {
            column_points(table, index).map(|points| Trace {
                label: label.to_string(),
                colour,
                points,
            })
        })
        .collect()
}

/// Height at which markers are drawn: the minimum of the first column
pub fn marker_baseline(table: &AlignedTable) -> f64 {
    table
        .numeric_column(0)
        .and_then(|values| {
            values
                .into_iter()
                .filter(|v| v.is_finite())
                .reduce(f64::min)
        })
        .unwrap_or(0.0)
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    if max <= min {
        return (min - 0.5, max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// Lay out the panel of one aligned stream
pub fn build_panel(
    table: &AlignedTable,
    markers: &MarkerTable,
    order: ChannelOrder,
    y_limits: &YLimits,
) -> Panel {
    let traces = traces(table, order);
    let baseline = marker_baseline(table);
    let marker_points: Vec<(f64, f64)> = markers
        .timestamps
        .iter()
        .filter(|t| t.is_finite())
        .map(|&t| (t, baseline))
        .collect();

    let xs = table
        .timestamps
        .iter()
        .copied()
        .chain(marker_points.iter().map(|&(t, _)| t))
        .filter(|t| t.is_finite());
    let (x_min, x_max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));

    let y_range = match y_limits.lookup(&table.name) {
        Some(bounds) => bounds,
        None => {
            let ys = traces
                .iter()
                .flat_map(|t| t.points.iter().map(|&(_, y)| y))
                .chain((!marker_points.is_empty()).then_some(baseline));
            let (y_min, y_max) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
            padded_range(y_min, y_max)
        }
    };

    Panel {
        name: table.name.clone(),
        traces,
        markers: marker_points,
        x_range: padded_range(x_min, x_max),
        y_range,
    }
}

/// Text sizes of a panel
#[derive(Debug, Clone, Copy)]
struct TextSizes {
    title: u32,
    axis: u32,
    ticks: u32,
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    panel: &Panel,
    with_text: bool,
    show_x_label: bool,
    sizes: TextSizes,
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(15);
    if with_text {
        builder
            .caption(
                format!("Synchronization check for {}", panel.name),
                (FONT_FAMILY, sizes.title),
            )
            .x_label_area_size(45)
            .y_label_area_size(70);
    }

    let (x0, x1) = panel.x_range;
    let (y0, y1) = panel.y_range;
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    if with_text {
        let mut mesh = chart.configure_mesh();
        mesh.y_desc("Amplitude")
            .label_style((FONT_FAMILY, sizes.ticks))
            .axis_desc_style((FONT_FAMILY, sizes.axis));
        if show_x_label {
            mesh.x_desc("Time (s)");
        }
        mesh.draw()?;
    }

    for trace in &panel.traces {
        let colour = trace.colour;
        chart
            .draw_series(LineSeries::new(trace.points.iter().copied(), colour.stroke_width(1)))?
            .label(trace.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour.stroke_width(2)));
    }

    let marker_style = MARKER_RED.mix(0.7).filled();
    chart
        .draw_series(
            panel
                .markers
                .iter()
                .map(|&point| Circle::new(point, 4, marker_style)),
        )?
        .label("Markers")
        .legend(move |(x, y)| Circle::new((x + 10, y), 4, marker_style));

    if with_text {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT_FAMILY, sizes.ticks))
            .draw()?;
    }

    Ok(())
}

fn render_figure(path: &Path, size: FigureSize, panels: &[Panel], sizes: TextSizes) -> Result<()> {
    let with_text = fonts::text_available(None);
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((panels.len().max(1), 1));
    let last = panels.len().saturating_sub(1);
    for (i, (area, panel)) in areas.iter().zip(panels).enumerate() {
        draw_panel(area, panel, with_text, i == last, sizes)
            .with_context(|| format!("Failed to draw panel for {}", panel.name))?;
    }

    root.present()
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}

/// Draw all streams stacked into `combined_sync_check.png`.
///
/// Returns `None` without writing anything when there is no stream.
pub fn combined_plot(
    streams: &StreamTables,
    markers: &MarkerTable,
    output_dir: &Path,
    y_limits: &YLimits,
) -> Result<Option<PathBuf>> {
    if streams.is_empty() {
        tracing::warn!("No streams to plot; combined figure skipped");
        return Ok(None);
    }

    let panels: Vec<Panel> = streams
        .iter()
        .map(|table| {
            let aligned = align_to_markers(table, markers);
            build_panel(&aligned, markers, ChannelOrder::AllowList, y_limits)
        })
        .collect();

    let path = output_dir.join(COMBINED_FIGURE);
    let sizes = TextSizes {
        title: 20,
        axis: 16,
        ticks: 14,
    };
    render_figure(&path, style::combined_figure_size(panels.len()), &panels, sizes)?;
    tracing::info!("Combined plot saved to {}", path.display());
    Ok(Some(path))
}

/// Draw every stream into its own `<stream>_sync_check.png`.
///
/// Creates `output_dir` when it does not exist yet.
pub fn single_plot(
    streams: &StreamTables,
    markers: &MarkerTable,
    output_dir: &Path,
    y_limits: &YLimits,
) -> Result<Vec<PathBuf>> {
    if output_dir.is_dir() {
        tracing::info!("Directory already exists: {}", output_dir.display());
    } else {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        tracing::info!("Directory created: {}", output_dir.display());
    }

    let sizes = TextSizes {
        title: 18,
        axis: 14,
        ticks: 12,
    };

    let mut written = Vec::with_capacity(streams.len());
    for table in streams {
        let aligned = align_to_markers(table, markers);
        let panel = build_panel(&aligned, markers, ChannelOrder::Columns, y_limits);
        let path = single_figure_path(output_dir, &table.name);
        render_figure(&path, style::SINGLE_FIGURE_SIZE, std::slice::from_ref(&panel), sizes)?;
        tracing::info!("{} plot saved to {}", table.name, path.display());
        written.push(path);
    }
    Ok(written)
}
