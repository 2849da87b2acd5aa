use std::{
    fs,
    path::{Path, PathBuf},
};

use charming::{
    Chart, ImageFormat, ImageRenderer,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisType, ItemStyle, LineStyle, LineStyleType, SplitLine, Symbol, TextStyle,
    },
    series::{Bar, Line},
};
use tracing::debug;

use super::{ChartFrame, ChartSurface, Stroke};
use crate::error::RenderError;

const BACKGROUND: &str = "#0b0c17";
const LABEL: &str = "#a0a0a0";
const GRID_LINE: &str = "#2d2f45";
const PRICE: &str = "#00d084";
const VOLUME: &str = "#3d5a80";
const OVERLAYS: [&str; 4] = ["#0064FF", "#FF6400", "#c77dff", "#ffd166"];

/// ECharts-backed surface rendered server side by `charming`.
///
/// With a preview path every redraw is also written out as PNG so an image
/// viewer watching the file follows along.
pub struct CharmingSurface {
    chart: Option<Chart>,
    preview: Option<(PathBuf, u32, u32)>,
}

impl CharmingSurface {
    pub fn new() -> Self {
        Self {
            chart: None,
            preview: None,
        }
    }

    pub fn with_preview(mut self, path: PathBuf, width: u32, height: u32) -> Self {
        self.preview = Some((path, width, height));
        self
    }

    pub fn has_chart(&self) -> bool {
        self.chart.is_some()
    }
}

impl Default for CharmingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartSurface for CharmingSurface {
    fn clear(&mut self) {
        self.chart = None;
    }

    fn draw(&mut self, frame: &ChartFrame) -> Result<(), RenderError> {
        let chart = self.chart.insert(build_chart(frame));
        if let Some((path, width, height)) = &self.preview {
            write_png(chart, path, *width, *height)
                .map_err(|e| RenderError::Preview(Box::new(e)))?;
            debug!(path = %path.display(), "preview updated");
        }
        Ok(())
    }

    fn export(&self, path: &Path, width: u32, height: u32) -> Result<(), RenderError> {
        let chart = self.chart.as_ref().ok_or(RenderError::NothingDrawn)?;
        write_png(chart, path, width, height)
    }
}

fn write_png(chart: &Chart, path: &Path, width: u32, height: u32) -> Result<(), RenderError> {
    let mut renderer = ImageRenderer::new(width, height);
    let png_bytes = renderer
        .render_format(ImageFormat::Png, chart)
        .map_err(|e| RenderError::Backend(e.to_string()))?;
    fs::write(path, png_bytes).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn axis_label() -> AxisLabel {
    AxisLabel::new().color(LABEL)
}

fn split_line() -> SplitLine {
    SplitLine::new().line_style(LineStyle::new().color(GRID_LINE))
}

pub(super) fn build_chart(frame: &ChartFrame) -> Chart {
    let has_volume = frame.volume.is_some();
    let price_height = if has_volume { "56%" } else { "76%" };

    let mut chart = Chart::new()
        .background_color(BACKGROUND)
        .title(
            Title::new()
                .text(frame.title.clone())
                .left("center")
                .top("2%")
                .text_style(TextStyle::new().color("#ffffff").font_size(14)),
        )
        .legend(
            Legend::new()
                .top("7%")
                .left("8%")
                .text_style(TextStyle::new().color(LABEL)),
        )
        .grid(
            Grid::new()
                .left("8%")
                .right("4%")
                .top("14%")
                .height(price_height),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .grid_index(0)
                .data(frame.time_labels.clone())
                .axis_label(axis_label().show(!has_volume))
                .split_line(split_line()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .grid_index(0)
                .name(frame.price_axis.clone())
                .scale(true)
                .axis_label(axis_label())
                .split_line(split_line()),
        );

    let mut overlay_colors = OVERLAYS.iter().cycle();
    for line in &frame.lines {
        // Gaps serialize as null, which ECharts leaves unplotted
        let data: Vec<f64> = line.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let style = match line.stroke {
            Stroke::Solid => LineStyle::new().width(2).color(PRICE),
            Stroke::Dashed => LineStyle::new()
                .width(1)
                .type_(LineStyleType::Dashed)
                .color(*overlay_colors.next().unwrap_or(&OVERLAYS[0])),
        };
        chart = chart.series(
            Line::new()
                .name(line.label.clone())
                .data(data)
                .symbol(Symbol::None)
                .x_axis_index(0)
                .y_axis_index(0)
                .line_style(style),
        );
    }

    let Some(volume) = &frame.volume else {
        return chart;
    };

    chart
        .grid(
            Grid::new()
                .left("8%")
                .right("4%")
                .top("76%")
                .height("16%"),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .grid_index(1)
                .data(frame.time_labels.clone())
                .axis_label(axis_label()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .grid_index(1)
                .name(frame.volume_axis.clone())
                .axis_label(axis_label())
                .split_line(split_line()),
        )
        .series(
            Bar::new()
                .name(volume.label.clone())
                .data(volume.values.clone())
                .x_axis_index(1)
                .y_axis_index(1)
                .item_style(ItemStyle::new().color(VOLUME)),
        )
}
