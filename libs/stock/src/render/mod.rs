mod echarts;

use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

pub use echarts::CharmingSurface;
use crate::{
    error::RenderError,
    outcome::{FetchOutcome, FetchSuccess},
};

/// Status text, the refresh control and blocking notices.
///
/// Only ever called from the interactive thread.
pub trait Shell {
    fn set_status(&mut self, text: &str);
    fn set_refresh_enabled(&mut self, enabled: bool);
    fn notify_error(&mut self, title: &str, message: &str);
}

/// Drawing backend with a price panel and a volume panel on one time axis.
///
/// `draw` returning [`RenderError::Preview`] means the chart was drawn and
/// only its file copy failed.
pub trait ChartSurface {
    fn clear(&mut self);
    fn draw(&mut self, frame: &ChartFrame) -> Result<(), RenderError>;
    fn export(&self, path: &Path, width: u32, height: u32) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub label: String,
    pub stroke: Stroke,
    /// `None` where there is nothing to plot
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Everything one redraw puts on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub title: String,
    pub time_labels: Vec<String>,
    pub price_axis: String,
    pub lines: Vec<LineSeries>,
    pub volume_axis: String,
    pub volume: Option<BarSeries>,
}

impl ChartFrame {
    pub fn from_success(success: &FetchSuccess) -> Self {
        let series = &success.series;
        let intraday = success.interval.is_intraday();

        let time_labels = series
            .timestamps
            .iter()
            .map(|ts| time_label(*ts, series.timezone, intraday))
            .collect();

        let mut lines = vec![LineSeries {
            label: series.column.label().to_string(),
            stroke: Stroke::Solid,
            values: series.prices.iter().copied().map(Some).collect(),
        }];
        lines.extend(series.overlays.iter().map(|o| LineSeries {
            label: o.ma.label().to_string(),
            stroke: Stroke::Dashed,
            values: o.values.clone(),
        }));

        Self {
            title: format!(
                "{} • {} • {} ({} → {})",
                success.symbol, series.column, success.interval, success.start, success.end
            ),
            time_labels,
            price_axis: "Price".to_string(),
            lines,
            volume_axis: "Volume".to_string(),
            volume: series.volume.as_ref().map(|v| BarSeries {
                label: "Volume".to_string(),
                values: v.clone(),
            }),
        }
    }
}

fn time_label(ts: DateTime<Utc>, tz: Option<Tz>, intraday: bool) -> String {
    let fmt = if intraday { "%Y-%m-%d %H:%M" } else { "%Y-%m-%d" };
    match tz {
        Some(tz) => ts.with_timezone(&tz).format(fmt).to_string(),
        None => ts.format(fmt).to_string(),
    }
}

/// How an outcome was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Drawn { rows: usize },
    Failed,
    Stale,
}

/// Applies finished fetch cycles to the chart surface and the shell.
pub struct RenderDispatcher<S> {
    surface: S,
    discard_stale: bool,
    newest: Option<u64>,
    export_size: (u32, u32),
}

impl<S: ChartSurface> RenderDispatcher<S> {
    pub fn new(surface: S, discard_stale: bool, export_size: (u32, u32)) -> Self {
        Self {
            surface,
            discard_stale,
            newest: None,
            export_size,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Apply one outcome. The refresh control is re-enabled whatever happens.
    pub fn apply(&mut self, outcome: FetchOutcome, shell: &mut impl Shell) -> Applied {
        let applied = self.apply_inner(outcome, shell);
        shell.set_refresh_enabled(true);
        applied
    }

    fn apply_inner(&mut self, outcome: FetchOutcome, shell: &mut impl Shell) -> Applied {
        let FetchOutcome { seq, result } = outcome;

        if self.discard_stale && self.newest.is_some_and(|newest| seq < newest) {
            debug!(seq, newest = ?self.newest, "discarding stale fetch outcome");
            return Applied::Stale;
        }
        self.newest = Some(self.newest.map_or(seq, |n| n.max(seq)));

        let success = match result {
            Ok(success) => success,
            Err(failure) => {
                error!(seq, symbol = %failure.symbol, error = %failure.error, "fetch failed");
                shell.set_status("Error");
                shell.notify_error("Download error", &failure.error.to_string());
                return Applied::Failed;
            }
        };

        let frame = ChartFrame::from_success(&success);
        self.surface.clear();
        match self.surface.draw(&frame) {
            Ok(()) => {}
            Err(e @ RenderError::Preview(_)) => {
                warn!(seq, error = %e, "chart drawn without preview");
                shell.notify_error("Save failed", &e.to_string());
            }
            Err(e) => {
                error!(seq, error = %e, "chart draw failed");
                shell.set_status("Error");
                shell.notify_error("Render error", &e.to_string());
                return Applied::Failed;
            }
        }

        for warning in &success.warnings {
            shell.notify_error("Volume error", &warning.to_string());
        }

        let rows = success.rows();
        info!(seq, symbol = %success.symbol, rows, "chart updated");
        shell.set_status(&format!("Loaded {}: {} rows", success.symbol, rows));
        Applied::Drawn { rows }
    }

    /// Write the current chart to `path` as PNG.
    pub fn export(&self, path: &Path, shell: &mut impl Shell) -> Result<(), RenderError> {
        let (width, height) = self.export_size;
        match self.surface.export(path, width, height) {
            Ok(()) => {
                info!(path = %path.display(), width, height, "chart exported");
                shell.set_status(&format!("Saved: {}", path.display()));
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "chart export failed");
                shell.notify_error("Save failed", &e.to_string());
                Err(e)
            }
        }
    }
}
