use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::{indicators::simple_moving_average, series::PriceSeries, state::MovingAverage};

/// Which price column the chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceColumn {
    AdjClose,
    Close,
}

impl PriceColumn {
    pub fn label(&self) -> &'static str {
        match self {
            PriceColumn::AdjClose => "Adj Close",
            PriceColumn::Close => "Close",
        }
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Non-fatal problems found while deriving a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformWarning {
    #[error("volume column unusable at row {row}: {reason}")]
    UnusableVolume { row: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub ma: MovingAverage,
    pub values: Vec<Option<f64>>,
}

/// Price series plus everything the renderer needs, aligned by index.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub timezone: Option<Tz>,
    pub column: PriceColumn,
    pub prices: Vec<f64>,
    pub overlays: Vec<Overlay>,
    pub volume: Option<Vec<f64>>,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

pub fn derive(
    series: &PriceSeries,
    overlays: &BTreeSet<MovingAverage>,
) -> (DerivedSeries, Vec<TransformWarning>) {
    let (column, prices) = match series.adj_close() {
        Some(adj) => (PriceColumn::AdjClose, adj.to_vec()),
        None => (PriceColumn::Close, series.close().to_vec()),
    };

    let overlays = overlays
        .iter()
        .map(|&ma| Overlay {
            ma,
            values: simple_moving_average(&prices, ma.window()),
        })
        .collect();

    let mut warnings = Vec::new();
    let volume = match series.volume().map(extract_volume) {
        Some(Ok(volume)) => Some(volume),
        Some(Err(warning)) => {
            warn!(%warning, "dropping volume panel");
            warnings.push(warning);
            None
        }
        None => None,
    };

    let derived = DerivedSeries {
        timestamps: series.timestamps().to_vec(),
        timezone: series.timezone(),
        column,
        prices,
        overlays,
        volume,
    };
    (derived, warnings)
}

/// Best-effort flattening of a loosely typed volume column.
///
/// Nulls count as zero volume and single-element arrays unwrap to their
/// element. Anything else makes the whole column unusable.
pub fn extract_volume(cells: &[Value]) -> Result<Vec<f64>, TransformWarning> {
    cells
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            volume_cell(cell).map_err(|reason| TransformWarning::UnusableVolume { row, reason })
        })
        .collect()
}

fn volume_cell(cell: &Value) -> Result<f64, String> {
    match cell {
        Value::Null => Ok(0.0),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(format!("invalid volume {n}")),
        },
        Value::Array(items) => match items.as_slice() {
            [inner] => volume_cell(inner),
            _ => Err(format!("expected one value, found {}", items.len())),
        },
        other => Err(format!("unexpected value {other}")),
    }
}
