use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::error::ProviderError;

/// Time-indexed price table as a provider returns it.
///
/// Columns are stored side by side and always have the same length.
/// Volume is kept as loosely typed cells; the transformer decides whether it
/// is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    timestamps: Vec<DateTime<Utc>>,
    close: Vec<f64>,
    adj_close: Option<Vec<f64>>,
    volume: Option<Vec<Value>>,
    timezone: Option<Tz>,
}

impl PriceSeries {
    pub fn new(
        symbol: &str,
        timestamps: Vec<DateTime<Utc>>,
        close: Vec<f64>,
        adj_close: Option<Vec<f64>>,
        volume: Option<Vec<Value>>,
    ) -> Result<Self, ProviderError> {
        if timestamps.is_empty() {
            return Err(ProviderError::no_data(symbol));
        }

        let n = timestamps.len();
        let ragged = close.len() != n
            || adj_close.as_ref().is_some_and(|c| c.len() != n)
            || volume.as_ref().is_some_and(|c| c.len() != n);
        if ragged {
            return Err(ProviderError::Malformed(format!(
                "column length mismatch: timestamps={}, close={}, adj_close={:?}, volume={:?}",
                n,
                close.len(),
                adj_close.as_ref().map(Vec::len),
                volume.as_ref().map(Vec::len),
            )));
        }

        if let Some(pos) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ProviderError::Malformed(format!(
                "timestamps not strictly increasing at row {}: {} then {}",
                pos + 1,
                timestamps[pos],
                timestamps[pos + 1]
            )));
        }

        Ok(Self {
            timestamps,
            close,
            adj_close,
            volume,
            timezone: None,
        })
    }

    /// Exchange timezone used for axis labels.
    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn adj_close(&self) -> Option<&[f64]> {
        self.adj_close.as_deref()
    }

    pub fn volume(&self) -> Option<&[Value]> {
        self.volume.as_deref()
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }
}
