use std::path::PathBuf;

use thiserror::Error;

/// Failures at the data provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("provider error: {0}")]
    Upstream(String),

    #[error("No data returned for {symbol}. Try a different symbol, date range, or interval.")]
    NoData { symbol: String },

    #[error("malformed price table: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn no_data(symbol: impl Into<String>) -> Self {
        ProviderError::NoData {
            symbol: symbol.into(),
        }
    }
}

/// Failures drawing or exporting a chart.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing has been drawn yet")]
    NothingDrawn,

    #[error("chart rendering failed: {0}")]
    Backend(String),

    /// The chart is on the surface but its preview file was not written.
    #[error("preview not updated: {0}")]
    Preview(#[source] Box<RenderError>),

    #[error("could not write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
