use chrono::NaiveDate;

use crate::{
    error::ProviderError,
    interval::Interval,
    transform::{DerivedSeries, TransformWarning},
};

/// A finished fetch, ready to draw.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub symbol: String,
    pub interval: Interval,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub series: DerivedSeries,
    pub warnings: Vec<TransformWarning>,
}

impl FetchSuccess {
    pub fn rows(&self) -> usize {
        self.series.len()
    }
}

#[derive(Debug)]
pub struct FetchFailure {
    pub symbol: String,
    pub error: ProviderError,
}

pub type FetchResult = Result<FetchSuccess, FetchFailure>;

/// What a background cycle hands back to the interactive thread.
#[derive(Debug)]
pub struct FetchOutcome {
    pub seq: u64,
    pub result: FetchResult,
}
