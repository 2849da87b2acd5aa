use std::{collections::BTreeSet, fmt};

use chrono::{Duration, NaiveDate};

use crate::{
    interval::Interval,
    request::{FetchRequest, FormInput},
};

pub const DEFAULT_SYMBOL: &str = "AAPL";

/// Moving-average overlays the viewer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MovingAverage {
    Ma5,
    Ma20,
    Ma50,
    Ma200,
}

impl MovingAverage {
    pub const ALL: [MovingAverage; 4] = [
        MovingAverage::Ma5,
        MovingAverage::Ma20,
        MovingAverage::Ma50,
        MovingAverage::Ma200,
    ];

    pub fn window(&self) -> usize {
        match self {
            MovingAverage::Ma5 => 5,
            MovingAverage::Ma20 => 20,
            MovingAverage::Ma50 => 50,
            MovingAverage::Ma200 => 200,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MovingAverage::Ma5 => "MA5",
            MovingAverage::Ma20 => "MA20",
            MovingAverage::Ma50 => "MA50",
            MovingAverage::Ma200 => "MA200",
        }
    }

    pub fn from_window(window: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|ma| ma.window() == window)
    }
}

impl fmt::Display for MovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the viewer is currently showing.
///
/// Owned by the interactive thread. Fetch cycles never borrow it; they take
/// a [`FetchRequest`] snapshot instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
    pub overlays: BTreeSet<MovingAverage>,
}

impl ViewState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start: default_start(today),
            end: today,
            interval: Interval::default(),
            overlays: [MovingAverage::Ma5, MovingAverage::Ma20, MovingAverage::Ma50]
                .into_iter()
                .collect(),
        }
    }

    /// Text the controls show for this state.
    pub fn form(&self) -> FormInput {
        FormInput {
            symbol: self.symbol.clone(),
            start: self.start.to_string(),
            end: self.end.to_string(),
            interval: self.interval.to_string(),
        }
    }

    /// Record a validated request as the current view.
    pub fn commit(&mut self, request: &FetchRequest) {
        self.symbol = request.symbol.clone();
        self.start = request.start;
        self.end = request.end;
        self.interval = request.interval;
    }

    /// Flip an overlay. Returns true if it is now enabled.
    pub fn toggle(&mut self, ma: MovingAverage) -> bool {
        if self.overlays.remove(&ma) {
            false
        } else {
            self.overlays.insert(ma);
            true
        }
    }
}

pub fn default_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(365)
}
