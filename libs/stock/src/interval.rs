use std::{fmt, str::FromStr};

/// Sampling granularity of a price series.
///
/// The wire strings follow Yahoo's chart API; the Alpaca adapter maps them
/// onto its own timeframe names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    #[default]
    Day1,
    Week1,
    Month1,
    Hour1,
    Minute30,
    Minute15,
    Minute5,
    Minute1,
}

impl Interval {
    pub const ALL: [Interval; 8] = [
        Interval::Day1,
        Interval::Week1,
        Interval::Month1,
        Interval::Hour1,
        Interval::Minute30,
        Interval::Minute15,
        Interval::Minute5,
        Interval::Minute1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Day1 => "1d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
            Interval::Hour1 => "1h",
            Interval::Minute30 => "30m",
            Interval::Minute15 => "15m",
            Interval::Minute5 => "5m",
            Interval::Minute1 => "1m",
        }
    }

    /// Alpaca bars timeframe
    pub fn alpaca_timeframe(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1Min",
            Interval::Minute5 => "5Min",
            Interval::Minute15 => "15Min",
            Interval::Minute30 => "30Min",
            Interval::Hour1 => "1Hour",
            Interval::Day1 => "1Day",
            Interval::Week1 => "1Week",
            Interval::Month1 => "1Month",
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Interval::Day1 | Interval::Week1 | Interval::Month1)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInterval(pub String);

impl FromStr for Interval {
    type Err = UnknownInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownInterval(s.to_string()))
    }
}
