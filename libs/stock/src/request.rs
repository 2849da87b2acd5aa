use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

use crate::{
    interval::Interval,
    state::{MovingAverage, default_start},
};

/// Earliest date the providers serve; "max" ranges start here.
pub fn provider_origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(1980, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Raw text held by the controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub symbol: String,
    pub start: String,
    pub end: String,
    pub interval: String,
}

/// Immutable snapshot of one fetch cycle's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Day after `end`; providers treat their end bound as exclusive
    pub end_exclusive: NaiveDate,
    pub interval: Interval,
    pub overlays: BTreeSet<MovingAverage>,
}

/// Parameters handed to a provider. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderQuery {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

impl FetchRequest {
    pub fn provider_query(&self) -> ProviderQuery {
        ProviderQuery {
            symbol: self.symbol.clone(),
            start: self.start,
            end: self.end_exclusive,
            interval: self.interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Symbol,
    Start,
    End,
    Interval,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Symbol => "symbol",
            Field::Start => "start",
            Field::End => "end",
            Field::Interval => "interval",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Ticker cannot be empty")]
    EmptySymbol,

    #[error("Invalid {field} date: '{text}'. Expected YYYY-MM-DD")]
    MalformedDate { field: Field, text: String },

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("End date {0} is out of range")]
    EndOutOfRange(NaiveDate),

    #[error("Unsupported interval '{0}'")]
    UnknownInterval(String),
}

impl ValidationError {
    /// The control the user needs to fix.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptySymbol => Field::Symbol,
            ValidationError::MalformedDate { field, .. } => *field,
            ValidationError::EndBeforeStart { .. } => Field::End,
            ValidationError::EndOutOfRange(_) => Field::End,
            ValidationError::UnknownInterval(_) => Field::Interval,
        }
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Strict `YYYY-MM-DD` with a four digit year. Blank input yields `fallback`.
pub fn parse_date(
    field: Field,
    text: &str,
    fallback: NaiveDate,
) -> Result<NaiveDate, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(fallback);
    }

    let malformed = || ValidationError::MalformedDate {
        field,
        text: trimmed.to_string(),
    };

    let parts: Vec<&str> = trimmed.split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        return Err(malformed());
    };
    let widths_ok = y.len() == 4 && m.len() == 2 && d.len() == 2;
    if !widths_ok
        || [y, m, d]
            .iter()
            .any(|p| !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(malformed());
    }

    let year: i32 = y.parse().map_err(|_| malformed())?;
    let month: u32 = m.parse().map_err(|_| malformed())?;
    let day: u32 = d.parse().map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}

/// Turn the controls' text into a fetch request.
pub fn validate(
    form: &FormInput,
    overlays: &BTreeSet<MovingAverage>,
    today: NaiveDate,
    seq: u64,
) -> Result<FetchRequest, ValidationError> {
    let symbol = normalize_symbol(&form.symbol);
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }

    let start = parse_date(Field::Start, &form.start, default_start(today))?;
    let end = parse_date(Field::End, &form.end, today)?;
    if end < start {
        return Err(ValidationError::EndBeforeStart { start, end });
    }
    let end_exclusive = end
        .checked_add_signed(Duration::days(1))
        .ok_or(ValidationError::EndOutOfRange(end))?;

    let interval = if form.interval.trim().is_empty() {
        Interval::default()
    } else {
        form.interval
            .parse::<Interval>()
            .map_err(|e| ValidationError::UnknownInterval(e.0))?
    };

    Ok(FetchRequest {
        seq,
        symbol,
        start,
        end,
        end_exclusive,
        interval,
        overlays: overlays.clone(),
    })
}

/// Named shortcuts relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRange {
    OneMonth,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    FiveYears,
    Max,
}

impl QuickRange {
    pub const ALL: [QuickRange; 7] = [
        QuickRange::OneMonth,
        QuickRange::ThreeMonths,
        QuickRange::SixMonths,
        QuickRange::YearToDate,
        QuickRange::OneYear,
        QuickRange::FiveYears,
        QuickRange::Max,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuickRange::OneMonth => "1M",
            QuickRange::ThreeMonths => "3M",
            QuickRange::SixMonths => "6M",
            QuickRange::YearToDate => "YTD",
            QuickRange::OneYear => "1Y",
            QuickRange::FiveYears => "5Y",
            QuickRange::Max => "Max",
        }
    }

    fn long_name(&self) -> &'static str {
        match self {
            QuickRange::OneMonth => "1 month",
            QuickRange::ThreeMonths => "3 months",
            QuickRange::SixMonths => "6 months",
            QuickRange::YearToDate => "year-to-date",
            QuickRange::OneYear => "1 year",
            QuickRange::FiveYears => "5 years",
            QuickRange::Max => "max",
        }
    }

    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let back = |days: i64| today - Duration::days(days);
        let start = match self {
            QuickRange::OneMonth => back(30),
            QuickRange::ThreeMonths => back(90),
            QuickRange::SixMonths => back(182),
            QuickRange::YearToDate => today.with_ordinal(1).unwrap_or(today),
            QuickRange::OneYear => back(365),
            QuickRange::FiveYears => back(365 * 5),
            QuickRange::Max => provider_origin(),
        };
        (start, today)
    }
}

impl fmt::Display for QuickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown quick range '{0}'. Expected one of 1M, 3M, 6M, YTD, 1Y, 5Y, Max")]
pub struct UnknownQuickRange(pub String);

impl FromStr for QuickRange {
    type Err = UnknownQuickRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        QuickRange::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s) || r.long_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownQuickRange(s.to_string()))
    }
}
