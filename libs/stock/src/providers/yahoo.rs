use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{DataProvider, endpoint};
use crate::{error::ProviderError, request::ProviderQuery, series::PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance v8 chart endpoint.
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<PriceSeries, ProviderError> {
        let url = endpoint(&self.base_url, &["v8", "finance", "chart", query.symbol.as_str()])?;
        let period1 = midnight_utc(query.start).to_string();
        let period2 = midnight_utc(query.end).to_string();

        let res = self
            .client
            .get(url.clone())
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", query.interval.as_str()),
                ("includePrePost", "false"),
                ("events", "div|split"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            // Unknown symbols come back as 404 with a chart.error payload
            if let Ok(ChartEnvelope {
                chart: Some(ChartNode {
                    error: Some(err), ..
                }),
            }) = serde_json::from_str::<ChartEnvelope>(&body)
            {
                return Err(ProviderError::Upstream(format!(
                    "{}: {}",
                    err.code, err.description
                )));
            }
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        decode_chart(&query.symbol, &body)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn decode_chart(symbol: &str, body: &str) -> Result<PriceSeries, ProviderError> {
    let parsed: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let chart = parsed
        .chart
        .ok_or_else(|| ProviderError::Decode("missing chart".into()))?;

    if let Some(err) = chart.error {
        return Err(ProviderError::Upstream(format!(
            "{}: {}",
            err.code, err.description
        )));
    }

    let Some(result) = chart.result.and_then(|mut r| r.pop()) else {
        return Err(ProviderError::no_data(symbol));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose);

    let timezone = result.meta.and_then(|m| {
        [m.exchange_timezone_name, m.timezone]
            .into_iter()
            .flatten()
            .find_map(|name| {
                name.parse::<Tz>()
                    .inspect_err(|_| debug!(timezone = %name, "unrecognized exchange timezone"))
                    .ok()
            })
    });

    let mut rows: Vec<Row> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        // Holidays and halted sessions show up as null closes
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let timestamp = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| ProviderError::Malformed(format!("timestamp out of range: {ts}")))?;
        rows.push(Row {
            timestamp,
            close,
            adj_close: adjclose.as_ref().and_then(|a| a.get(i).copied().flatten()),
            volume: quote.volume.get(i).cloned().unwrap_or(Value::Null),
        });
    }

    // Intraday responses may repeat the live bar; keep the latest copy
    rows.sort_by_key(|r| r.timestamp);
    let mut deduped: Vec<Row> = Vec::with_capacity(rows.len());
    for row in rows {
        match deduped.last_mut() {
            Some(last) if last.timestamp == row.timestamp => *last = row,
            _ => deduped.push(row),
        }
    }

    if deduped.is_empty() {
        return Err(ProviderError::no_data(symbol));
    }

    let adj_close: Option<Vec<f64>> = if adjclose.is_some() {
        let column: Option<Vec<f64>> = deduped.iter().map(|r| r.adj_close).collect();
        if column.is_none() {
            warn!(%symbol, "adjusted close has gaps; falling back to close");
        }
        column
    } else {
        None
    };

    let volume = if quote.volume.is_empty() {
        None
    } else {
        Some(deduped.iter().map(|r| r.volume.clone()).collect())
    };

    let series = PriceSeries::new(
        symbol,
        deduped.iter().map(|r| r.timestamp).collect(),
        deduped.iter().map(|r| r.close).collect(),
        adj_close,
        volume,
    )?;

    Ok(series.with_timezone(timezone))
}

struct Row {
    timestamp: DateTime<Utc>,
    close: f64,
    adj_close: Option<f64>,
    volume: Value,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Option<ChartNode>,
}

#[derive(Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<MetaNode>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct MetaNode {
    #[serde(default, rename = "exchangeTimezoneName")]
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Deserialize, Default)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
    // Left loosely typed; the transformer decides what is usable
    #[serde(default)]
    volume: Vec<Value>,
}

#[derive(Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
