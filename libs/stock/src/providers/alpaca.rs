use chrono::{DateTime, Utc};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{DataProvider, endpoint};
use crate::{error::ProviderError, request::ProviderQuery, series::PriceSeries};

const PAGE_LIMIT: usize = 10_000;

#[derive(Clone)]
pub struct AlpacaProvider {
    client: Client,
    base_api: String,
}

impl AlpacaProvider {
    pub fn new(base_api: String, key_id: &str, secret: &str) -> Result<Self, ProviderError> {
        let header = |v: &str| {
            HeaderValue::from_str(v).map_err(|e| ProviderError::Config(e.to_string()))
        };

        let mut headers = HeaderMap::new();
        headers.insert("APCA-API-KEY-ID", header(key_id)?);
        headers.insert("APCA-API-SECRET-KEY", header(secret)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_api })
    }

    async fn fetch_page(
        &self,
        query: &ProviderQuery,
        page_token: Option<&str>,
    ) -> Result<BarsResponse, ProviderError> {
        let url = endpoint(&self.base_api, &["v2", "stocks", query.symbol.as_str(), "bars"])?;

        let start = query.start.to_string();
        let end = query.end.to_string();
        let limit = PAGE_LIMIT.to_string();
        let mut params = vec![
            ("feed", "iex"),
            ("adjustment", "all"),
            ("timeframe", query.interval.alpaca_timeframe()),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("page_token", token));
        }

        let res = self.client.get(url.clone()).query(&params).send().await?;
        if !res.status().is_success() {
            return Err(ProviderError::Status {
                status: res.status().as_u16(),
                url: url.to_string(),
            });
        }

        res.json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

impl DataProvider for AlpacaProvider {
    fn name(&self) -> &'static str {
        "alpaca"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<PriceSeries, ProviderError> {
        let mut bars: Vec<Bar> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(query, page_token.as_deref()).await?;
            debug!(
                symbol = %query.symbol,
                bars = page.bars.as_ref().map_or(0, Vec::len),
                "fetched alpaca page"
            );
            bars.extend(page.bars.unwrap_or_default());

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        if bars.is_empty() {
            return Err(ProviderError::no_data(&query.symbol));
        }

        // adjustment=all already folds splits and dividends into every price
        let timestamps = bars.iter().map(|b| b.timestamp).collect();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volume = bars.iter().map(|b| Value::from(b.volume)).collect();

        PriceSeries::new(&query.symbol, timestamps, closes.clone(), Some(closes), Some(volume))
    }
}

//
// Match Alpaca API JSON
// https://docs.alpaca.markets/reference/stockbars
//
#[derive(Debug, Deserialize, Clone)]
struct BarsResponse {
    #[serde(default)]
    bars: Option<Vec<Bar>>,

    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct Bar {
    #[serde(rename = "t")]
    timestamp: DateTime<Utc>,

    #[serde(rename = "c")]
    close: f64,

    #[serde(rename = "v")]
    volume: i64,
}
