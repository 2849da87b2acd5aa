mod alpaca;
mod yahoo;

use std::future::Future;

use reqwest::Url;

pub use alpaca::AlpacaProvider;
pub use yahoo::{DEFAULT_BASE_URL as YAHOO_BASE_URL, YahooProvider};

use crate::{error::ProviderError, request::ProviderQuery, series::PriceSeries};

/// Remote source of historical prices.
///
/// `query.end` is exclusive. An empty result must be reported as
/// [`ProviderError::NoData`], never as an empty series.
pub trait DataProvider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn fetch(
        &self,
        query: &ProviderQuery,
    ) -> impl Future<Output = Result<PriceSeries, ProviderError>> + Send;
}

/// `base` with each of `segments` appended as one percent-encoded path segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base)
        .map_err(|e| ProviderError::Config(format!("invalid base url '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ProviderError::Config(format!("base url '{base}' cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Either of the bundled providers, chosen at startup.
#[derive(Clone)]
pub enum AnyProvider {
    Yahoo(YahooProvider),
    Alpaca(AlpacaProvider),
}

impl DataProvider for AnyProvider {
    fn name(&self) -> &'static str {
        match self {
            AnyProvider::Yahoo(p) => p.name(),
            AnyProvider::Alpaca(p) => p.name(),
        }
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<PriceSeries, ProviderError> {
        match self {
            AnyProvider::Yahoo(p) => p.fetch(query).await,
            AnyProvider::Alpaca(p) => p.fetch(query).await,
        }
    }
}
