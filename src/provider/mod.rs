pub mod de;
pub mod http;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::RawPoint;
use crate::error::{Error, Result};
use crate::range::SeriesQuery;

/// Risk profile served to the risk-analyser view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub ticker: String,
    pub risk_level: String,
    pub risk_score: f64,
    pub price: Option<f64>,
    pub volatility: f64,
    pub beta: Option<f64>,
    pub user_salary: f64,
    pub suggestion_message: String,
    #[serde(default)]
    pub suggested_stocks: Vec<SuggestedStock>,
}

/// Lower-risk alternative attached to a [`RiskProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedStock {
    pub ticker: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub beta: Option<f64>,
}

/// One sentiment-annotated headline for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub timestamp: String,
    pub sentiment: String,
    pub link: Option<String>,
}

/// Seam to the market-data backend.
///
/// Implementations do not enforce time limits; callers wrap each call with
/// [`with_timeout`] using their own bound.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Base URL requests are issued against, used in user-facing messages.
    fn base_url(&self) -> &str;

    /// Fetch the raw point series for `symbol` over the given window.
    async fn fetch_series(&self, symbol: &str, query: SeriesQuery) -> Result<Vec<RawPoint>>;

    /// Fetch the risk profile of `symbol` for the authenticated user.
    async fn fetch_risk(&self, symbol: &str) -> Result<RiskProfile>;

    /// Fetch recent headlines for `symbol`.
    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>>;
}

/// Run `fut` with an upper bound; expiry maps to [`Error::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(limit)),
    }
}
