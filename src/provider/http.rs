use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::{MarketDataApi, NewsItem, RiskProfile};
use crate::domain::RawPoint;
use crate::error::{Error, Result};
use crate::range::SeriesQuery;

const USER_AGENT: &str = concat!("marketview/", env!("CARGO_PKG_VERSION"));

/// Market-data backend reached over HTTP+JSON.
pub struct HttpMarketData {
    client: Client,
    base_url: String,
}

impl HttpMarketData {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None)
    }

    /// Create a client that attaches the session token as an `authToken` cookie.
    pub fn with_auth_token(base_url: impl Into<String>, token: &str) -> Result<Self> {
        Self::build(base_url.into(), Some(token))
    }

    fn build(base_url: String, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            let cookie = HeaderValue::from_str(&format!("authToken={token}"))
                .map_err(|e| Error::Config(format!("invalid auth token: {e}")))?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|segment| urlencoding::encode(segment))
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T> {
        let endpoint = self.endpoint(segments);
        debug!(endpoint = %endpoint, query = ?query, "requesting {what}");

        let resp = self.client.get(&endpoint).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        debug!(status = %status, body_len = body.len(), "{what} response");
        trace!(body = %body, "{what} response body");

        if !status.is_success() {
            return Err(Error::Api {
                status,
                detail: extract_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Parse(format!("{what} JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct SeriesEnvelope {
    data: Option<Vec<RawPoint>>,
}

#[async_trait]
impl MarketDataApi for HttpMarketData {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_series(&self, symbol: &str, query: SeriesQuery) -> Result<Vec<RawPoint>> {
        let envelope: SeriesEnvelope = self
            .get_json(
                &["api", "stock", symbol],
                &[("period", query.period), ("interval", query.interval)],
                "series",
            )
            .await?;

        envelope
            .data
            .ok_or_else(|| Error::Parse(format!("series response for {symbol} has no 'data'")))
    }

    async fn fetch_risk(&self, symbol: &str) -> Result<RiskProfile> {
        self.get_json(&["api", "stock", "risk", symbol], &[], "risk")
            .await
    }

    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        self.get_json(&["api", "stock", "news", symbol], &[], "news")
            .await
    }
}

/// Best-effort extraction of a server-provided message from an error body.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .filter_map(|key| value.get(key)?.as_str())
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(ToOwned::to_owned)
}
