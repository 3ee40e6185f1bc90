use marketview::domain::TimeRange;
use marketview::metrics;
use marketview::provider::MarketDataApi;
use marketview::provider::http::HttpMarketData;
use marketview::range::{self, INDEX_QUERY};
use marketview::series;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("fixture must be valid JSON")
}

#[tokio::test]
async fn stock_fixture_normalizes_like_real_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stock/AAPL"))
        .and(query_param("period", "1mo"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture(include_str!(
            "fixtures/stock/aapl_1mo_1d.json"
        ))))
        .mount(&server)
        .await;

    let api = HttpMarketData::new(server.uri()).unwrap();
    let raw = api
        .fetch_series("AAPL", range::resolve(TimeRange::Month))
        .await
        .expect("fixture payload should parse");
    let points = series::normalize(&raw);

    assert_eq!(points.len(), 4);
    assert_eq!(points[0].short_label, "Jan 2");
    assert_eq!(points[3].long_label, "January 5, 2024");
    assert_eq!(points[2].price, 181.91);
    assert_eq!(points[2].volume, 0);
    assert_eq!(points[3].volume, 62_303_300);

    let derived = metrics::derive(&points);
    assert_eq!(derived.latest, 181.18);
    assert!((derived.change - -4.46).abs() < 1e-9);
    assert!((derived.percent_change - -2.4).abs() < 1e-9);
}

#[tokio::test]
async fn index_fixture_parses_like_real_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/stock/(%5E|\^)GSPC$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture(include_str!(
            "fixtures/stock/gspc_5d_1d.json"
        ))))
        .mount(&server)
        .await;

    let api = HttpMarketData::new(server.uri()).unwrap();
    let raw = api.fetch_series("^GSPC", INDEX_QUERY).await.unwrap();
    let snapshot = marketview::indices::snapshot_from_points("S&P 500", &raw)
        .expect("five closes give a daily delta");

    assert_eq!(snapshot.value, 6051.25);
    assert!((snapshot.absolute_change - -32.94).abs() < 1e-6);
    assert!((snapshot.percent_change - -0.5414).abs() < 1e-3);
}

#[tokio::test]
async fn risk_fixture_parses_like_real_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stock/risk/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture(include_str!(
            "fixtures/stock/risk_aapl.json"
        ))))
        .mount(&server)
        .await;

    let api = HttpMarketData::new(server.uri()).unwrap();
    let profile = api.fetch_risk("AAPL").await.unwrap();

    assert_eq!(profile.ticker, "AAPL");
    assert_eq!(profile.risk_level, "Moderate");
    assert_eq!(profile.user_salary, 85000.0);
    assert_eq!(profile.suggested_stocks.len(), 2);
    assert_eq!(profile.suggested_stocks[1].beta, None);
}

#[tokio::test]
async fn news_fixture_parses_like_real_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/stock/news/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixture(include_str!(
            "fixtures/stock/news_aapl.json"
        ))))
        .mount(&server)
        .await;

    let api = HttpMarketData::new(server.uri()).unwrap();
    let news = api.fetch_news("AAPL").await.unwrap();

    assert_eq!(news.len(), 2);
    assert_eq!(news[0].source.as_deref(), Some("Reuters"));
    assert_eq!(news[0].sentiment, "Negative");
    assert!(news[1].summary.is_none());
    assert!(news[1].link.is_none());
}
