use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::provider::de;

/// Accent colour given to instruments synthesized from free text.
pub const DEFAULT_ACCENT_COLOR: &str = "#6366f1";

/// A tradable symbol plus its display metadata. Identity is the symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub display_name: String,
    pub accent_color: String,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        display_name: impl Into<String>,
        accent_color: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
            accent_color: accent_color.into(),
        }
    }

    /// Build an instrument from a raw symbol: display name is the symbol itself.
    pub fn synthesized(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            display_name: symbol.clone(),
            symbol,
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
        }
    }
}

impl PartialEq for Instrument {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Instrument {}

/// Popular instruments offered for one-click selection.
pub fn catalog() -> Vec<Instrument> {
    [
        ("AAPL", "Apple Inc.", "#3b82f6"),
        ("MSFT", "Microsoft", "#10b981"),
        ("GOOGL", "Alphabet", "#f59e0b"),
        ("AMZN", "Amazon", "#8b5cf6"),
        ("TSLA", "Tesla", "#ef4444"),
        ("NVDA", "NVIDIA", "#06b6d4"),
        ("META", "Meta", "#ec4899"),
        ("NFLX", "Netflix", "#f43f5e"),
    ]
    .into_iter()
    .map(|(symbol, name, color)| Instrument::new(symbol, name, color))
    .collect()
}

/// Normalize free text to an uppercase symbol. Blank input yields `None`.
pub fn normalize_symbol(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

/// Resolve free text against the catalog, synthesizing an instrument on a miss.
pub fn lookup_instrument(catalog: &[Instrument], text: &str) -> Option<Instrument> {
    let symbol = normalize_symbol(text)?;
    let found = catalog
        .iter()
        .find(|instrument| instrument.symbol == symbol)
        .cloned();
    Some(found.unwrap_or_else(|| Instrument::synthesized(symbol)))
}

/// Coarse chart window offered by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimeRange {
    pub const ALL: [Self; 4] = [Self::Week, Self::Month, Self::Quarter, Self::Year];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Week => "1W",
            Self::Month => "1M",
            Self::Quarter => "3M",
            Self::Year => "1Y",
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "1W" => Ok(Self::Week),
            "1M" => Ok(Self::Month),
            "3M" => Ok(Self::Quarter),
            "1Y" => Ok(Self::Year),
            other => Err(Error::Config(format!(
                "unknown time range '{other}' -- expected one of 1W, 1M, 3M, 1Y"
            ))),
        }
    }
}

impl TryFrom<String> for TimeRange {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeRange> for String {
    fn from(value: TimeRange) -> Self {
        value.label().to_string()
    }
}

/// A point-in-time record as received from the backend.
///
/// Every field is optional and leniently decoded; the normalizer decides
/// what a missing value means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default, deserialize_with = "de::lenient_i64")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub close: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub volume: Option<f64>,
}

impl RawPoint {
    pub fn new(timestamp: i64, close: f64, volume: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            close: Some(close),
            volume: Some(volume),
        }
    }
}

/// A chart-ready point. Order within a series is the backend's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub short_label: String,
    pub long_label: String,
    pub price: f64,
    pub volume: u64,
}

/// A reference index tracked by the overview panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub symbol: String,
    pub name: String,
}

impl IndexSpec {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// The four US benchmarks shown by default.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("^GSPC", "S&P 500"),
            Self::new("^DJI", "Dow Jones"),
            Self::new("^IXIC", "NASDAQ"),
            Self::new("^RUT", "Russell 2000"),
        ]
    }
}

/// Latest value and day-over-day delta of one reference index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub name: String,
    pub value: f64,
    pub absolute_change: f64,
    pub percent_change: f64,
}

/// Whether index snapshots came from the backend or from the static set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

/// Output of one index aggregation round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexBoard {
    pub snapshots: Vec<IndexSnapshot>,
    pub provenance: Provenance,
}

impl IndexBoard {
    pub fn is_stale(&self) -> bool {
        self.provenance == Provenance::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_parses_labels_case_insensitively() {
        assert_eq!("1w".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert_eq!(" 3M ".parse::<TimeRange>().unwrap(), TimeRange::Quarter);
        for range in TimeRange::ALL {
            assert_eq!(range.label().parse::<TimeRange>().unwrap(), range);
        }
    }

    #[test]
    fn time_range_rejects_unknown_label() {
        let err = "5Y".parse::<TimeRange>().unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("5Y")));
    }

    #[test]
    fn default_range_is_one_month() {
        assert_eq!(TimeRange::default(), TimeRange::Month);
    }

    #[test]
    fn lookup_prefers_catalog_entry() {
        let found = lookup_instrument(&catalog(), "  msft ").unwrap();
        assert_eq!(found.symbol, "MSFT");
        assert_eq!(found.display_name, "Microsoft");
        assert_eq!(found.accent_color, "#10b981");
    }

    #[test]
    fn lookup_synthesizes_unknown_symbol() {
        let found = lookup_instrument(&catalog(), "brk.b").unwrap();
        assert_eq!(found.symbol, "BRK.B");
        assert_eq!(found.display_name, "BRK.B");
        assert_eq!(found.accent_color, DEFAULT_ACCENT_COLOR);
    }

    #[test]
    fn lookup_ignores_blank_text() {
        assert!(lookup_instrument(&catalog(), "   ").is_none());
    }

    #[test]
    fn instrument_identity_is_symbol() {
        let a = Instrument::new("AAPL", "Apple Inc.", "#3b82f6");
        let b = Instrument::synthesized("AAPL");
        assert_eq!(a, b);
    }

    #[test]
    fn raw_point_tolerates_bad_fields() {
        let points: Vec<RawPoint> = serde_json::from_str(
            r#"[
                {"timestamp": 1700000000, "close": 189.456, "volume": 1200},
                {"timestamp": "1700086400", "close": "190.1", "volume": null},
                {"close": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(points[0], RawPoint::new(1_700_000_000, 189.456, 1200.0));
        assert_eq!(points[1].timestamp, Some(1_700_086_400));
        assert_eq!(points[1].close, Some(190.1));
        assert_eq!(points[1].volume, None);
        assert_eq!(points[2], RawPoint::default());
    }
}
