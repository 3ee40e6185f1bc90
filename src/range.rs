use serde::Serialize;

use crate::domain::TimeRange;

/// Backend query parameters for one series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SeriesQuery {
    pub period: &'static str,
    pub interval: &'static str,
}

/// Fixed short window used for reference indices: enough for one day-over-day delta.
pub const INDEX_QUERY: SeriesQuery = SeriesQuery {
    period: "5d",
    interval: "1d",
};

/// Map a UI range to its lookback window and sampling granularity.
pub const fn resolve(range: TimeRange) -> SeriesQuery {
    match range {
        TimeRange::Week => SeriesQuery {
            period: "5d",
            interval: "1h",
        },
        TimeRange::Month => SeriesQuery {
            period: "1mo",
            interval: "1d",
        },
        TimeRange::Quarter => SeriesQuery {
            period: "3mo",
            interval: "1d",
        },
        TimeRange::Year => SeriesQuery {
            period: "1y",
            interval: "1wk",
        },
    }
}
