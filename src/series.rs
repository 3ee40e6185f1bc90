use chrono::{DateTime, Utc};

use crate::domain::{DisplayPoint, RawPoint};

const SHORT_LABEL_FORMAT: &str = "%b %-d";
const LONG_LABEL_FORMAT: &str = "%B %-d, %Y";

/// Turn backend records into chart-ready points.
///
/// Length and order are preserved exactly: no filtering, sorting or
/// resampling happens here. An empty input yields an empty series.
pub fn normalize(raw: &[RawPoint]) -> Vec<DisplayPoint> {
    raw.iter().map(normalize_point).collect()
}

fn normalize_point(point: &RawPoint) -> DisplayPoint {
    let timestamp = point
        .timestamp
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    let (short_label, long_label) = match timestamp {
        Some(ts) => (
            ts.format(SHORT_LABEL_FORMAT).to_string(),
            ts.format(LONG_LABEL_FORMAT).to_string(),
        ),
        None => (String::new(), String::new()),
    };

    DisplayPoint {
        timestamp,
        short_label,
        long_label,
        price: round2(point.close.unwrap_or(0.0)),
        volume: point
            .volume
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v.trunc() as u64)
            .unwrap_or(0),
    }
}

/// Round to cents; non-finite input collapses to zero.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-05T14:30:00Z
    const JAN_5_2024: i64 = 1_704_465_000;

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn formats_labels_in_fixed_locale() {
        let series = normalize(&[RawPoint::new(JAN_5_2024, 185.857, 42_000_000.0)]);
        assert_eq!(series[0].short_label, "Jan 5");
        assert_eq!(series[0].long_label, "January 5, 2024");
        assert_eq!(series[0].price, 185.86);
        assert_eq!(series[0].volume, 42_000_000);
    }

    #[test]
    fn preserves_length_and_order_without_sorting() {
        let raw = vec![
            RawPoint::new(JAN_5_2024, 3.0, 1.0),
            RawPoint::new(JAN_5_2024 - 86_400, 1.0, 1.0),
            RawPoint::new(JAN_5_2024 + 86_400, 2.0, 1.0),
        ];
        let series = normalize(&raw);
        assert_eq!(series.len(), 3);
        let prices: Vec<f64> = series.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn defaults_missing_fields_to_zero() {
        let raw = vec![RawPoint {
            timestamp: Some(JAN_5_2024),
            close: None,
            volume: None,
        }];
        let series = normalize(&raw);
        assert_eq!(series[0].price, 0.0);
        assert_eq!(series[0].volume, 0);
    }

    #[test]
    fn keeps_points_with_unusable_timestamps() {
        let raw = vec![
            RawPoint {
                timestamp: None,
                close: Some(10.0),
                volume: Some(5.0),
            },
            RawPoint {
                timestamp: Some(i64::MAX),
                close: Some(11.0),
                volume: Some(-3.0),
            },
        ];
        let series = normalize(&raw);
        assert_eq!(series.len(), 2);
        assert!(series[0].timestamp.is_none());
        assert_eq!(series[0].short_label, "");
        assert_eq!(series[1].long_label, "");
        assert_eq!(series[1].price, 11.0);
        assert_eq!(series[1].volume, 0);
    }

    #[test]
    fn round2_handles_non_finite() {
        assert_eq!(round2(f64::NAN), 0.0);
        assert_eq!(round2(f64::INFINITY), 0.0);
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-2.344), -2.34);
    }
}
