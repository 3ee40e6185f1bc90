use serde::Serialize;

use crate::domain::DisplayPoint;
use crate::series::round2;

/// Summary analytics for the displayed series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Metrics {
    pub latest: f64,
    pub change: f64,
    pub percent_change: f64,
}

/// Compute latest price and the window-relative change of `series`.
///
/// The baseline is the first point of the window, not the previous session's
/// close, so for a one-year series the percent change spans the whole year.
pub fn derive(series: &[DisplayPoint]) -> Metrics {
    match series {
        [] => Metrics::default(),
        [only] => Metrics {
            latest: only.price,
            ..Metrics::default()
        },
        [first, .., last] => {
            let baseline = first.price;
            let latest = last.price;
            let change = latest - baseline;
            let percent_change = if baseline == 0.0 {
                0.0
            } else {
                round2(change / baseline * 100.0)
            };

            Metrics {
                latest,
                change: round2(change),
                percent_change,
            }
        }
    }
}
