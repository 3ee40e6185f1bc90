use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{IndexBoard, IndexSnapshot, IndexSpec, Provenance, RawPoint};
use crate::error::{Error, Result};
use crate::provider::{MarketDataApi, with_timeout};
use crate::range::INDEX_QUERY;

/// Fetches the reference-index panel, absorbing every per-index failure.
pub struct IndexAggregator {
    api: Arc<dyn MarketDataApi>,
    timeout: Duration,
}

impl IndexAggregator {
    pub fn new(api: Arc<dyn MarketDataApi>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// Query every index concurrently and join the results.
    ///
    /// Never fails: indices that error, time out or return fewer than two
    /// points are dropped, and only when none survive is the static
    /// fallback set returned.
    pub async fn aggregate(&self, specs: &[IndexSpec]) -> IndexBoard {
        let fetches = specs.iter().map(|spec| self.fetch_snapshot(spec));
        let snapshots: Vec<IndexSnapshot> = join_all(fetches).await.into_iter().flatten().collect();

        if snapshots.is_empty() {
            warn!(requested = specs.len(), "no live index data, using fallback snapshots");
            return fallback_board();
        }

        info!(
            live = snapshots.len(),
            requested = specs.len(),
            "index snapshots resolved"
        );
        IndexBoard {
            snapshots,
            provenance: Provenance::Live,
        }
    }

    async fn fetch_snapshot(&self, spec: &IndexSpec) -> Option<IndexSnapshot> {
        let result: Result<Vec<RawPoint>> = with_timeout(
            self.timeout,
            self.api.fetch_series(&spec.symbol, INDEX_QUERY),
        )
        .await;

        match result {
            Ok(points) => {
                let snapshot = snapshot_from_points(&spec.name, &points);
                if snapshot.is_none() {
                    debug!(
                        symbol = %spec.symbol,
                        points = points.len(),
                        "insufficient index data for a daily delta"
                    );
                }
                snapshot
            }
            Err(Error::Timeout(limit)) => {
                warn!(symbol = %spec.symbol, timeout_secs = limit.as_secs(), "index fetch timed out");
                None
            }
            Err(err) => {
                warn!(symbol = %spec.symbol, error = %err, "index fetch failed");
                None
            }
        }
    }
}

/// Day-over-day snapshot from the last two closes, if they are usable.
pub fn snapshot_from_points(name: &str, points: &[RawPoint]) -> Option<IndexSnapshot> {
    let [.., previous, last] = points else {
        return None;
    };

    let previous = previous.close.filter(|v| v.is_finite() && *v != 0.0)?;
    let value = last.close.filter(|v| v.is_finite())?;
    let absolute_change = value - previous;

    Some(IndexSnapshot {
        name: name.to_string(),
        value,
        absolute_change,
        percent_change: absolute_change / previous * 100.0,
    })
}

/// Static values shown when every live index fetch failed.
pub fn fallback_board() -> IndexBoard {
    let snapshots = [
        ("S&P 500", 6052.85, 23.45, 0.389),
        ("Dow Jones", 43870.35, -55.39, -0.126),
        ("NASDAQ", 19268.89, 111.69, 0.583),
        ("Russell 2000", 2304.22, 18.76, 0.820),
    ]
    .into_iter()
    .map(|(name, value, absolute_change, percent_change)| IndexSnapshot {
        name: name.to_string(),
        value,
        absolute_change,
        percent_change,
    })
    .collect();

    IndexBoard {
        snapshots,
        provenance: Provenance::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_last_two_closes() {
        let points = vec![
            RawPoint::new(1, 90.0, 0.0),
            RawPoint::new(2, 100.0, 0.0),
            RawPoint::new(3, 102.0, 0.0),
        ];
        let snap = snapshot_from_points("Test", &points).unwrap();
        assert_eq!(snap.name, "Test");
        assert_eq!(snap.value, 102.0);
        assert!((snap.absolute_change - 2.0).abs() < 1e-9);
        assert!((snap.percent_change - 2.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_requires_two_points() {
        assert!(snapshot_from_points("Test", &[]).is_none());
        assert!(snapshot_from_points("Test", &[RawPoint::new(1, 10.0, 0.0)]).is_none());
    }

    #[test]
    fn snapshot_rejects_unusable_previous_close() {
        let zero = vec![RawPoint::new(1, 0.0, 0.0), RawPoint::new(2, 5.0, 0.0)];
        assert!(snapshot_from_points("Test", &zero).is_none());

        let missing = vec![RawPoint::default(), RawPoint::new(2, 5.0, 0.0)];
        assert!(snapshot_from_points("Test", &missing).is_none());
    }

    #[test]
    fn fallback_board_has_four_stale_snapshots() {
        let board = fallback_board();
        assert_eq!(board.snapshots.len(), 4);
        assert!(board.is_stale());
        let names: Vec<&str> = board.snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["S&P 500", "Dow Jones", "NASDAQ", "Russell 2000"]);
        assert_eq!(board.snapshots[1].absolute_change, -55.39);
    }
}
