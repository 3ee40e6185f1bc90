use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_INDEX_TIMEOUT_SECS, DEFAULT_SERIES_TIMEOUT_SECS};
use crate::domain::{
    self, DisplayPoint, IndexBoard, IndexSnapshot, IndexSpec, Instrument, Provenance, RawPoint,
    TimeRange,
};
use crate::error::{Error, Result};
use crate::indices::IndexAggregator;
use crate::metrics;
use crate::provider::{MarketDataApi, with_timeout};
use crate::range;
use crate::series;

/// Lifecycle of the primary series pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesPhase {
    Idle,
    Loading,
    Ready,
}

/// Lifecycle of the index panel. Never returns to `Loading` once `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicesPhase {
    Idle,
    Loading,
    Ready,
}

/// Everything the rendering layer needs, recomputed on every state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub selected_instrument: Instrument,
    pub selected_range: TimeRange,
    pub series: Vec<DisplayPoint>,
    pub latest_price: f64,
    pub price_change: f64,
    pub percent_change: f64,
    pub indices: Vec<IndexSnapshot>,
    pub indices_provenance: Option<Provenance>,
    pub series_phase: SeriesPhase,
    pub indices_phase: IndicesPhase,
    pub is_loading_series: bool,
    pub is_loading_indices: bool,
    pub series_error: Option<String>,
}

/// Construction parameters for [`SelectionController`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub catalog: Vec<Instrument>,
    pub index_specs: Vec<IndexSpec>,
    pub initial_instrument: Option<Instrument>,
    pub initial_range: TimeRange,
    pub series_timeout: Duration,
    pub index_timeout: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            catalog: domain::catalog(),
            index_specs: IndexSpec::defaults(),
            initial_instrument: None,
            initial_range: TimeRange::default(),
            series_timeout: Duration::from_secs(DEFAULT_SERIES_TIMEOUT_SECS),
            index_timeout: Duration::from_secs(DEFAULT_INDEX_TIMEOUT_SECS),
        }
    }
}

/// Handles of the two fetches launched by [`SelectionController::start`].
pub struct Startup {
    /// `None` when the current selection was already fetched before `start`.
    pub series: Option<JoinHandle<()>>,
    pub indices: JoinHandle<()>,
}

#[derive(Debug)]
struct SelectionState {
    instrument: Instrument,
    range: TimeRange,
    generation: u64,
    series_phase: SeriesPhase,
    series: Vec<DisplayPoint>,
    series_error: Option<String>,
    indices_phase: IndicesPhase,
    indices: Option<IndexBoard>,
}

impl SelectionState {
    fn view_model(&self) -> ViewModel {
        let metrics = metrics::derive(&self.series);
        let (indices, indices_provenance) = match &self.indices {
            Some(board) => (board.snapshots.clone(), Some(board.provenance)),
            None => (Vec::new(), None),
        };

        ViewModel {
            selected_instrument: self.instrument.clone(),
            selected_range: self.range,
            series: self.series.clone(),
            latest_price: metrics.latest,
            price_change: metrics.change,
            percent_change: metrics.percent_change,
            indices,
            indices_provenance,
            series_phase: self.series_phase,
            indices_phase: self.indices_phase,
            is_loading_series: self.series_phase == SeriesPhase::Loading,
            is_loading_indices: self.indices_phase == IndicesPhase::Loading,
            series_error: self.series_error.clone(),
        }
    }

    fn selection_key(&self) -> (String, TimeRange) {
        (self.instrument.symbol.clone(), self.range)
    }

    /// Enter `Loading` for the current selection and hand out its ticket.
    fn begin_series_fetch(&mut self) -> SeriesTicket {
        self.generation += 1;
        self.series_phase = SeriesPhase::Loading;
        self.series.clear();
        self.series_error = None;

        SeriesTicket {
            generation: self.generation,
            symbol: self.instrument.symbol.clone(),
            range: self.range,
        }
    }
}

/// Identifies the selection a series fetch was issued for.
#[derive(Debug, Clone)]
struct SeriesTicket {
    generation: u64,
    symbol: String,
    range: TimeRange,
}

struct Inner {
    api: Arc<dyn MarketDataApi>,
    catalog: Vec<Instrument>,
    index_specs: Vec<IndexSpec>,
    series_timeout: Duration,
    index_timeout: Duration,
    started: Mutex<bool>,
    state: Mutex<SelectionState>,
    updates: watch::Sender<ViewModel>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SelectionState) {
        self.updates.send_replace(state.view_model());
    }

    fn apply_series(&self, ticket: &SeriesTicket, result: Result<Vec<RawPoint>>) {
        let mut state = self.lock();
        if state.generation != ticket.generation {
            debug!(
                symbol = %ticket.symbol,
                range = %ticket.range,
                generation = ticket.generation,
                current = state.generation,
                "discarding stale series result"
            );
            return;
        }

        match result {
            Ok(raw) => {
                let normalized = series::normalize(&raw);
                info!(
                    symbol = %ticket.symbol,
                    range = %ticket.range,
                    points = normalized.len(),
                    "series loaded"
                );
                state.series = normalized;
                state.series_error = None;
            }
            Err(err) => {
                warn!(symbol = %ticket.symbol, range = %ticket.range, error = %err, "series fetch failed");
                state.series.clear();
                state.series_error = Some(series_error_message(
                    &ticket.symbol,
                    self.api.base_url(),
                    &err,
                ));
            }
        }

        state.series_phase = SeriesPhase::Ready;
        self.publish(&state);
    }

    fn apply_indices(&self, board: IndexBoard) {
        let mut state = self.lock();
        state.indices = Some(board);
        state.indices_phase = IndicesPhase::Ready;
        self.publish(&state);
    }
}

/// Owns the selected instrument and range and drives every fetch.
///
/// Selection changes supersede any in-flight series fetch: each fetch carries
/// the generation it was issued for, and its result is dropped unless that
/// generation is still current when it completes. Superseded requests are not
/// aborted.
#[derive(Clone)]
pub struct SelectionController {
    inner: Arc<Inner>,
}

impl SelectionController {
    pub fn new(api: Arc<dyn MarketDataApi>, options: ControllerOptions) -> Self {
        let instrument = options
            .initial_instrument
            .or_else(|| options.catalog.first().cloned())
            .unwrap_or_else(|| Instrument::synthesized("AAPL"));

        let state = SelectionState {
            instrument,
            range: options.initial_range,
            generation: 0,
            series_phase: SeriesPhase::Idle,
            series: Vec::new(),
            series_error: None,
            indices_phase: IndicesPhase::Idle,
            indices: None,
        };
        let (updates, _) = watch::channel(state.view_model());

        Self {
            inner: Arc::new(Inner {
                api,
                catalog: options.catalog,
                index_specs: options.index_specs,
                series_timeout: options.series_timeout,
                index_timeout: options.index_timeout,
                started: Mutex::new(false),
                state: Mutex::new(state),
                updates,
            }),
        }
    }

    /// Launch the index aggregation and the first series fetch.
    ///
    /// Only the first call does anything; the index panel is never refreshed.
    pub fn start(&self) -> Option<Startup> {
        {
            let mut started = self
                .inner
                .started
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *started {
                debug!("controller already started");
                return None;
            }
            *started = true;
        }

        {
            let mut state = self.inner.lock();
            state.indices_phase = IndicesPhase::Loading;
            self.inner.publish(&state);
        }

        let inner = Arc::clone(&self.inner);
        let indices = tokio::spawn(async move {
            let aggregator = IndexAggregator::new(Arc::clone(&inner.api), inner.index_timeout);
            let board = aggregator.aggregate(&inner.index_specs).await;
            inner.apply_indices(board);
        });

        let series = self.refetch(|_| {});
        Some(Startup { series, indices })
    }

    /// Select an instrument and fetch its series for the current range.
    ///
    /// Returns `None` when the pair is unchanged and already loading or loaded.
    pub fn select_instrument(&self, instrument: Instrument) -> Option<JoinHandle<()>> {
        self.refetch(move |state| state.instrument = instrument)
    }

    /// Select a range and fetch the current instrument's series for it.
    pub fn select_range(&self, range: TimeRange) -> Option<JoinHandle<()>> {
        self.refetch(move |state| state.range = range)
    }

    /// Select from free text: a catalog hit keeps its metadata, otherwise an
    /// instrument is synthesized. Blank text and the current symbol are ignored.
    pub fn search_symbol(&self, text: &str) -> Option<JoinHandle<()>> {
        let instrument = domain::lookup_instrument(&self.inner.catalog, text)?;
        self.select_instrument(instrument)
    }

    /// Current view-model snapshot.
    pub fn view_model(&self) -> ViewModel {
        self.inner.updates.borrow().clone()
    }

    /// Receive every recomputed view-model.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.inner.updates.subscribe()
    }

    pub fn catalog(&self) -> &[Instrument] {
        &self.inner.catalog
    }

    fn refetch(&self, update: impl FnOnce(&mut SelectionState)) -> Option<JoinHandle<()>> {
        let ticket = {
            let mut state = self.inner.lock();
            let previous = state.selection_key();
            update(&mut state);
            if state.series_phase != SeriesPhase::Idle && state.selection_key() == previous {
                debug!(
                    symbol = %previous.0,
                    range = %previous.1,
                    phase = ?state.series_phase,
                    "selection unchanged, keeping current series"
                );
                return None;
            }
            let ticket = state.begin_series_fetch();
            self.inner.publish(&state);
            ticket
        };

        let query = range::resolve(ticket.range);
        info!(
            symbol = %ticket.symbol,
            range = %ticket.range,
            period = query.period,
            interval = query.interval,
            generation = ticket.generation,
            "fetching series"
        );

        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            let result = with_timeout(
                inner.series_timeout,
                inner.api.fetch_series(&ticket.symbol, query),
            )
            .await;
            inner.apply_series(&ticket, result);
        }))
    }
}

/// User-facing description of a failed series fetch.
pub fn series_error_message(symbol: &str, base_url: &str, err: &Error) -> String {
    let reason = match err {
        Error::Timeout(_) => "Request timed out. Please try again.".to_string(),
        Error::Http(e) if e.is_timeout() => "Request timed out. Please try again.".to_string(),
        Error::Http(e) if e.is_connect() => {
            format!("Cannot connect to server at {base_url}.")
        }
        Error::Api { detail, .. } => detail.clone().unwrap_or_else(|| "Server error.".to_string()),
        _ => "Please try again.".to_string(),
    };
    format!("Failed to load data for {symbol}. {reason}")
}
