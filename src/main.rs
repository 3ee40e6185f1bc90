use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use marketview::controller::{ControllerOptions, IndicesPhase, SelectionController, SeriesPhase};
use marketview::domain::{self, TimeRange};
use marketview::provider::http::HttpMarketData;
use marketview::provider::{MarketDataApi, with_timeout};
use marketview::{config, error, output};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::Result;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum RangeArg {
    #[value(name = "1W")]
    Week,
    #[value(name = "1M")]
    Month,
    #[value(name = "3M")]
    Quarter,
    #[value(name = "1Y")]
    Year,
}

impl From<RangeArg> for TimeRange {
    fn from(value: RangeArg) -> Self {
        match value {
            RangeArg::Week => Self::Week,
            RangeArg::Month => Self::Month,
            RangeArg::Quarter => Self::Quarter,
            RangeArg::Year => Self::Year,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "marketview",
    version,
    about = "Market overview and instrument charts from your terminal"
)]
struct Cli {
    /// Instrument to chart: a catalog symbol (aapl, msft, ...) or any ticker
    symbol: Option<String>,

    /// Chart window (1W, 1M, 3M, 1Y)
    #[arg(long, short, value_enum, ignore_case = true)]
    range: Option<RangeArg>,

    /// Output the view-model as JSON
    #[arg(long)]
    json: bool,

    /// Also show the risk profile of the instrument
    #[arg(long)]
    risk: bool,

    /// Also show recent news for the instrument
    #[arg(long)]
    news: bool,

    /// Backend base URL
    #[arg(long, env = "MARKETVIEW_BASE_URL")]
    base_url: Option<String>,

    /// Session token forwarded as the authToken cookie
    #[arg(long, env = "MARKETVIEW_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Explicit config file path (overrides XDG lookup)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the instrument catalog
    #[arg(long)]
    list_instruments: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env before CLI parsing so env-backed args pick it up.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!(error = %e, "fatal error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = match cli.config.as_deref() {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    let catalog = domain::catalog();
    if cli.list_instruments {
        println!("Instruments:");
        for instrument in &catalog {
            println!(
                "  {:8} {:14} {}",
                instrument.symbol, instrument.display_name, instrument.accent_color
            );
        }
        return Ok(());
    }

    let base_url = cli
        .base_url
        .clone()
        .unwrap_or_else(|| app_config.base_url().to_string());
    let auth_token = cli.auth_token.or_else(|| app_config.api.auth_token.clone());
    let api: Arc<dyn MarketDataApi> = match auth_token.as_deref() {
        Some(token) => Arc::new(HttpMarketData::with_auth_token(&base_url, token)?),
        None => Arc::new(HttpMarketData::new(&base_url)?),
    };

    let requested = cli.symbol.as_deref().or(app_config.defaults.symbol.as_deref());
    let initial_instrument = match requested {
        Some(text) => Some(domain::lookup_instrument(&catalog, text).ok_or_else(|| {
            error::Error::Config("symbol cannot be empty -- usage: marketview aapl".into())
        })?),
        None => None,
    };
    let initial_range = cli
        .range
        .map(TimeRange::from)
        .or(app_config.defaults.range)
        .unwrap_or_default();

    let options = ControllerOptions {
        catalog,
        index_specs: app_config.index_specs(),
        initial_instrument,
        initial_range,
        series_timeout: app_config.series_timeout(),
        index_timeout: app_config.index_timeout(),
    };

    info!(base_url = %base_url, range = %initial_range, "starting market overview");
    let controller = SelectionController::new(Arc::clone(&api), options);
    let mut updates = controller.subscribe();
    controller.start();

    let view = updates
        .wait_for(|vm| {
            vm.series_phase == SeriesPhase::Ready && vm.indices_phase == IndicesPhase::Ready
        })
        .await
        .map_err(|_| error::Error::Config("view-model updates closed unexpectedly".into()))?
        .clone();

    let (want_risk, want_news, json) = (cli.risk, cli.news, cli.json);
    let symbol = view.selected_instrument.symbol.clone();
    let timeout = app_config.series_timeout();
    let (risk, news) = tokio::join!(
        async {
            if want_risk {
                Some(with_timeout(timeout, api.fetch_risk(&symbol)).await)
            } else {
                None
            }
        },
        async {
            if want_news {
                Some(with_timeout(timeout, api.fetch_news(&symbol)).await)
            } else {
                None
            }
        },
    );

    if json {
        output::json::print_view_model_json(&view)?;
    } else {
        output::table::print_index_table(&view);
        println!();
        output::table::print_series_view(&view);
    }

    match risk {
        Some(Ok(profile)) if json => output::json::print_risk_json(&profile)?,
        Some(Ok(profile)) => {
            println!();
            output::table::print_risk(&profile);
        }
        Some(Err(err)) => {
            warn!(symbol = %symbol, error = %err, "risk analysis unavailable");
            eprintln!("Risk analysis unavailable for {}: {}", symbol, err);
        }
        None => {}
    }

    match news {
        Some(Ok(items)) if json => output::json::print_news_json(&items)?,
        Some(Ok(items)) => {
            println!();
            output::table::print_news_table(&items);
        }
        Some(Err(err)) => {
            warn!(symbol = %symbol, error = %err, "news unavailable");
            eprintln!("News unavailable for {}: {}", symbol, err);
        }
        None => {}
    }

    Ok(())
}
