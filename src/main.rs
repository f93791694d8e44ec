use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use tleprop::api::server::{self, AppState};
use tleprop::collectors::catalog::{self, RecordResult};
use tleprop::core::orbit::{BranchKind, PropagationSettings};
use tleprop::core::satellite::Satellite;
use tleprop::core::time::{Clock, SystemClock, Target};
use tleprop::predictors::batch;
use tleprop::utils::config::Config;
use tleprop::utils::logging;

#[derive(Debug, Parser)]
#[command(name = "tleprop", version, about = "Parse two-line element sets and propagate them with SGP4/SDP4")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Propagate every element set to one instant and print JSON outcomes
    Propagate {
        /// Target instant (RFC 3339); defaults to now
        #[arg(long, conflicts_with = "minutes")]
        at: Option<DateTime<Utc>>,

        /// Minutes since each element set's own epoch
        #[arg(long, allow_hyphen_values = true)]
        minutes: Option<f64>,

        #[arg(long)]
        pretty: bool,
    },
    /// Print parsed element summaries with re-encoded TLE lines
    Elements {
        #[arg(long)]
        pretty: bool,
    },
    /// Serve the loaded satellites over HTTP
    Serve {
        #[arg(long, env = "TLEPROP_BIND", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
}

#[derive(Debug, Serialize)]
struct ElementSummary {
    norad_id: u32,
    name: Option<String>,
    epoch: Option<DateTime<Utc>>,
    branch: BranchKind,
    period_minutes: f64,
    line1: Option<String>,
    line2: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.config.log_level);
    info!(gravity = %cli.config.gravity, opsmode = %cli.config.opsmode, "tleprop starting");

    let source = cli.config.source();
    let records = catalog::load_catalog(source.as_ref())
        .with_context(|| format!("failed to load catalog from {}", source.describe()))?;
    let settings = cli.config.settings();

    match cli.command {
        Command::Propagate { at, minutes, pretty } => {
            let target = match (at, minutes) {
                (Some(t), _) => Target::Utc(t),
                (None, Some(m)) => Target::Minutes(m),
                (None, None) => Target::Utc(SystemClock.now()),
            };
            let outcomes = batch::propagate_batch(&records, target, settings);
            print_json(&outcomes, pretty)?;
        }
        Command::Elements { pretty } => {
            let summaries: Vec<ElementSummary> = loaded_satellites(records, settings)
                .iter()
                .map(|sat| {
                    let elements = sat.elements();
                    let lines = elements.to_tle_lines();
                    if let Err(e) = &lines {
                        warn!(norad = sat.norad_id(), error = %e, "Element set cannot be re-encoded");
                    }
                    let (line1, line2) = lines.map(|(l1, l2)| (Some(l1), Some(l2))).unwrap_or((None, None));
                    ElementSummary {
                        norad_id: sat.norad_id(),
                        name: sat.name().map(str::to_string),
                        epoch: elements.epoch_utc(),
                        branch: sat.model().branch_kind(),
                        period_minutes: elements.period_minutes(),
                        line1,
                        line2,
                    }
                })
                .collect();
            print_json(&summaries, pretty)?;
        }
        Command::Serve { bind } => {
            let satellites = loaded_satellites(records, settings);
            let state = AppState::new(satellites, settings, Arc::new(SystemClock));
            server::run_server(state, bind).await.with_context(|| format!("API server on {bind} failed"))?;
        }
    }
    Ok(())
}

/// Initialises every successfully parsed record; parse failures were already logged.
fn loaded_satellites(records: Vec<RecordResult>, settings: PropagationSettings) -> Vec<Satellite> {
    let satellites: Vec<Satellite> = records
        .into_iter()
        .filter_map(Result::ok)
        .map(|elements| Satellite::new(elements, settings))
        .collect();
    info!(count = satellites.len(), "Initialised satellites");
    satellites
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{out}");
    Ok(())
}
