//! deepcal - demo runner for the decision core
//!
//! Usage:
//!   deepcal rank [--request <path>]
//!   deepcal outcome --forwarder <id> --shipment <id> --predicted <days> <cost> --actual <days> <cost>
//!   deepcal sync
//!
//! `rank` without a request file ranks a built-in forwarder set against the
//! current weight snapshot. Request files are YAML or JSON in the camelCase
//! wire format. Results are printed as JSON.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use deepcal_core::adapters::{
    DriftSyncConfig, DriftSyncWorker, FileDriftQueue, InMemoryDriftRecordStore,
    RestDriftRecordStore, RestDriftStoreConfig,
};
use deepcal_core::application::{
    RankAlternativesCommand, RankAlternativesHandler, RankWithCurrentWeightsCommand,
    RecordOutcomeCommand, RecordOutcomeHandler,
};
use deepcal_core::config::AppConfig;
use deepcal_core::domain::drift::{DriftTracker, OutcomeMetrics, WeightStore};
use deepcal_core::domain::foundation::{AlternativeId, ObservationId};
use deepcal_core::domain::mcda::{Criterion, DecisionMatrix};
use deepcal_core::ports::{DriftQueue, DriftRecordStore};

#[derive(Debug)]
enum Command {
    Rank { request: Option<PathBuf> },
    Outcome(RecordOutcomeCommand),
    Sync,
    Help,
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let command = match parse_args(&args) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run_command(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "version" | "--version" | "-V" => Ok(Command::Version),
        "sync" => Ok(Command::Sync),
        "rank" => {
            let request = flag_value(&args[2..], "--request")?.map(PathBuf::from);
            Ok(Command::Rank { request })
        }
        "outcome" => parse_outcome(&args[2..]).map(Command::Outcome),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>, String> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| format!("{} requires a value", flag)),
    }
}

fn metrics_after(args: &[String], flag: &str) -> Result<OutcomeMetrics, String> {
    let i = args
        .iter()
        .position(|a| a == flag)
        .ok_or_else(|| format!("{} is required", flag))?;
    let number = |offset: usize| -> Result<f64, String> {
        args.get(i + offset)
            .ok_or_else(|| format!("{} requires <days> <cost>", flag))?
            .parse::<f64>()
            .map_err(|e| format!("{}: {}", flag, e))
    };
    OutcomeMetrics::new(number(1)?, number(2)?).map_err(|e| e.to_string())
}

fn parse_outcome(args: &[String]) -> Result<RecordOutcomeCommand, String> {
    let forwarder = flag_value(args, "--forwarder")?.ok_or("--forwarder is required")?;
    let shipment = flag_value(args, "--shipment")?.ok_or("--shipment is required")?;

    Ok(RecordOutcomeCommand {
        alternative_id: AlternativeId::new(forwarder).map_err(|e| e.to_string())?,
        observation_id: ObservationId::new(shipment).map_err(|e| e.to_string())?,
        predicted_metrics: metrics_after(args, "--predicted")?,
        actual_metrics: metrics_after(args, "--actual")?,
    })
}

fn init_tracing(config: &AppConfig) {
    let filter = config.telemetry.env_filter();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.telemetry.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("deepcal {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let weights = Arc::new(WeightStore::new(config.drift.initial_weights()?));

    match command {
        Command::Rank { request } => {
            let handler =
                RankAlternativesHandler::new(Arc::new(config.engine.orchestrator()?), weights);
            let response = match request {
                Some(path) => handler.handle(read_request(&path).await?)?,
                None => handler.handle_with_current_weights(builtin_forwarders()?)?,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Outcome(cmd) => {
            let (store, queue) = persistence(&config)?;
            let worker = DriftSyncWorker::with_config(store, queue, sync_config(&config));
            let (handle, receiver) = worker.channel();
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let worker_task = tokio::spawn(async move { worker.run(receiver, shutdown_rx).await });

            let tracker = Arc::new(DriftTracker::new(config.drift.policy(), weights)?);
            let handler = RecordOutcomeHandler::new(tracker, Arc::new(handle));
            let result = handler.handle(cmd).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);

            shutdown_tx.send(true)?;
            worker_task.await??;
        }
        Command::Sync => {
            let (store, queue) = persistence(&config)?;
            let worker = DriftSyncWorker::with_config(store, queue, sync_config(&config));
            let mut total = 0;
            loop {
                let report = worker.drain_once().await?;
                total += report.delivered;
                if report.delivered == 0 || report.remaining == 0 {
                    info!(delivered = total, remaining = report.remaining, "Drift queue sync finished");
                    println!("delivered {}, remaining {}", total, report.remaining);
                    break;
                }
            }
        }
        Command::Help | Command::Version => {}
    }

    Ok(())
}

type Persistence = (Arc<dyn DriftRecordStore>, Arc<dyn DriftQueue>);

/// Without a configured store the records stay in the local queue.
fn persistence(config: &AppConfig) -> Result<Persistence, Box<dyn std::error::Error>> {
    let queue: Arc<dyn DriftQueue> = Arc::new(FileDriftQueue::new(&config.persistence.queue_dir));

    let store: Arc<dyn DriftRecordStore> = match (
        config.persistence.store_url.as_deref().filter(|u| !u.is_empty()),
        config.persistence.store_api_key.clone(),
    ) {
        (Some(url), Some(key)) => {
            let store_config = RestDriftStoreConfig::new(url, key)
                .with_timeout(config.persistence.request_timeout());
            Arc::new(RestDriftRecordStore::new(store_config)?)
        }
        _ => {
            info!(queue_dir = %config.persistence.queue_dir.display(), "No drift store configured, keeping records local");
            Arc::new(InMemoryDriftRecordStore::unavailable())
        }
    };

    Ok((store, queue))
}

fn sync_config(config: &AppConfig) -> DriftSyncConfig {
    DriftSyncConfig::default()
        .with_poll_interval(config.persistence.poll_interval())
        .with_batch_size(config.persistence.batch_size)
}

async fn read_request(path: &Path) -> Result<RankAlternativesCommand, Box<dyn std::error::Error>> {
    let text = tokio::fs::read_to_string(path).await?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// Cost (USD), transit time (days) and on-time reliability per forwarder.
fn builtin_forwarders() -> Result<RankWithCurrentWeightsCommand, Box<dyn std::error::Error>> {
    let forwarders = [
        ("DHL", 2400.0, 5.0, 0.92),
        ("Kuehne+Nagel", 2100.0, 7.0, 0.88),
        ("DB Schenker", 1950.0, 8.0, 0.85),
        ("Maersk", 1800.0, 12.0, 0.90),
        ("DSV", 2250.0, 6.0, 0.87),
    ];

    Ok(RankWithCurrentWeightsCommand {
        decision_matrix: DecisionMatrix::new(
            forwarders
                .iter()
                .map(|(_, cost, time, reliability)| vec![*cost, *time, *reliability])
                .collect(),
        )?,
        criteria: vec![
            Criterion::cost("cost"),
            Criterion::cost("time"),
            Criterion::benefit("reliability"),
        ],
        alternative_names: Some(forwarders.iter().map(|f| f.0.to_string()).collect()),
    })
}

fn print_help() {
    println!(
        r#"deepcal - neutrosophic AHP / grey TOPSIS decision core

USAGE:
    deepcal <COMMAND>

COMMANDS:
    rank [--request <path>]     Rank a YAML/JSON request, or the built-in forwarder set
    outcome                     Record an observed shipment outcome
        --forwarder <id>
        --shipment <id>
        --predicted <days> <cost>
        --actual <days> <cost>
    sync                        Deliver queued drift records to the store
    help                        Show this message
    version                     Show version

Configuration is read from DEEPCAL__* environment variables (and .env)."#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_rank_with_request() {
        let cmd = parse_args(&args(&["deepcal", "rank", "--request", "req.yaml"])).unwrap();
        assert!(matches!(cmd, Command::Rank { request: Some(p) } if p == PathBuf::from("req.yaml")));
    }

    #[test]
    fn parses_outcome() {
        let cmd = parse_args(&args(&[
            "deepcal", "outcome", "--forwarder", "dhl", "--shipment", "SHP-1",
            "--predicted", "5", "1000", "--actual", "8", "1400",
        ]))
        .unwrap();
        match cmd {
            Command::Outcome(c) => {
                assert_eq!(c.alternative_id.as_str(), "dhl");
                assert_eq!(c.actual_metrics.cost, 1400.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn outcome_requires_metrics() {
        let err = parse_args(&args(&["deepcal", "outcome", "--forwarder", "dhl", "--shipment", "S"]))
            .unwrap_err();
        assert!(err.contains("--predicted"));
    }

    #[test]
    fn builtin_set_has_five_forwarders() {
        let cmd = builtin_forwarders().unwrap();
        assert_eq!(cmd.decision_matrix.alternative_count(), 5);
        assert_eq!(cmd.criteria.len(), 3);
    }
}
