//! Shock Runner - headless case runner
//!
//! Plays a shock case for a fixed number of simulated minutes with a
//! scripted list of orders and prints the outcome as JSON.
//!
//! Usage:
//!   cargo run --bin shock_runner -- --shock septic --minutes 120 \
//!       --intervene crystalloid:1000 --intervene norepinephrine:0.2@15
//!
//! Orders are `agent[:amount][@minute]`. For fluids the amount is the
//! volume in mL, for everything else it is the dose.

use std::path::PathBuf;

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use shock_sim::core::config::SimulationConfig;
use shock_sim::core::error::{Result, SimError};
use shock_sim::core::types::Minutes;
use shock_sim::outcome::{OutcomeResult, SessionMetrics};
use shock_sim::patient::{Patient, PatientData};
use shock_sim::physiology::{LabValues, VitalSigns};
use shock_sim::shock::ShockType;
use shock_sim::simulation::{run_for, SimulationEvent, SimulationState};
use shock_sim::treatment::{InterventionKind, InterventionRequest};

#[derive(Parser, Debug)]
#[command(name = "shock_runner")]
#[command(about = "Run a circulatory shock case headless and report the outcome")]
struct Args {
    /// Patient case file (JSON). Takes precedence over --shock
    #[arg(long)]
    patient: Option<PathBuf>,

    /// Shock archetype when no case file is given (septic, cardiogenic, hypovolemic, tamponade, ...)
    #[arg(long, default_value = "septic")]
    shock: String,

    /// Simulated minutes to run
    #[arg(long, default_value_t = 120.0)]
    minutes: f64,

    /// Tick length in simulated minutes (overrides the config)
    #[arg(long)]
    dt: Option<f64>,

    /// Time compression (overrides the config)
    #[arg(long)]
    speed: Option<f64>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scripted order: agent[:amount][@minute], repeatable
    #[arg(long = "intervene")]
    interventions: Vec<String>,

    /// Number of replicates, each with seed + i
    #[arg(long, default_value_t = 1)]
    replicates: u32,

    /// Include every simulation event in the output
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    seed: u64,
    shock: String,
    minutes: Minutes,
    outcome: OutcomeResult,
    vitals: VitalSigns,
    labs: LabValues,
    metrics: SessionMetrics,
    alerts: Vec<String>,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<SimulationEvent>,
}

/// Parse `agent[:amount][@minute]`
fn parse_order(order: &str) -> Result<InterventionRequest> {
    let (body, delay) = match order.split_once('@') {
        Some((body, at)) => (body, parse_number(at)?),
        None => (order, 0.0),
    };
    let (agent, amount) = match body.split_once(':') {
        Some((agent, amount)) => (agent, Some(parse_number(amount)?)),
        None => (body, None),
    };

    let kind: InterventionKind = agent.parse()?;
    let mut request = InterventionRequest::new(kind).delayed(delay);
    if let Some(amount) = amount {
        request = match kind {
            InterventionKind::Fluid(_) => request.with_volume(amount),
            _ => request.with_dose(amount),
        };
    }
    Ok(request)
}

fn parse_number(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| SimError::InvalidConfig(format!("número inválido: {}", s)))
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(dt) = args.dt {
        config.tick_minutes = dt;
    }
    if let Some(speed) = args.speed {
        config.speed_multiplier = speed;
    }
    config.validate().map_err(SimError::InvalidConfig)?;
    Ok(config)
}

fn load_patient_data(args: &Args) -> Result<PatientData> {
    match &args.patient {
        Some(path) => PatientData::load(path),
        None => {
            let shock: ShockType = args.shock.parse()?;
            Ok(PatientData::new(shock))
        }
    }
}

fn run_case(
    data: &PatientData,
    config: &SimulationConfig,
    orders: &[InterventionRequest],
    seed: u64,
    args: &Args,
) -> Result<RunSummary> {
    let patient = Patient::new(data.clone().with_seed(seed), config)?;
    let mut state = SimulationState::new(&patient, config.clone());
    for order in orders {
        state.start_intervention(order.clone())?;
    }

    // Events are cleared every tick, so collect them one tick at a time
    let mut events = Vec::new();
    let end = state.minutes() + args.minutes;
    while state.minutes() + 1e-9 < end && !state.outcome.is_terminal() {
        let remaining = end - state.minutes();
        state = run_for(&state, &patient, state.config.tick_minutes.min(remaining));
        if args.verbose {
            events.extend(state.events.iter().cloned());
        }
    }

    tracing::info!(seed, outcome = state.outcome.label(), minutes = state.minutes(), "case finished");

    Ok(RunSummary {
        seed,
        shock: patient.shock_type.to_string(),
        minutes: state.minutes(),
        outcome: state.outcome.clone(),
        vitals: state.vitals.clone(),
        labs: state.labs.clone(),
        metrics: state.metrics.clone(),
        alerts: state.alerts.clone(),
        warnings: state.warnings.clone(),
        events,
    })
}

fn run(args: &Args) -> Result<String> {
    let config = load_config(args)?;
    let data = load_patient_data(args)?;
    let orders = args
        .interventions
        .iter()
        .map(|order| parse_order(order))
        .collect::<Result<Vec<_>>>()?;

    let base_seed = args.seed.or(data.seed).unwrap_or_else(rand::random);
    let seeds: Vec<u64> = (0..args.replicates.max(1) as u64)
        .map(|i| base_seed.wrapping_add(i))
        .collect();

    let summaries = seeds
        .par_iter()
        .map(|&seed| run_case(&data, &config, &orders, seed, args))
        .collect::<Result<Vec<_>>>()?;

    let json = if summaries.len() == 1 {
        serde_json::to_string_pretty(&summaries[0])?
    } else {
        serde_json::to_string_pretty(&summaries)?
    };
    Ok(json)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shock_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Erro: {}", e);
            std::process::exit(1);
        }
    }
}
