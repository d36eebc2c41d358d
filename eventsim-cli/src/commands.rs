use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use validator::Validate;

use eventsim_config::{ConfigError, SimulationConfig};
use eventsim_engine::{plan_digest, plan_sessions, run_simulation};
use eventsim_sink::build_sink;
use eventsim_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser)]
#[command(name = "eventsim", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate sessions and publish their events
    Run(RunArgs),
    /// Print every session's seed-derived metadata and the plan digest
    Plan(PlanArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// YAML or JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub sessions: Option<usize>,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: Overrides,
    /// Refuse to start unless the session plan hashes to this digest
    #[arg(long)]
    pub validate_digest: Option<String>,
    /// Print Prometheus metrics when the run ends
    #[arg(long)]
    pub print_metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

impl Overrides {
    /// Loads the layered configuration and applies command-line values last.
    pub fn resolve(&self) -> Result<SimulationConfig, ConfigError> {
        let mut config = SimulationConfig::load(self.config.as_deref())?;
        self.apply(&mut config)?;
        Ok(config)
    }

    fn apply(&self, config: &mut SimulationConfig) -> Result<(), ConfigError> {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(sessions) = self.sessions {
            config.sessions = sessions;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(())
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Plan(args) => plan(args),
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.overrides.resolve()?;
    EventLogger::init(&config.logging)?;
    info!("config: {config}");

    let sink = build_sink(&config.sink).context("building sink")?;
    let metrics = MetricsRecorder::new()?;
    let summary = run_simulation(
        config,
        sink,
        metrics.clone(),
        args.validate_digest.as_deref(),
    )
    .await?;

    if args.print_metrics {
        print!("{}", metrics.gather_metrics()?);
    }
    summary.ensure_complete()?;
    Ok(())
}

fn plan(args: PlanArgs) -> anyhow::Result<()> {
    let config = args.overrides.resolve()?;
    let plans = plan_sessions(&config);
    for plan in &plans {
        println!("{}", serde_json::to_string(plan)?);
    }
    println!("digest: {}", plan_digest(&plans));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse() {
        let cli = Cli::try_parse_from([
            "eventsim",
            "run",
            "--workers",
            "4",
            "--seed",
            "7",
            "--validate-digest",
            "abc",
            "--print-metrics",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.overrides.workers, Some(4));
        assert_eq!(args.overrides.seed, Some(7));
        assert_eq!(args.validate_digest.as_deref(), Some("abc"));
        assert!(args.print_metrics);
    }

    #[test]
    fn plan_takes_a_config_file() {
        let cli = Cli::try_parse_from(["eventsim", "plan", "-c", "sim.yaml"]).unwrap();
        let Commands::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.overrides.config, Some(PathBuf::from("sim.yaml")));
    }

    #[test]
    fn overrides_win_over_loaded_values() {
        let mut config = SimulationConfig::default();
        let overrides = Overrides {
            workers: Some(8),
            sessions: Some(3),
            seed: Some(11),
            ..Overrides::default()
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!((config.workers, config.sessions, config.seed), (8, 3, 11));
    }

    #[test]
    fn overrides_are_validated() {
        let mut config = SimulationConfig::default();
        let overrides = Overrides {
            workers: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            overrides.apply(&mut config),
            Err(ConfigError::Validation(_))
        ));
    }
}
