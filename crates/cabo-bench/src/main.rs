use std::path::PathBuf;

use clap::Parser;

use cabo_bench::config::{BenchmarkConfig, ResolvedOutputs};
use cabo_bench::logging::init_logging;
use cabo_bench::runner::DecisionRunner;

/// Decision latency harness for the search bots.
#[derive(Debug, Parser)]
#[command(
    name = "cabo-bench",
    author,
    version,
    about = "Deterministic decision latency harness for search bots"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of scenarios to deal.
    #[arg(long, value_name = "COUNT")]
    count: Option<usize>,

    /// Override the RNG seed for scenario generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no decisions are run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(count) = cli.count {
        config.scenarios.count = count;
    }

    if let Some(seed) = cli.seed {
        config.scenarios.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let scenarios = config.scenarios.count;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({scenarios} scenarios)",
        if agent_count == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: decision runs skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = DecisionRunner::new(config, outputs)?;
    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} scenarios × {} agents → {} rows at {}",
        summary.scenarios,
        summary.agents,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
