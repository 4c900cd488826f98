mod scenario;

pub use scenario::Scenario;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cabo_bot::{ActionContext, DecisionError, SearchBot, SearchConfig, SkillTier};
use cabo_core::model::action::ActionKind;
use cabo_core::model::player::PlayerId;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, BenchmarkConfig, ResolvedOutputs};

/// Asks every configured agent every decision on a fixed set of seeded
/// tables and records how long each answer took.
pub struct DecisionRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub scenarios: usize,
    pub agents: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl DecisionRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = config.agents.iter().map(AgentBlueprint::from_config).collect();
        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute every scenario for every agent, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let scenarios = self.deal_scenarios()?;
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rows_written = 0usize;
        let mut metrics = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            let mut agent_metrics = DecisionMetrics::default();
            for scenario in &scenarios {
                for record in self.run_scenario(agent, scenario) {
                    agent_metrics.record(&record, self.config.metrics.latency_budget_ms);
                    let row = DecisionLogRow {
                        run_id: &self.config.run_id,
                        scenario_id: scenario.id(),
                        scenario_seed: scenario.seed,
                        agent: &agent.name,
                        tier: agent.tier.label(),
                        decision: record.decision,
                        answer: &record.answer,
                        ok: record.ok,
                        latency_ms: record.latency.as_secs_f64() * 1000.0,
                    };
                    serde_json::to_writer(&mut writer, &row)?;
                    writer.write_all(b"\n")?;
                    rows_written += 1;
                }
            }
            metrics.push((agent, agent_metrics));
        }
        writer.flush()?;

        write_summary(
            &self.outputs.summary_md,
            &self.config,
            scenarios.len(),
            &metrics,
        )?;

        let telemetry_path = if self.logging_enabled {
            self.outputs
                .summary_md
                .parent()
                .map(|dir| dir.join("telemetry.jsonl"))
        } else {
            None
        };

        Ok(RunSummary {
            scenarios: scenarios.len(),
            agents: self.agents.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    fn deal_scenarios(&self) -> Result<Vec<Scenario>, RunnerError> {
        let table = &self.config.scenarios;
        let mut rng = StdRng::seed_from_u64(table.seed.unwrap_or(0));
        (0..table.count)
            .map(|index| Scenario::deal(index, rng.next_u64(), table.players, table.hand_size))
            .collect()
    }

    fn run_scenario(&self, agent: &AgentBlueprint, scenario: &Scenario) -> Vec<DecisionRecord> {
        let mut bot = SearchBot::new(PlayerId(0), agent.tier)
            .with_seed(scenario.seed)
            .with_search_config(agent.search);
        let ctx = &scenario.context;
        let drawn = scenario.with_drawn();
        let action = ActionContext::new(scenario.drawn.action().unwrap_or(ActionKind::PeekOwn));

        let mut records = Vec::with_capacity(6);
        records.push(timed("turn_action", || {
            bot.choose_turn_action(ctx).map(|answer| format!("{answer:?}"))
        }));
        records.push(timed("call_end", || {
            bot.should_call_end(ctx).map(|answer| answer.to_string())
        }));
        records.push(timed("toss_in", || {
            bot.choose_toss_in(ctx).map(|answer| format!("{answer:?}"))
        }));
        records.push(timed("use_action", || {
            bot.should_use_action(&drawn).map(|answer| answer.to_string())
        }));
        records.push(timed("swap_position", || {
            bot.choose_swap_position(&drawn).map(|answer| format!("{answer:?}"))
        }));
        records.push(timed("action_targets", || {
            bot.choose_action_targets(ctx, &action)
                .map(|choice| format!("{:?}", choice.targets))
        }));

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            for record in &records {
                event!(
                    target: "cabo_bench::decision",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    scenario = scenario.index as u32,
                    agent = %agent.name,
                    decision = record.decision,
                    answer = %record.answer,
                    latency_ms = record.latency.as_secs_f64() * 1000.0
                );
            }
        }
        records
    }
}

fn timed<F>(decision: &'static str, call: F) -> DecisionRecord
where
    F: FnOnce() -> Result<String, DecisionError>,
{
    let start = Instant::now();
    let result = call();
    let latency = start.elapsed();
    match result {
        Ok(answer) => DecisionRecord {
            decision,
            answer,
            ok: true,
            latency,
        },
        Err(err) => DecisionRecord {
            decision,
            answer: err.to_string(),
            ok: false,
            latency,
        },
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

struct AgentBlueprint {
    name: String,
    tier: SkillTier,
    search: SearchConfig,
}

impl AgentBlueprint {
    fn from_config(config: &AgentConfig) -> Self {
        let tier = config.skill_tier();
        let search = tier.profile().search.with_overrides(config.overrides());
        Self {
            name: config.name.clone(),
            tier,
            search: SearchConfig::from(search),
        }
    }
}

struct DecisionRecord {
    decision: &'static str,
    answer: String,
    ok: bool,
    latency: Duration,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    worst: Duration,
    decisions: u32,
    errors: u32,
    over_budget: u32,
    answers: BTreeMap<&'static str, u32>,
}

impl DecisionMetrics {
    fn record(&mut self, record: &DecisionRecord, budget_ms: u64) {
        self.total += record.latency;
        self.worst = self.worst.max(record.latency);
        self.decisions += 1;
        if !record.ok {
            self.errors += 1;
        }
        if record.latency > Duration::from_millis(budget_ms) {
            self.over_budget += 1;
        }
        *self.answers.entry(record.decision).or_default() += 1;
    }

    fn average_ms(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        }
    }
}

fn write_summary(
    path: &Path,
    config: &BenchmarkConfig,
    scenarios: usize,
    metrics: &[(&AgentBlueprint, DecisionMetrics)],
) -> Result<(), RunnerError> {
    let budget = config.metrics.latency_budget_ms;
    let mut out = String::new();
    out.push_str("# Decision Latency Summary\n\n");
    out.push_str(&format!(
        "Run `{}`: {scenarios} scenarios, latency budget {budget} ms per decision\n\n",
        config.run_id
    ));
    out.push_str("| Agent | Tier | Decisions | Errors | Avg ms | Worst ms | Over budget |\n");
    out.push_str("|-------|------|-----------|--------|--------|----------|-------------|\n");
    for (agent, stats) in metrics {
        let average = stats.average_ms();
        out.push_str(&format!(
            "| {name} | {tier} | {decisions} | {errors} | {avg:.2} | {worst:.2} | {flag} ({count}) |\n",
            name = agent.name,
            tier = agent.tier.label(),
            decisions = stats.decisions,
            errors = stats.errors,
            avg = average,
            worst = stats.worst.as_secs_f64() * 1000.0,
            flag = if average > budget as f64 { "Yes" } else { "No" },
            count = stats.over_budget,
        ));
    }

    out.push_str("\n## Decisions per kind\n\n");
    for (agent, stats) in metrics {
        let counts = stats
            .answers
            .iter()
            .map(|(decision, count)| format!("{decision}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("- {}: {counts}\n", agent.name));
    }

    fs::write(path, out)?;
    Ok(())
}

#[derive(Serialize)]
struct DecisionLogRow<'a> {
    run_id: &'a str,
    scenario_id: String,
    scenario_seed: u64,
    agent: &'a str,
    tier: &'static str,
    decision: &'static str,
    answer: &'a str,
    ok: bool,
    latency_ms: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("dealing failed: {message}")]
    Deal { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_track_worst_and_budget() {
        let mut metrics = DecisionMetrics::default();
        for (ms, ok) in [(5u64, true), (30, false), (10, true)] {
            metrics.record(
                &DecisionRecord {
                    decision: "turn_action",
                    answer: String::new(),
                    ok,
                    latency: Duration::from_millis(ms),
                },
                20,
            );
        }
        assert_eq!(metrics.decisions, 3);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.over_budget, 1);
        assert_eq!(metrics.worst, Duration::from_millis(30));
        assert!((metrics.average_ms() - 15.0).abs() < 1e-9);
        assert_eq!(metrics.answers.get("turn_action"), Some(&3));
    }
}
