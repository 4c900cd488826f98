use cabo_bot::SkillTier;
use cabo_bot::tier::SearchOverrides;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_LATENCY_BUDGET_MS: u64 = 1_200;
const DEFAULT_PLAYERS: usize = 4;
const DEFAULT_HAND_SIZE: usize = 4;
const MAX_PLAYERS: usize = 6;
const MAX_HAND_SIZE: usize = 8;
/// Cards that must stay in the deck after dealing: a discard and a drawn card.
const RESERVED_CARDS: usize = 2;
const DECK_SIZE: usize = 54;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub scenarios: ScenarioConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.scenarios.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.metrics.validate()?;
        self.logging.normalize();
        validate_agents(&self.agents)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Seeded table positions every agent is asked about.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_players")]
    pub players: usize,
    #[serde(default = "default_hand_size")]
    pub hand_size: usize,
}

impl ScenarioConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(invalid("scenarios.count", "number of scenarios must be greater than zero"));
        }
        if !(2..=MAX_PLAYERS).contains(&self.players) {
            return Err(invalid(
                "scenarios.players",
                format!("players must be between 2 and {MAX_PLAYERS}"),
            ));
        }
        if !(1..=MAX_HAND_SIZE).contains(&self.hand_size) {
            return Err(invalid(
                "scenarios.hand_size",
                format!("hand size must be between 1 and {MAX_HAND_SIZE}"),
            ));
        }
        if self.players * self.hand_size + RESERVED_CARDS > DECK_SIZE {
            return Err(invalid(
                "scenarios.hand_size",
                "not enough cards in the deck for this table",
            ));
        }
        Ok(())
    }
}

fn default_players() -> usize {
    DEFAULT_PLAYERS
}

fn default_hand_size() -> usize {
    DEFAULT_HAND_SIZE
}

/// One benchmarked bot configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    /// Falls back to `CABO_BOT_TIER` when omitted.
    #[serde(default)]
    pub tier: Option<TierName>,
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub rollout_depth: Option<usize>,
}

impl AgentConfig {
    pub fn skill_tier(&self) -> SkillTier {
        self.tier.map(SkillTier::from).unwrap_or_else(SkillTier::from_env)
    }

    pub fn overrides(&self) -> SearchOverrides {
        SearchOverrides {
            time_budget_ms: self.time_budget_ms,
            max_iterations: self.max_iterations,
            rollout_depth: self.rollout_depth,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TierName {
    Novice,
    Casual,
    Skilled,
    Expert,
}

impl From<TierName> for SkillTier {
    fn from(name: TierName) -> Self {
        match name {
            TierName::Novice => SkillTier::Novice,
            TierName::Casual => SkillTier::Casual,
            TierName::Skilled => SkillTier::Skilled,
            TierName::Expert => SkillTier::Expert,
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(label, "path must not be empty"));
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(invalid(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Metrics configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.latency_budget_ms == 0 {
            return Err(invalid(
                "metrics.latency_budget_ms",
                "latency budget must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(invalid("run_id", "run_id must not be empty"));
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(invalid(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }

    Ok(())
}

fn validate_agents(agents: &[AgentConfig]) -> Result<(), ValidationError> {
    if agents.is_empty() {
        return Err(invalid("agents", "at least one agent must be specified"));
    }

    let mut seen = HashSet::new();
    for agent in agents {
        if agent.name.trim().is_empty() {
            return Err(invalid("agents.name", "agent name must not be empty"));
        }

        if !agent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(invalid(
                format!("agents[{}].name", agent.name),
                "agent name contains invalid characters",
            ));
        }

        if !seen.insert(agent.name.clone()) {
            return Err(invalid(
                "agents",
                format!("agent name '{}' defined more than once", agent.name),
            ));
        }

        if agent.max_iterations == Some(0) {
            return Err(invalid(
                format!("agents[{}].max_iterations", agent.name),
                "iteration cap must be greater than zero",
            ));
        }
    }

    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.into(),
        message: message.into(),
    }
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
