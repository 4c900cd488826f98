//! Skill tiers and the parameter table behind them.
//!
//! Tiers differ only by the numbers in [`TierProfile`]; every code path that
//! consumes a profile is shared.

use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillTier {
    Novice,
    Casual,
    Skilled,
    Expert,
}

impl Default for SkillTier {
    fn default() -> Self {
        Self::Casual
    }
}

impl SkillTier {
    pub const ALL: [SkillTier; 4] = [
        SkillTier::Novice,
        SkillTier::Casual,
        SkillTier::Skilled,
        SkillTier::Expert,
    ];

    /// Tier requested through `CABO_BOT_TIER`, read once per process.
    pub fn from_env() -> Self {
        static CACHED: OnceLock<SkillTier> = OnceLock::new();
        *CACHED.get_or_init(|| Self::from_reader(|key| std::env::var(key).ok()))
    }

    pub(crate) fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        read("CABO_BOT_TIER")
            .and_then(|raw| SkillTier::parse(&raw))
            .unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "novice" | "easy" => Some(SkillTier::Novice),
            "casual" | "normal" => Some(SkillTier::Casual),
            "skilled" | "hard" => Some(SkillTier::Skilled),
            "expert" => Some(SkillTier::Expert),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SkillTier::Novice => "novice",
            SkillTier::Casual => "casual",
            SkillTier::Skilled => "skilled",
            SkillTier::Expert => "expert",
        }
    }

    pub const fn profile(self) -> TierProfile {
        match self {
            SkillTier::Novice => TierProfile {
                memory: MemoryProfile {
                    accuracy: 0.70,
                    decay_per_ms: 5.0e-5,
                    capacity: 4,
                    forget_chance: 0.15,
                    observations_for_high_confidence: 3,
                },
                search: SearchProfile {
                    time_budget_ms: 150,
                    max_iterations: 200,
                    rollout_depth: 20,
                    exploration: 1.8,
                },
                thinking_delay_ms: 900,
            },
            SkillTier::Casual => TierProfile {
                memory: MemoryProfile {
                    accuracy: 0.85,
                    decay_per_ms: 2.0e-5,
                    capacity: 8,
                    forget_chance: 0.08,
                    observations_for_high_confidence: 2,
                },
                search: SearchProfile {
                    time_budget_ms: 300,
                    max_iterations: 600,
                    rollout_depth: 30,
                    exploration: 1.5,
                },
                thinking_delay_ms: 700,
            },
            SkillTier::Skilled => TierProfile {
                memory: MemoryProfile {
                    accuracy: 0.95,
                    decay_per_ms: 8.0e-6,
                    capacity: 14,
                    forget_chance: 0.03,
                    observations_for_high_confidence: 2,
                },
                search: SearchProfile {
                    time_budget_ms: 600,
                    max_iterations: 1_500,
                    rollout_depth: 40,
                    exploration: std::f64::consts::SQRT_2,
                },
                thinking_delay_ms: 500,
            },
            SkillTier::Expert => TierProfile {
                memory: MemoryProfile {
                    accuracy: 1.0,
                    decay_per_ms: 2.0e-6,
                    capacity: 24,
                    forget_chance: 0.0,
                    observations_for_high_confidence: 1,
                },
                search: SearchProfile {
                    time_budget_ms: 1_000,
                    max_iterations: 3_000,
                    rollout_depth: 50,
                    exploration: 1.2,
                },
                thinking_delay_ms: 350,
            },
        }
    }
}

/// How well a bot remembers cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryProfile {
    /// Probability that an observation is recorded at all.
    pub accuracy: f64,
    /// Exponential decay rate of confidence, per elapsed millisecond.
    pub decay_per_ms: f64,
    /// Maximum number of slot records kept across all players.
    pub capacity: usize,
    /// Per-record chance of being dropped at every turn boundary.
    pub forget_chance: f64,
    /// Observations of a slot needed before confidence reaches 1.0.
    pub observations_for_high_confidence: u32,
}

/// How hard a bot searches per decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProfile {
    pub time_budget_ms: u64,
    pub max_iterations: usize,
    pub rollout_depth: usize,
    /// UCB1 exploration constant.
    pub exploration: f64,
}

impl SearchProfile {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn with_overrides(mut self, overrides: SearchOverrides) -> Self {
        if let Some(ms) = overrides.time_budget_ms {
            self.time_budget_ms = ms;
        }
        if let Some(iterations) = overrides.max_iterations {
            self.max_iterations = iterations;
        }
        if let Some(depth) = overrides.rollout_depth {
            self.rollout_depth = depth;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierProfile {
    pub memory: MemoryProfile,
    pub search: SearchProfile,
    /// Pause the orchestrator may insert before acting on a decision.
    pub thinking_delay_ms: u64,
}

/// Environment overrides for the search budget, used by harnesses and tuning runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOverrides {
    pub time_budget_ms: Option<u64>,
    pub max_iterations: Option<usize>,
    pub rollout_depth: Option<usize>,
}

impl SearchOverrides {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        Self {
            time_budget_ms: read("CABO_SEARCH_TIME_MS").and_then(|raw| raw.trim().parse().ok()),
            max_iterations: read("CABO_SEARCH_ITERATIONS")
                .and_then(|raw| raw.trim().parse().ok()),
            rollout_depth: read("CABO_ROLLOUT_DEPTH").and_then(|raw| raw.trim().parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn expert_never_misremembers() {
        let profile = SkillTier::Expert.profile();
        assert_eq!(profile.memory.accuracy, 1.0);
        assert_eq!(profile.memory.forget_chance, 0.0);
    }

    #[test]
    fn higher_tiers_remember_more_and_search_longer() {
        for pair in SkillTier::ALL.windows(2) {
            let lower = pair[0].profile();
            let higher = pair[1].profile();
            assert!(higher.memory.accuracy >= lower.memory.accuracy);
            assert!(higher.memory.capacity > lower.memory.capacity);
            assert!(higher.memory.decay_per_ms < lower.memory.decay_per_ms);
            assert!(higher.search.max_iterations > lower.search.max_iterations);
        }
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(SkillTier::parse(" Hard "), Some(SkillTier::Skilled));
        assert_eq!(SkillTier::parse("expert"), Some(SkillTier::Expert));
        assert_eq!(SkillTier::parse("grandmaster"), None);
    }

    #[test]
    fn tier_from_env_parses_or_defaults() {
        assert_eq!(SkillTier::from_reader(|_| None), SkillTier::Casual);
        let tier = SkillTier::from_reader(|key| (key == "CABO_BOT_TIER").then(|| "Easy".to_string()));
        assert_eq!(tier, SkillTier::Novice);
        let bogus = SkillTier::from_reader(|_| Some("grandmaster".to_string()));
        assert_eq!(bogus, SkillTier::default());
    }

    #[test]
    fn overrides_from_env_default_fallbacks() {
        let overrides = SearchOverrides::from_reader(|_| None);
        assert_eq!(overrides, SearchOverrides::default());
        let profile = SkillTier::Casual.profile().search;
        assert_eq!(profile.with_overrides(overrides), profile);
    }

    #[test]
    fn overrides_from_env_respect_values() {
        let mut vars = HashMap::new();
        vars.insert("CABO_SEARCH_TIME_MS".to_string(), "25".to_string());
        vars.insert("CABO_SEARCH_ITERATIONS".to_string(), "oops".to_string());
        vars.insert("CABO_ROLLOUT_DEPTH".to_string(), " 7 ".to_string());

        let overrides = SearchOverrides::from_reader(|key| vars.get(key).cloned());
        let search = SkillTier::Casual.profile().search.with_overrides(overrides);
        assert_eq!(search.time_budget_ms, 25);
        assert_eq!(search.max_iterations, 600);
        assert_eq!(search.rollout_depth, 7);
    }
}
