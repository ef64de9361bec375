//! Search algorithm selection and tuning parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Step schedule for one Hooke–Jeeves local search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalSearchParams {
    /// Initial exploration step (radians per move axis).
    pub delta_start: f32,
    /// Step size at or below which the search stops.
    pub delta_end: f32,
    /// Hard bound on exploration passes.
    pub max_steps: usize,
}

impl LocalSearchParams {
    /// Wide steps used to polish many candidates quickly.
    pub fn coarse() -> Self {
        Self {
            delta_start: 0.1,
            delta_end: 0.03,
            max_steps: 100,
        }
    }

    /// Narrow steps used for the final refinement.
    pub fn fine() -> Self {
        Self {
            delta_start: 0.03,
            delta_end: 0.00001,
            max_steps: 100,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let valid = |delta: f32| delta > 0.0 && delta.is_finite();
        if !valid(self.delta_start) || !valid(self.delta_end) {
            return Err(ConfigError::InvalidStep {
                name: name.to_string(),
            });
        }
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidMaxSteps {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        Self::coarse()
    }
}

/// Identifier of a search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Probe,
    UniformPoints,
    Deterministic,
    MonteCarlo,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Probe,
        StrategyKind::UniformPoints,
        StrategyKind::Deterministic,
        StrategyKind::MonteCarlo,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::Probe => "probe",
            StrategyKind::UniformPoints => "uniform_points",
            StrategyKind::Deterministic => "deterministic",
            StrategyKind::MonteCarlo => "monte_carlo",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| ConfigError::UnknownStrategy(s.to_string()))
    }
}

/// Search algorithm selection with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchAlgorithm {
    /// Repeats a fixed move to exercise an evaluator pipeline.
    Probe(ProbeConfig),
    /// Best of the Fibonacci sphere samples, no refinement.
    UniformPoints(UniformPointsConfig),
    /// Best-K Fibonacci samples, each polished, then the winner refined.
    Deterministic(DeterministicConfig),
    /// Random restarts, each polished, then the winner refined.
    MonteCarlo(MonteCarloConfig),
}

impl Default for SearchAlgorithm {
    fn default() -> Self {
        Self::Deterministic(DeterministicConfig::default())
    }
}

impl SearchAlgorithm {
    /// Default parameters for a strategy identifier.
    pub fn from_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Probe => Self::Probe(ProbeConfig::default()),
            StrategyKind::UniformPoints => Self::UniformPoints(UniformPointsConfig::default()),
            StrategyKind::Deterministic => Self::Deterministic(DeterministicConfig::default()),
            StrategyKind::MonteCarlo => Self::MonteCarlo(MonteCarloConfig::default()),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Probe(_) => StrategyKind::Probe,
            Self::UniformPoints(_) => StrategyKind::UniformPoints,
            Self::Deterministic(_) => StrategyKind::Deterministic,
            Self::MonteCarlo(_) => StrategyKind::MonteCarlo,
        }
    }

    /// Validate algorithm parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Probe(cfg) => {
                if !cfg.step.iter().all(|s| s.is_finite()) {
                    return Err(ConfigError::InvalidStep {
                        name: "probe".to_string(),
                    });
                }
                Ok(())
            }
            Self::UniformPoints(_) => Ok(()),
            Self::Deterministic(cfg) => {
                if cfg.k == 0 {
                    return Err(ConfigError::EmptyCandidateSet);
                }
                cfg.coarse.validate("coarse")?;
                cfg.fine.validate("fine")
            }
            Self::MonteCarlo(cfg) => {
                cfg.coarse.validate("coarse")?;
                cfg.fine.validate("fine")
            }
        }
    }
}

/// Probe strategy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Move issued on every request.
    #[serde(default = "default_probe_step")]
    pub step: [f32; 2],
    /// Stop after this many requests (runs until cancelled when unset).
    #[serde(default)]
    pub max_requests: Option<usize>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            step: default_probe_step(),
            max_requests: None,
        }
    }
}

fn default_probe_step() -> [f32; 2] {
    [0.1, 0.1]
}

/// Uniform points configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformPointsConfig {
    /// Half-count of the Fibonacci sphere (2n+1 samples).
    #[serde(default = "default_uniform_n")]
    pub n: usize,
}

impl Default for UniformPointsConfig {
    fn default() -> Self {
        Self {
            n: default_uniform_n(),
        }
    }
}

fn default_uniform_n() -> usize {
    10
}

/// Deterministic best-K configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterministicConfig {
    /// Half-count of the Fibonacci sphere (2n+1 samples).
    #[serde(default = "default_deterministic_n")]
    pub n: usize,
    /// Number of samples kept for local refinement.
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "LocalSearchParams::coarse")]
    pub coarse: LocalSearchParams,
    #[serde(default = "LocalSearchParams::fine")]
    pub fine: LocalSearchParams,
}

impl Default for DeterministicConfig {
    fn default() -> Self {
        Self {
            n: default_deterministic_n(),
            k: default_k(),
            coarse: LocalSearchParams::coarse(),
            fine: LocalSearchParams::fine(),
        }
    }
}

fn default_deterministic_n() -> usize {
    2000
}
fn default_k() -> usize {
    60
}

/// Monte Carlo configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of random restarts.
    #[serde(default = "default_monte_carlo_n")]
    pub n: usize,
    #[serde(default = "LocalSearchParams::coarse")]
    pub coarse: LocalSearchParams,
    #[serde(default = "LocalSearchParams::fine")]
    pub fine: LocalSearchParams,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n: default_monte_carlo_n(),
            coarse: LocalSearchParams::coarse(),
            fine: LocalSearchParams::fine(),
            random_seed: None,
        }
    }
}

fn default_monte_carlo_n() -> usize {
    500
}
