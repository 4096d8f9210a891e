//! Self-check scenarios for the distributed automaton.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// A single live cell on a dead 4x4 torus dies in one generation
    LoneCell,

    /// Zero generations leave the seeded grid untouched
    ZeroIterations,

    /// Two identical runs agree
    Determinism,

    /// Every decomposition agrees with the single-worker reference
    Decomposition,

    /// Single-slot links (fully lock-stepped ring) agree with buffered links
    Lockstep,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::LoneCell,
            ScenarioId::ZeroIterations,
            ScenarioId::Determinism,
            ScenarioId::Decomposition,
            ScenarioId::Lockstep,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::LoneCell => "lone_cell",
            ScenarioId::ZeroIterations => "zero_iterations",
            ScenarioId::Determinism => "determinism",
            ScenarioId::Decomposition => "decomposition",
            ScenarioId::Lockstep => "lockstep",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::LoneCell => "4x4, one worker, one generation: a lone live cell dies",
            ScenarioId::ZeroIterations => "0 generations: final fingerprint equals the seeded one",
            ScenarioId::Determinism => "same seed and ring twice: identical fingerprints",
            ScenarioId::Decomposition => "1..=W workers over uneven splits: identical fingerprints",
            ScenarioId::Lockstep => "capacity-1 links vs buffered links: identical fingerprints",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lone_cell" | "lonecell" => Ok(ScenarioId::LoneCell),
            "zero_iterations" | "zeroiterations" | "identity" => Ok(ScenarioId::ZeroIterations),
            "determinism" => Ok(ScenarioId::Determinism),
            "decomposition" => Ok(ScenarioId::Decomposition),
            "lockstep" => Ok(ScenarioId::Lockstep),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
