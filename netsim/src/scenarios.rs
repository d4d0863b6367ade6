//! Chaos scenarios built from registry operations.

use serde::Serialize;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Stop half of the nodes at random
    StopRandom,

    /// Stop and restart random nodes, population stays constant
    Churn,

    /// Stop everything but the pivot node
    PivotSurvival,

    /// Stop every node, then expect selection to come up empty
    Drain,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::StopRandom,
            ScenarioId::Churn,
            ScenarioId::PivotSurvival,
            ScenarioId::Drain,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::StopRandom => "stop_random",
            ScenarioId::Churn => "churn",
            ScenarioId::PivotSurvival => "pivot_survival",
            ScenarioId::Drain => "drain",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::StopRandom => "Stop half the nodes at random, the rest stay up",
            ScenarioId::Churn => "Stop one random node and restart one random down node per round",
            ScenarioId::PivotSurvival => "Stop random nodes excluding the pivot until only the pivot is up",
            ScenarioId::Drain => "Stop all nodes, then random stop must report NodeNotFound",
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
            "stop_random" | "stoprandom" => Ok(ScenarioId::StopRandom),
            "churn" => Ok(ScenarioId::Churn),
            "pivot_survival" | "pivotsurvival" | "pivot" => Ok(ScenarioId::PivotSurvival),
            "drain" => Ok(ScenarioId::Drain),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
        }
    }

    #[test]
    fn test_aliases_and_unknown() {
        assert_eq!("PIVOT".parse::<ScenarioId>(), Ok(ScenarioId::PivotSurvival));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}
