//! Scenario runner - executes chaos scenarios against a fresh SimWorld.

use crate::error::RegistryError;
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld};

use serde::Serialize;
use tracing::{debug, info};

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Nodes known to the network at the end
    pub total_nodes: usize,

    /// Nodes running at the end (before shutdown)
    pub up_nodes: usize,

    /// Registry operations issued
    pub operations: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Runs chaos scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Number of nodes spawned before each scenario
    num_nodes: usize,

    /// Services attached to every node
    services: Vec<String>,

    /// Rounds for iterative scenarios
    rounds: usize,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_nodes: usize) -> Self {
        Self {
            seed,
            num_nodes,
            services: Vec::new(),
            rounds: 10,
        }
    }

    /// Sets the services attached to every node.
    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    /// Sets the number of rounds for iterative scenarios.
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let world = SimWorld::new(SimConfig {
            seed: self.seed,
            services: self.services.clone(),
            initial_nodes: self.num_nodes,
            msg_events: false,
        });

        let mut operations = 0;
        let outcome = match world.spawn_nodes() {
            Ok(ids) => {
                operations += ids.len() as u64;
                match scenario {
                    ScenarioId::StopRandom => self.run_stop_random(&world, &mut operations),
                    ScenarioId::Churn => self.run_churn(&world, &mut operations),
                    ScenarioId::PivotSurvival => self.run_pivot_survival(&world, &mut operations),
                    ScenarioId::Drain => self.run_drain(&world, &mut operations),
                }
            }
            Err(e) => Err(format!("spawn failed: {}", e)),
        };

        let total_nodes = world.node_count();
        let up_nodes = world.up_count();
        let outcome = outcome.and_then(|()| {
            world
                .shutdown()
                .map_err(|e| format!("shutdown failed: {}", e))
        });

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: outcome.is_ok(),
            total_nodes,
            up_nodes,
            operations,
            failure_reason: outcome.err(),
        }
    }

    /// Stops half of the nodes; the other half and the total must hold.
    fn run_stop_random(&self, world: &SimWorld, ops: &mut u64) -> Result<(), String> {
        let registry = world.registry();
        let to_stop = self.num_nodes / 2;

        let stopped = registry
            .stop_random_nodes(to_stop)
            .map_err(|e| format!("stop failed: {}", e))?;
        *ops += stopped.len() as u64;

        expect_counts(world, self.num_nodes - to_stop, self.num_nodes)
    }

    /// One random stop and one random start per round.
    fn run_churn(&self, world: &SimWorld, ops: &mut u64) -> Result<(), String> {
        if self.num_nodes == 0 {
            return Err("churn needs at least one node".to_string());
        }
        let registry = world.registry();

        for round in 0..self.rounds {
            let stopped = registry
                .stop_random_node()
                .map_err(|e| format!("round {}: stop failed: {}", round, e))?;
            let started = registry
                .start_random_node()
                .map_err(|e| format!("round {}: start failed: {}", round, e))?;
            *ops += 2;

            debug!("  round={} | stopped={} | started={}", round, stopped, started);
            expect_counts(world, self.num_nodes, self.num_nodes)
                .map_err(|e| format!("round {}: {}", round, e))?;
        }

        Ok(())
    }

    /// Every node except the pivot goes down.
    fn run_pivot_survival(&self, world: &SimWorld, ops: &mut u64) -> Result<(), String> {
        let registry = world.registry();
        let pivot = registry
            .random_up_node_id(&[])
            .ok_or_else(|| "no node to use as pivot".to_string())?;
        registry.set_pivot_node(pivot);

        while let Some(id) = registry.random_up_node_id(&[pivot]) {
            registry
                .stop_node(id)
                .map_err(|e| format!("stop {} failed: {}", id, e))?;
            *ops += 1;
        }

        if registry.up_node_ids() != [pivot] {
            return Err(format!("pivot {} is not the only node up", pivot));
        }
        if registry.pivot_node_id() != Some(pivot) {
            return Err("pivot changed during the run".to_string());
        }
        expect_counts(world, 1, self.num_nodes)
    }

    /// Stop everything, then selection must come up empty.
    fn run_drain(&self, world: &SimWorld, ops: &mut u64) -> Result<(), String> {
        let registry = world.registry();

        registry
            .stop_random_nodes(self.num_nodes)
            .map_err(|e| format!("drain failed: {}", e))?;
        *ops += self.num_nodes as u64;

        match registry.stop_random_node() {
            Err(RegistryError::NodeNotFound) => {}
            Ok(id) => return Err(format!("stopped {} from a drained network", id)),
            Err(e) => return Err(format!("unexpected error: {}", e)),
        }
        *ops += 1;

        expect_counts(world, 0, self.num_nodes)
    }
}

fn expect_counts(world: &SimWorld, up: usize, total: usize) -> Result<(), String> {
    let (actual_up, actual_total) = (world.up_count(), world.node_count());
    if actual_up != up || actual_total != total {
        return Err(format!(
            "expected {}/{} nodes up, found {}/{}",
            up, total, actual_up, actual_total
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scenarios_pass() {
        let runner = ScenarioRunner::new(42, 6)
            .with_services(vec!["bzz".to_string()])
            .with_rounds(5);

        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(result.passed, "{} failed: {:?}", scenario, result.failure_reason);
            assert_eq!(result.total_nodes, 6);
        }
    }

    #[test]
    fn test_stop_random_counts() {
        let result = ScenarioRunner::new(7, 5).run(ScenarioId::StopRandom);

        assert!(result.passed);
        assert_eq!(result.up_nodes, 3);
        assert_eq!(result.operations, 5 + 2);
    }

    #[test]
    fn test_pivot_survival_single_node() {
        let result = ScenarioRunner::new(3, 1).run(ScenarioId::PivotSurvival);
        assert!(result.passed);
        assert_eq!(result.up_nodes, 1);
    }

    #[test]
    fn test_empty_network_failures() {
        let churn = ScenarioRunner::new(1, 0).run(ScenarioId::Churn);
        assert!(!churn.passed);

        let pivot = ScenarioRunner::new(1, 0).run(ScenarioId::PivotSurvival);
        assert!(!pivot.passed);

        // Draining nothing is fine
        let drain = ScenarioRunner::new(1, 0).run(ScenarioId::Drain);
        assert!(drain.passed, "{:?}", drain.failure_reason);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = ScenarioRunner::new(99, 8).run(ScenarioId::Churn);
        let b = ScenarioRunner::new(99, 8).run(ScenarioId::Churn);

        assert_eq!(a.passed, b.passed);
        assert_eq!(a.operations, b.operations);
    }
}
