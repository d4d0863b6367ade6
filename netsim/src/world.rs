//! SimWorld - a network, its registry and their contexts in one place.

use crate::adapters::SimAdapter;
use crate::context::SimContext;
use crate::network::SimNetwork;
use crate::options::with_msg_events;
use crate::registry::{NodeRegistry, Result};

use netsim_env::{EnvError, NodeId};
use std::sync::Arc;

/// Registry over the in-memory network with seeded contexts.
pub type SimRegistry = NodeRegistry<SimNetwork<SimContext>, SimContext>;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Services attached to every node
    pub services: Vec<String>,

    /// Number of nodes created by `spawn_nodes`
    pub initial_nodes: usize,

    /// Enable message events on spawned nodes
    pub msg_events: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            services: Vec::new(),
            initial_nodes: 0,
            msg_events: false,
        }
    }
}

/// The SimWorld - container for one simulation run.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Node registry (owns the network handle)
    registry: SimRegistry,
}

impl SimWorld {
    /// Creates a new SimWorld with the given configuration.
    ///
    /// Every configured service is registered as an idle in-process service.
    pub fn new(config: SimConfig) -> Self {
        // Derive separate seeds for different subsystems
        let key_seed = config.seed.wrapping_mul(0x517cc1b727220a95);
        let selection_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);

        let adapter = config
            .services
            .iter()
            .fold(SimAdapter::new(), |adapter, name| adapter.with_idle_service(name.clone()));

        let network = Arc::new(SimNetwork::with_sim_adapter(
            SimContext::shared(key_seed),
            adapter,
        ));
        let registry = NodeRegistry::new(
            network,
            SimContext::shared(selection_seed),
            config.services.clone(),
        );

        Self { config, registry }
    }

    /// Creates and starts `initial_nodes` nodes.
    pub fn spawn_nodes(&self) -> Result<Vec<NodeId>> {
        let options = [with_msg_events(self.config.msg_events)];
        self.registry.add_nodes(self.config.initial_nodes, &options)
    }

    /// Returns the registry.
    pub fn registry(&self) -> &SimRegistry {
        &self.registry
    }

    /// Returns the network.
    pub fn network(&self) -> &SimNetwork<SimContext> {
        self.registry.network()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.network().node_count()
    }

    /// Returns the number of running nodes.
    pub fn up_count(&self) -> usize {
        self.registry.up_node_ids().len()
    }

    /// Stops every running node.
    pub fn shutdown(&self) -> std::result::Result<(), EnvError> {
        self.network().shutdown()
    }
}
