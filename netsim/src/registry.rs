//! Node registry facade over a simulated network.
//!
//! The registry owns no node data. It generates configurations, applies
//! caller options, delegates lifecycle calls to the network, keeps the
//! optional pivot node, and picks nodes at random for chaos scenarios.
//!
//! # Consistency
//!
//! Only pivot reads and writes are atomic with respect to each other.
//! Listing nodes and then acting on the result is not: another thread may
//! stop or start a node in between, so callers work on snapshots.

use crate::adapters::SimNode;
use crate::error::RegistryError;
use crate::options::{apply_all, AddNodeOption};
use netsim_env::{EnvError, NetsimContext, NodeHandle, NodeId, SimulatedNetwork};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Concurrency-safe control layer over a [`SimulatedNetwork`].
pub struct NodeRegistry<N: SimulatedNetwork, C: NetsimContext> {
    /// The network that owns the nodes
    network: Arc<N>,

    /// Randomness for node selection
    context: Arc<C>,

    /// Services attached to every node created through the registry
    services: Vec<String>,

    /// Distinguished node for asymmetric scenarios
    pivot: Mutex<Option<NodeId>>,
}

impl<N: SimulatedNetwork, C: NetsimContext> NodeRegistry<N, C> {
    /// Creates a registry over `network`.
    ///
    /// # Arguments
    /// * `network` - The simulated network that owns the nodes
    /// * `context` - Randomness used for every random selection
    /// * `services` - Service names attached to every new node
    pub fn new<S: Into<String>>(
        network: Arc<N>,
        context: Arc<C>,
        services: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            network,
            context,
            services: services.into_iter().map(Into::into).collect(),
            pivot: Mutex::new(None),
        }
    }

    /// Returns the underlying network.
    pub fn network(&self) -> &Arc<N> {
        &self.network
    }

    /// Returns the selection context.
    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    /// Returns the services attached to every new node.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Returns the ids of all nodes, in the network's order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.network.nodes().iter().map(|n| n.id()).collect()
    }

    /// Returns the ids of running nodes, in the network's order.
    pub fn up_node_ids(&self) -> Vec<NodeId> {
        self.network
            .nodes()
            .iter()
            .filter(|n| n.is_up())
            .map(|n| n.id())
            .collect()
    }

    /// Returns the ids of stopped nodes, in the network's order.
    pub fn down_node_ids(&self) -> Vec<NodeId> {
        self.network
            .nodes()
            .iter()
            .filter(|n| !n.is_up())
            .map(|n| n.id())
            .collect()
    }

    /// Creates a node with a random configuration and starts it.
    ///
    /// `options` are applied in order to the generated configuration.
    /// The registry's service list is written last and replaces whatever
    /// an option put in `services`.
    ///
    /// # Returns
    /// * `Ok(id)` - The node was created and is running
    /// * `Err(RegistryError::Network)` - Creation failed; nothing was created
    /// * `Err(RegistryError::StartFailed)` - The node `id` exists but is down
    pub fn add_node(&self, options: &[AddNodeOption]) -> Result<NodeId> {
        let mut config = self.network.random_node_config();
        apply_all(&mut config, options);
        config.services = self.services.clone();

        let node = self.network.new_node_with_config(config)?;
        let id = node.id();
        debug!("added node {}", id);

        self.network.start(id).map_err(|source| {
            warn!("node {} created but failed to start: {}", id, source);
            RegistryError::StartFailed { id, source }
        })?;
        Ok(id)
    }

    /// Adds `count` nodes with the same options, stopping at the first failure.
    pub fn add_nodes(&self, count: usize, options: &[AddNodeOption]) -> Result<Vec<NodeId>> {
        (0..count).map(|_| self.add_node(options)).collect()
    }

    /// Sets the pivot node.
    ///
    /// The id is not checked against the network.
    pub fn set_pivot_node(&self, id: NodeId) {
        *self.pivot.lock() = Some(id);
    }

    /// Returns the pivot node, if one was set.
    pub fn pivot_node_id(&self) -> Option<NodeId> {
        *self.pivot.lock()
    }

    /// Starts a stopped node.
    pub fn start_node(&self, id: NodeId) -> Result<()> {
        self.network.start(id)?;
        debug!("started node {}", id);
        Ok(())
    }

    /// Starts one stopped node chosen at random.
    ///
    /// Fails with `RegistryError::NodeNotFound` when every node is up.
    pub fn start_random_node(&self) -> Result<NodeId> {
        let down = self.down_node_ids();
        let id = self
            .context
            .random_index(down.len())
            .map(|i| down[i])
            .ok_or(RegistryError::NodeNotFound)?;

        self.start_node(id)?;
        Ok(id)
    }

    /// Starts `count` random stopped nodes.
    pub fn start_random_nodes(&self, count: usize) -> Result<Vec<NodeId>> {
        (0..count).map(|_| self.start_random_node()).collect()
    }

    /// Stops a node by id.
    ///
    /// An unknown id fails with the network's `EnvError::NodeNotFound`.
    pub fn stop_node(&self, id: NodeId) -> Result<()> {
        let node = self
            .network
            .node(id)
            .ok_or(EnvError::NodeNotFound(id))?;
        node.stop()?;
        debug!("stopped node {}", id);
        Ok(())
    }

    /// Stops one running node chosen at random.
    ///
    /// Fails with `RegistryError::NodeNotFound`, without touching any
    /// node, when nothing is running.
    pub fn stop_random_node(&self) -> Result<NodeId> {
        let node = self.random_node(&[]).ok_or(RegistryError::NodeNotFound)?;
        node.stop()?;
        debug!("stopped random node {}", node.id());
        Ok(node.id())
    }

    /// Stops `count` random running nodes.
    pub fn stop_random_nodes(&self, count: usize) -> Result<Vec<NodeId>> {
        (0..count).map(|_| self.stop_random_node()).collect()
    }

    /// Picks a running node id at random, skipping `exclude`.
    ///
    /// Each excluded id removes at most one entry. Returns `None` when no
    /// candidate is left.
    pub fn random_up_node_id(&self, exclude: &[NodeId]) -> Option<NodeId> {
        let mut candidates = self.up_node_ids();
        for excluded in exclude {
            if let Some(pos) = candidates.iter().position(|id| id == excluded) {
                candidates.remove(pos);
            }
        }

        let index = self.context.random_index(candidates.len())?;
        Some(candidates[index])
    }

    /// Picks a running in-process node at random, skipping `exclude`.
    ///
    /// Returns `None` when no candidate is left, or when the chosen node
    /// is not backed by a [`SimNode`].
    pub fn random_node(&self, exclude: &[NodeId]) -> Option<Arc<N::Node>> {
        let id = self.random_up_node_id(exclude)?;
        let node = self.network.node(id)?;
        if Self::narrow(&node).is_none() {
            debug!("random node {} is not a sim node", id);
            return None;
        }
        Some(node)
    }

    /// Like [`random_node`](Self::random_node), returning the [`SimNode`] itself.
    pub fn random_sim_node(&self, exclude: &[NodeId]) -> Option<Arc<SimNode>> {
        let node = self.random_node(exclude)?;
        Self::narrow(&node)
    }

    fn narrow(node: &N::Node) -> Option<Arc<SimNode>> {
        node.adapter().into_any().downcast::<SimNode>().ok()
    }
}
