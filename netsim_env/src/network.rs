//! Simulated network abstraction consumed by the node registry.

use crate::error::EnvError;
use crate::types::{NodeConfig, NodeId};
use std::any::Any;
use std::sync::Arc;

/// The simulated network that owns every node.
///
/// The registry only ever reaches nodes through this trait, so any
/// harness able to create, start and enumerate nodes can sit behind it.
///
/// # Lifecycle
///
/// ```text
/// random_node_config() -> new_node_with_config() -> start(id) -> handle.stop()
///                                  |                    ^              |
///                                  |                    +--------------+
///                                  v
///                            nodes() / node(id)
/// ```
pub trait SimulatedNetwork: Send + Sync + 'static {
    /// Handle type returned for each node.
    type Node: NodeHandle;

    /// Returns every known node in the network's own order.
    fn nodes(&self) -> Vec<Arc<Self::Node>>;

    /// Resolves a node by identifier.
    ///
    /// # Returns
    /// * `None` - The identifier is unknown
    fn node(&self, id: NodeId) -> Option<Arc<Self::Node>>;

    /// Generates a fresh configuration with a new identity.
    fn random_node_config(&self) -> NodeConfig;

    /// Creates a (stopped) node from a configuration.
    ///
    /// # Returns
    /// * `Err(EnvError::NodeExists)` - The configuration id is already taken
    /// * `Err(EnvError::Adapter)` - The adapter failed to build the node
    fn new_node_with_config(&self, config: NodeConfig) -> Result<Arc<Self::Node>, EnvError>;

    /// Starts a node by identifier.
    ///
    /// # Returns
    /// * `Err(EnvError::NodeNotFound)` - Unknown identifier
    /// * `Err(EnvError::NodeAlreadyUp)` - Node is already running
    fn start(&self, id: NodeId) -> Result<(), EnvError>;
}

/// Handle to a node owned by a [`SimulatedNetwork`].
pub trait NodeHandle: Send + Sync + 'static {
    /// Returns the node identifier.
    fn id(&self) -> NodeId;

    /// Returns true while the node is running.
    fn is_up(&self) -> bool;

    /// Returns the configuration the node was created with.
    fn config(&self) -> NodeConfig;

    /// Stops the node.
    fn stop(&self) -> Result<(), EnvError>;

    /// Returns the implementation behind this node.
    fn adapter(&self) -> Arc<dyn NodeAdapter>;
}

/// Concrete node implementation (in-process, external process, ...).
pub trait NodeAdapter: Send + Sync + 'static {
    /// Short name of the adapter kind, e.g. `"sim"`.
    fn kind(&self) -> &'static str;

    /// Starts the node with the given services.
    fn start(&self, services: &[String]) -> Result<(), EnvError>;

    /// Stops the node and all of its services.
    fn stop(&self) -> Result<(), EnvError>;

    /// Erases the adapter type so callers can narrow it with `Arc::downcast`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A protocol service attached to a node.
pub trait Service: Send + 'static {
    /// Starts the service on the given node.
    ///
    /// The node does not report as up until every service has started,
    /// so querying the network from here sees it as down.
    fn start(&mut self, node: NodeId) -> Result<(), EnvError>;

    /// Stops the service.
    fn stop(&mut self) -> Result<(), EnvError>;
}
