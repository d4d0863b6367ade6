//! In-memory simulated network tracking node lifecycle.

use crate::adapters::SimAdapter;
use netsim_env::{
    EnvError, NetsimContext, NodeAdapter, NodeConfig, NodeHandle, NodeId, SimulatedNetwork,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Builds the implementation behind each new node.
pub trait NodeFactory: Send + Sync + 'static {
    /// Creates a stopped node implementation for `config`.
    fn create(&self, config: &NodeConfig) -> Result<Arc<dyn NodeAdapter>, EnvError>;
}

impl NodeFactory for SimAdapter {
    fn create(&self, config: &NodeConfig) -> Result<Arc<dyn NodeAdapter>, EnvError> {
        Ok(Arc::new(self.new_node(config)?))
    }
}

/// Lifecycle event recorded by the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    NodeCreated(NodeId),
    NodeStarted(NodeId),
    NodeStopped(NodeId),
}

type EventLog = Arc<Mutex<Vec<SimEvent>>>;

/// Lifecycle of a node inside the network.
///
/// `Starting` and `Stopping` mark an adapter call in flight; such a node
/// reports as not up and rejects further start and stop requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Down,
    Starting,
    Up,
    Stopping,
}

/// A node owned by a [`SimNetwork`].
pub struct Node {
    /// Creation-time configuration
    config: NodeConfig,

    /// Lifecycle state, never held across adapter calls
    state: Mutex<NodeState>,

    /// Underlying implementation
    adapter: Arc<dyn NodeAdapter>,

    /// Network event journal
    events: EventLog,
}

impl Node {
    fn start(&self) -> Result<(), EnvError> {
        self.transition(NodeState::Down, NodeState::Starting)
            .map_err(|_| EnvError::NodeAlreadyUp(self.config.id))?;

        if let Err(e) = self.adapter.start(&self.config.services) {
            *self.state.lock() = NodeState::Down;
            return Err(e);
        }

        let mut state = self.state.lock();
        *state = NodeState::Up;
        self.events.lock().push(SimEvent::NodeStarted(self.config.id));
        drop(state);
        debug!("node {} up", self.config.id);
        Ok(())
    }

    /// Moves from `from` to `to`, or returns the state actually found.
    fn transition(&self, from: NodeState, to: NodeState) -> Result<(), NodeState> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(*state);
        }
        *state = to;
        Ok(())
    }
}

impl NodeHandle for Node {
    fn id(&self) -> NodeId {
        self.config.id
    }

    fn is_up(&self) -> bool {
        *self.state.lock() == NodeState::Up
    }

    fn config(&self) -> NodeConfig {
        self.config.clone()
    }

    fn stop(&self) -> Result<(), EnvError> {
        self.transition(NodeState::Up, NodeState::Stopping)
            .map_err(|_| EnvError::NodeNotUp(self.config.id))?;

        // A failed stop leaves the node up
        if let Err(e) = self.adapter.stop() {
            *self.state.lock() = NodeState::Up;
            return Err(e);
        }

        let mut state = self.state.lock();
        *state = NodeState::Down;
        self.events.lock().push(SimEvent::NodeStopped(self.config.id));
        drop(state);
        debug!("node {} down", self.config.id);
        Ok(())
    }

    fn adapter(&self) -> Arc<dyn NodeAdapter> {
        Arc::clone(&self.adapter)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.config.id)
            .field("name", &self.config.name)
            .field("state", &*self.state.lock())
            .field("adapter", &self.adapter.kind())
            .finish()
    }
}

/// Node table: insertion order plus an id index.
#[derive(Default)]
struct NodeTable {
    order: Vec<Arc<Node>>,
    index: HashMap<NodeId, usize>,
}

/// Simulated network holding every node in memory.
///
/// Nodes are kept in creation order; nothing is ever removed until the
/// network itself is dropped.
pub struct SimNetwork<C: NetsimContext> {
    /// Source of node identity keys
    context: Arc<C>,

    /// Builds node implementations
    factory: Box<dyn NodeFactory>,

    /// All nodes
    nodes: RwLock<NodeTable>,

    /// Seed extension for the next generated key
    next_key: AtomicU64,

    /// Lifecycle journal
    events: EventLog,
}

impl<C: NetsimContext> SimNetwork<C> {
    /// Creates a network building nodes with `factory`.
    pub fn new(context: Arc<C>, factory: impl NodeFactory) -> Self {
        Self {
            context,
            factory: Box::new(factory),
            nodes: RwLock::new(NodeTable::default()),
            next_key: AtomicU64::new(0),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a network of in-process [`SimNode`](crate::SimNode)s.
    pub fn with_sim_adapter(context: Arc<C>, adapter: SimAdapter) -> Self {
        Self::new(context, adapter)
    }

    /// Returns a copy of the lifecycle journal.
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.read().order.len()
    }

    /// Stops every running node.
    ///
    /// All nodes are attempted; the first failure is returned.
    pub fn shutdown(&self) -> Result<(), EnvError> {
        let nodes = self.nodes.read().order.clone();

        let mut first_err = None;
        for node in nodes.iter().filter(|n| n.is_up()) {
            if let Err(e) = node.stop() {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<C: NetsimContext> SimulatedNetwork for SimNetwork<C> {
    type Node = Node;

    fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.read().order.clone()
    }

    fn node(&self, id: NodeId) -> Option<Arc<Node>> {
        let table = self.nodes.read();
        table.index.get(&id).map(|&i| Arc::clone(&table.order[i]))
    }

    fn random_node_config(&self) -> NodeConfig {
        let extension = self.next_key.fetch_add(1, Ordering::Relaxed);
        NodeConfig::from_signing_key(self.context.derive_signing_key(extension))
    }

    fn new_node_with_config(&self, config: NodeConfig) -> Result<Arc<Node>, EnvError> {
        let mut table = self.nodes.write();
        if table.index.contains_key(&config.id) {
            return Err(EnvError::NodeExists(config.id));
        }

        let adapter = self.factory.create(&config)?;
        let node = Arc::new(Node {
            config,
            state: Mutex::new(NodeState::Down),
            adapter,
            events: Arc::clone(&self.events),
        });

        let id = node.id();
        let position = table.order.len();
        table.order.push(Arc::clone(&node));
        table.index.insert(id, position);
        self.events.lock().push(SimEvent::NodeCreated(id));
        drop(table);

        debug!("node {} created ({})", id, node.config.name);
        Ok(node)
    }

    fn start(&self, id: NodeId) -> Result<(), EnvError> {
        let node = self.node(id).ok_or(EnvError::NodeNotFound(id))?;
        node.start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use netsim_env::Service;

    fn network() -> SimNetwork<SimContext> {
        SimNetwork::with_sim_adapter(SimContext::shared(42), SimAdapter::new().with_idle_service("bzz"))
    }

    #[test]
    fn test_create_start_stop() {
        let net = network();
        let node = net.new_node_with_config(net.random_node_config()).unwrap();
        let id = node.id();

        assert!(!node.is_up());
        net.start(id).unwrap();
        assert!(node.is_up());

        node.stop().unwrap();
        assert!(!node.is_up());

        assert_eq!(
            net.events(),
            vec![
                SimEvent::NodeCreated(id),
                SimEvent::NodeStarted(id),
                SimEvent::NodeStopped(id),
            ]
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let net = network();
        let config = net.random_node_config();
        net.new_node_with_config(config.clone()).unwrap();

        let err = net.new_node_with_config(config).unwrap_err();
        assert!(matches!(err, EnvError::NodeExists(_)));
        assert_eq!(net.node_count(), 1);
    }

    #[test]
    fn test_lifecycle_errors() {
        let net = network();
        let node = net.new_node_with_config(net.random_node_config()).unwrap();

        assert!(matches!(node.stop(), Err(EnvError::NodeNotUp(_))));
        net.start(node.id()).unwrap();
        assert!(matches!(net.start(node.id()), Err(EnvError::NodeAlreadyUp(_))));

        let unknown = NodeId::from_seed(99);
        assert!(matches!(net.start(unknown), Err(EnvError::NodeNotFound(id)) if id == unknown));
        assert!(net.node(unknown).is_none());
    }

    #[test]
    fn test_insertion_order_and_lookup() {
        let net = network();
        let ids: Vec<_> = (0..5)
            .map(|_| net.new_node_with_config(net.random_node_config()).unwrap().id())
            .collect();

        let listed: Vec<_> = net.nodes().iter().map(|n| n.id()).collect();
        assert_eq!(listed, ids);
        for id in ids {
            assert_eq!(net.node(id).map(|n| n.id()), Some(id));
        }
    }

    #[test]
    fn test_same_seed_same_configs() {
        let a = network();
        let b = network();

        for _ in 0..3 {
            assert_eq!(a.random_node_config().id, b.random_node_config().id);
        }
    }

    #[test]
    fn test_shutdown_stops_up_nodes() {
        let net = network();
        for _ in 0..3 {
            let node = net.new_node_with_config(net.random_node_config()).unwrap();
            net.start(node.id()).unwrap();
        }
        let idle = net.new_node_with_config(net.random_node_config()).unwrap();

        net.shutdown().unwrap();
        assert!(net.nodes().iter().all(|n| !n.is_up()));
        assert!(!idle.is_up());
    }

    struct InspectingService {
        network: Arc<Mutex<Option<Arc<SimNetwork<SimContext>>>>>,
        seen: Arc<Mutex<Vec<(bool, usize)>>>,
    }

    impl Service for InspectingService {
        fn start(&mut self, node: NodeId) -> Result<(), EnvError> {
            if let Some(net) = self.network.lock().clone() {
                let is_up = net.node(node).map(|n| n.is_up()).unwrap_or(true);
                let up_count = net.nodes().iter().filter(|n| n.is_up()).count();
                self.seen.lock().push((is_up, up_count));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), EnvError> {
            if let Some(net) = self.network.lock().clone() {
                let up_count = net.nodes().iter().filter(|n| n.is_up()).count();
                self.seen.lock().push((false, up_count));
            }
            Ok(())
        }
    }

    #[test]
    fn test_services_can_query_network_during_lifecycle() {
        let slot: Arc<Mutex<Option<Arc<SimNetwork<SimContext>>>>> = Arc::new(Mutex::new(None));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let adapter = {
            let slot = Arc::clone(&slot);
            let seen = Arc::clone(&seen);
            SimAdapter::new().with_service("inspect", move |_| {
                Ok(Box::new(InspectingService {
                    network: Arc::clone(&slot),
                    seen: Arc::clone(&seen),
                }) as Box<dyn Service>)
            })
        };
        let net = Arc::new(SimNetwork::with_sim_adapter(SimContext::shared(5), adapter));
        *slot.lock() = Some(Arc::clone(&net));

        let mut config = net.random_node_config();
        config.services = vec!["inspect".to_string()];
        let node = net.new_node_with_config(config).unwrap();

        net.start(node.id()).unwrap();
        assert!(node.is_up());
        node.stop().unwrap();
        assert!(!node.is_up());

        // While starting the node is not yet up; while stopping it no longer is
        assert_eq!(*seen.lock(), vec![(false, 0), (false, 0)]);
        slot.lock().take();
    }

    #[test]
    fn test_restart_after_stop() {
        let net = network();
        let mut config = net.random_node_config();
        config.services = vec!["bzz".to_string()];
        let node = net.new_node_with_config(config).unwrap();

        net.start(node.id()).unwrap();
        node.stop().unwrap();

        net.start(node.id()).unwrap();
        assert!(node.is_up());
    }
}
