//! Error types for the netsim collaborator abstraction.

use crate::types::NodeId;
use thiserror::Error;

/// Errors raised by a simulated network or its node implementations.
#[derive(Debug, Error)]
pub enum EnvError {
    /// No node with this identifier is known to the network
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with this identifier already exists
    #[error("Node already exists: {0}")]
    NodeExists(NodeId),

    /// Start requested for a node that is already running
    #[error("Node already up: {0}")]
    NodeAlreadyUp(NodeId),

    /// Stop requested for a node that is not running
    #[error("Node not up: {0}")]
    NodeNotUp(NodeId),

    /// The node adapter has no constructor for this service
    #[error("Unknown node service: {0}")]
    ServiceNotFound(String),

    /// A service failed to start or stop
    #[error("Service {service} failed: {reason}")]
    Service { service: String, reason: String },

    /// The node adapter refused to build or drive a node
    #[error("Adapter error: {0}")]
    Adapter(String),
}

impl EnvError {
    /// Creates a service error.
    pub fn service(service: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Service {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an adapter error.
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter(msg.into())
    }
}
