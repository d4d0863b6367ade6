//! Error types for the node registry.

use netsim_env::{EnvError, NodeId};
use thiserror::Error;

/// Errors returned by [`NodeRegistry`](crate::NodeRegistry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Random selection found no eligible node; the network was not called
    #[error("Node not found")]
    NodeNotFound,

    /// The network rejected the operation (creation, lookup, start, stop)
    #[error(transparent)]
    Network(#[from] EnvError),

    /// The node was created but failed to start
    #[error("Node {id} created but failed to start: {source}")]
    StartFailed {
        id: NodeId,
        #[source]
        source: EnvError,
    },
}

impl RegistryError {
    /// Returns the identifier of a node that exists despite the error.
    pub fn created_node(&self) -> Option<NodeId> {
        match self {
            Self::StartFailed { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Returns the underlying network error, if any.
    pub fn network_error(&self) -> Option<&EnvError> {
        match self {
            Self::Network(e) | Self::StartFailed { source: e, .. } => Some(e),
            Self::NodeNotFound => None,
        }
    }
}
