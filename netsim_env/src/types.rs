//! Common types for the netsim collaborator abstraction.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a simulated node.
///
/// Assigned once when the node configuration is generated and never
/// changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Creates a deterministic NodeId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Derives the NodeId belonging to a node identity key.
    ///
    /// Uses the first 16 bytes of the compressed public key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&key.as_bytes()[..16]);
        Self(Uuid::from_bytes(bytes))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Configuration consumed once when a node is created.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Identifier, derived from `signing_key`
    pub id: NodeId,

    /// Node identity key
    pub signing_key: SigningKey,

    /// Human readable name
    pub name: String,

    /// Emit message events for this node
    pub enable_msg_events: bool,

    /// Names of the services started on the node
    pub services: Vec<String>,
}

impl NodeConfig {
    /// Builds a configuration around an identity key.
    ///
    /// The name defaults to `node_<id>`; message events are off and no
    /// services are attached.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let id = NodeId::from_verifying_key(&signing_key.verifying_key());
        Self {
            id,
            signing_key,
            name: format!("node_{}", id),
            enable_msg_events: false,
            services: Vec::new(),
        }
    }
}
