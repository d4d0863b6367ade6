//! netsim Environment Abstraction Layer
//!
//! This crate defines what the node registry needs from the simulated
//! network it drives, without depending on any concrete network:
//! - Nodes (`SimulatedNetwork`, `NodeHandle`)
//! - Node implementations (`NodeAdapter`, `Service`)
//! - Randomness (`NetsimContext`)
//!
//! Deriving all entropy from one context lets a test fix the seed and
//! replay the exact sequence of random node selections.
//!
//! # Example
//!
//! ```ignore
//! use netsim_env::{NodeHandle, SimulatedNetwork};
//!
//! fn up_count<N: SimulatedNetwork>(net: &N) -> usize {
//!     net.nodes().iter().filter(|n| n.is_up()).count()
//! }
//! ```

mod context;
mod error;
mod network;
mod os_impl;
mod types;

pub use context::NetsimContext;
pub use error::EnvError;
pub use network::{NodeAdapter, NodeHandle, Service, SimulatedNetwork};
pub use os_impl::OsContext;
pub use types::{NodeConfig, NodeId};
