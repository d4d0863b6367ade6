//! netsim - Node registry for in-process network simulations
//!
//! This crate provides the control layer test scenarios use to drive a
//! simulated network: create nodes, stop and restart them at random, and
//! single out a pivot node, all from concurrent test threads.
//!
//! # Core Principle: Injected Randomness
//!
//! Every random choice goes through a [`NetsimContext`](netsim_env::NetsimContext):
//! - **Node identities**: keys derived from the network's context
//! - **Selection**: random stop/start picks drawn from the registry's context
//!
//! Fix the seeds and a scenario replays exactly.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  SimWorld                     │
//! │  ┌─────────────────────────────────────────┐  │
//! │  │ NodeRegistry (options, pivot, random)   │  │
//! │  └───────────────┬─────────────────────────┘  │
//! │                  │ SimulatedNetwork           │
//! │  ┌───────────────▼─────────────────────────┐  │
//! │  │ SimNetwork (nodes, lifecycle journal)   │  │
//! │  └───────┬──────────────┬──────────────────┘  │
//! │     ┌────▼────┐    ┌────▼────┐                │
//! │     │ SimNode │    │ SimNode │    ...         │
//! │     └─────────┘    └─────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use netsim::{with_name, SimConfig, SimWorld};
//!
//! let world = SimWorld::new(SimConfig { seed: 42, initial_nodes: 5, ..Default::default() });
//! world.spawn_nodes()?;
//!
//! let registry = world.registry();
//! registry.add_node(&[with_name("alpha")])?;
//! registry.stop_random_nodes(2)?;
//! assert_eq!(registry.up_node_ids().len(), 4);
//! ```

mod adapters;
mod context;
mod error;
mod network;
mod options;
mod registry;
mod world;
pub mod runner;
pub mod scenarios;

pub use adapters::{IdleService, ServiceConstructor, SimAdapter, SimNode};
pub use context::SimContext;
pub use error::RegistryError;
pub use network::{Node, NodeFactory, SimEvent, SimNetwork};
pub use options::{apply_all, with_msg_events, with_name, AddNodeOption};
pub use registry::NodeRegistry;
pub use runner::{ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimRegistry, SimWorld};
