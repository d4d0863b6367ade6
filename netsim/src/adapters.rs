//! In-process node implementation.
//!
//! A [`SimAdapter`] knows how to construct each named service; the
//! [`SimNode`]s it builds run those services directly in this process.

use netsim_env::{EnvError, NodeAdapter, NodeConfig, NodeId, Service};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds a fresh service instance for a node.
pub type ServiceConstructor =
    Arc<dyn Fn(&NodeConfig) -> Result<Box<dyn Service>, EnvError> + Send + Sync>;

/// Creates [`SimNode`]s that run their services in-process.
#[derive(Clone, Default)]
pub struct SimAdapter {
    /// Service constructors by name
    services: HashMap<String, ServiceConstructor>,
}

impl SimAdapter {
    /// Creates an adapter with no services.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service constructor under `name`.
    pub fn with_service<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&NodeConfig) -> Result<Box<dyn Service>, EnvError> + Send + Sync + 'static,
    {
        self.services.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Registers a service that does nothing but track whether it runs.
    pub fn with_idle_service(self, name: impl Into<String>) -> Self {
        self.with_service(name, |_| Ok(Box::new(IdleService::default())))
    }

    /// Returns the registered service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.services.keys().cloned().collect();
        names.sort();
        names
    }

    /// Builds a node for `config`.
    ///
    /// Fails with `ServiceNotFound` if the configuration names a service
    /// this adapter cannot construct.
    pub fn new_node(&self, config: &NodeConfig) -> Result<SimNode, EnvError> {
        let mut constructors = HashMap::new();
        for name in &config.services {
            let constructor = self
                .services
                .get(name)
                .ok_or_else(|| EnvError::ServiceNotFound(name.clone()))?;
            constructors.insert(name.clone(), Arc::clone(constructor));
        }

        Ok(SimNode {
            config: config.clone(),
            constructors,
            running: Mutex::new(None),
        })
    }
}

impl std::fmt::Debug for SimAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimAdapter")
            .field("services", &self.service_names())
            .finish()
    }
}

/// A node whose services run in the current process.
pub struct SimNode {
    /// Creation-time configuration
    config: NodeConfig,

    /// Constructors for the services listed in `config`
    constructors: HashMap<String, ServiceConstructor>,

    /// Running services in start order, `None` while stopped
    running: Mutex<Option<Vec<(String, Box<dyn Service>)>>>,
}

impl SimNode {
    /// Returns the node identifier.
    pub fn id(&self) -> NodeId {
        self.config.id
    }

    /// Returns the node name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the creation-time configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Returns true if message events are enabled for this node.
    pub fn msg_events_enabled(&self) -> bool {
        self.config.enable_msg_events
    }

    /// Returns the names of the running services, in start order.
    pub fn running_services(&self) -> Vec<String> {
        self.running
            .lock()
            .iter()
            .flatten()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl NodeAdapter for SimNode {
    fn kind(&self) -> &'static str {
        "sim"
    }

    fn start(&self, services: &[String]) -> Result<(), EnvError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(EnvError::NodeAlreadyUp(self.id()));
        }

        let mut started: Vec<(String, Box<dyn Service>)> = Vec::with_capacity(services.len());
        for name in services {
            let result = self
                .constructors
                .get(name)
                .ok_or_else(|| EnvError::ServiceNotFound(name.clone()))
                .and_then(|constructor| constructor(&self.config))
                .and_then(|mut service| service.start(self.id()).map(|()| service));

            match result {
                Ok(service) => started.push((name.clone(), service)),
                Err(e) => {
                    // Roll back in reverse start order
                    for (started_name, service) in started.iter_mut().rev() {
                        if let Err(stop_err) = service.stop() {
                            warn!("rollback of {} on {} failed: {}", started_name, self.id(), stop_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        debug!("sim node {} started services {:?}", self.id(), services);
        *running = Some(started);
        Ok(())
    }

    fn stop(&self) -> Result<(), EnvError> {
        let services = self.running.lock().take().unwrap_or_default();

        let mut first_err = None;
        for (name, mut service) in services.into_iter().rev() {
            if let Err(e) = service.stop() {
                warn!("service {} on {} failed to stop: {}", name, self.id(), e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A service with no behaviour of its own.
#[derive(Debug, Default)]
pub struct IdleService {
    running: bool,
}

impl Service for IdleService {
    fn start(&mut self, node: NodeId) -> Result<(), EnvError> {
        if self.running {
            return Err(EnvError::service("idle", format!("already running on {}", node)));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EnvError> {
        self.running = false;
        Ok(())
    }
}
