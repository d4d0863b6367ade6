//! Options applied to a generated node configuration.

use netsim_env::NodeConfig;
use std::sync::Arc;

/// A transformation of the configuration passed to
/// [`NodeRegistry::add_node`](crate::NodeRegistry::add_node).
///
/// Options run in the order given; when two touch the same field the
/// later one wins.
#[derive(Clone)]
pub struct AddNodeOption(Arc<dyn Fn(&mut NodeConfig) + Send + Sync>);

impl AddNodeOption {
    /// Wraps an arbitrary configuration transformation.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut NodeConfig) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Applies the option to `config`.
    pub fn apply(&self, config: &mut NodeConfig) {
        (self.0)(config)
    }
}

impl std::fmt::Debug for AddNodeOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AddNodeOption")
    }
}

/// Sets the name of the new node.
pub fn with_name(name: impl Into<String>) -> AddNodeOption {
    let name = name.into();
    AddNodeOption::new(move |config| config.name = name.clone())
}

/// Enables or disables message events for the new node.
pub fn with_msg_events(enable: bool) -> AddNodeOption {
    AddNodeOption::new(move |config| config.enable_msg_events = enable)
}

/// Applies `options` to `config` in order.
pub fn apply_all(config: &mut NodeConfig, options: &[AddNodeOption]) {
    for option in options {
        option.apply(config);
    }
}
