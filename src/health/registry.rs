//! Component registry
//!
//! Static mapping from component name to its kind and connection
//! parameters, fixed for the lifetime of the process. Iteration follows
//! configuration order.

use std::collections::HashSet;

use tracing::info;

use crate::config::{ComponentConfig, ConfigError};

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: Vec<ComponentConfig>,
}

impl ComponentRegistry {
    /// Build from configuration, rejecting duplicate names
    pub fn new(components: Vec<ComponentConfig>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(components.len());
        for component in &components {
            if !seen.insert(component.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate component name: {}",
                    component.name
                )));
            }
            info!(
                component = %component.name,
                kind = component.kind.as_str(),
                addr = %component.addr(),
                "Registered component"
            );
        }
        Ok(Self { components })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentConfig> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
