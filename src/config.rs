// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology configuration
//!
//! The topology core dispatches on class names (is this class a port, a
//! link, a customer...). Those names live in the inventory's metadata and
//! are configured here rather than hard-coded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::ObjectLight;

/// Class names the topology services resolve categories against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassCatalog {
    pub port: String,
    pub physical_connection: String,
    pub physical_link: String,
    pub physical_container: String,
    pub logical_connection: String,
    pub communications_element: String,
    pub communications_port: String,
    pub service: String,
    pub customer: String,
    pub vlan: String,
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self {
            port: "GenericPort".to_string(),
            physical_connection: "GenericPhysicalConnection".to_string(),
            physical_link: "GenericPhysicalLink".to_string(),
            physical_container: "GenericPhysicalContainer".to_string(),
            logical_connection: "GenericLogicalConnection".to_string(),
            communications_element: "GenericCommunicationsElement".to_string(),
            communications_port: "GenericCommunicationsPort".to_string(),
            service: "GenericService".to_string(),
            customer: "GenericCustomer".to_string(),
            vlan: "VLAN".to_string(),
        }
    }
}

/// Configuration for the topology services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Class names used for category checks
    #[serde(default)]
    pub classes: ClassCatalog,

    /// Name (and class) of the navigation root; never a valid connection parent
    #[serde(default = "default_navigation_root")]
    pub navigation_root: String,

    /// User recorded in audit entries when the caller supplies none
    #[serde(default = "default_audit_user")]
    pub default_audit_user: String,
}

fn default_navigation_root() -> String {
    "DummyRoot".to_string()
}

fn default_audit_user() -> String {
    "system".to_string()
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            classes: ClassCatalog::default(),
            navigation_root: default_navigation_root(),
            default_audit_user: default_audit_user(),
        }
    }
}

impl TopologyConfig {
    /// Load configuration from environment variables
    ///
    /// - `TOPOLOGY_CONFIG`: path to a JSON file with the full configuration
    /// - `TOPOLOGY_NAVIGATION_ROOT`: overrides the navigation root name
    /// - `TOPOLOGY_AUDIT_USER`: overrides the default audit user
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("TOPOLOGY_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(root) = std::env::var("TOPOLOGY_NAVIGATION_ROOT") {
            config.navigation_root = root;
        }
        if let Ok(user) = std::env::var("TOPOLOGY_AUDIT_USER") {
            config.default_audit_user = user;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read topology config {path}"))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid topology config in {path}"))
    }

    /// Whether `object` is the navigation root
    pub fn is_navigation_root(&self, object: &ObjectLight) -> bool {
        object.name == self.navigation_root || object.class_name == self.navigation_root
    }
}
