// Copyright (c) 2025 - Cowboy AI, Inc.
//! Impact-analysis resource descriptors
//!
//! A resource is addressed by a numeric type and a `;`-separated descriptor:
//!
//! | type | meaning | descriptor |
//! |------|---------|------------|
//! | 1 | hardware | `device`, `device;slot` or `device;slot;port` |
//! | 2 | logical connection | connection name |
//! | 3 | physical connection | connection name |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between descriptor tokens
pub const DESCRIPTOR_SEPARATOR: char = ';';

/// Descriptor parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Invalid resource type: {0} (must be 1, 2 or 3)")]
    InvalidResourceType(i32),

    #[error("Invalid resource descriptor: {0:?}")]
    InvalidDescriptor(String),
}

/// Kind of resource whose impact is being analysed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Hardware,
    LogicalConnection,
    PhysicalConnection,
}

impl TryFrom<i32> for ResourceType {
    type Error = ResourceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ResourceType::Hardware),
            2 => Ok(ResourceType::LogicalConnection),
            3 => Ok(ResourceType::PhysicalConnection),
            other => Err(ResourceError::InvalidResourceType(other)),
        }
    }
}

/// Hardware addressed by name, from coarse to fine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardwareDescriptor {
    Device {
        device: String,
    },
    Slot {
        device: String,
        slot: String,
    },
    Port {
        device: String,
        slot: String,
        port: String,
    },
}

impl HardwareDescriptor {
    pub fn device(&self) -> &str {
        match self {
            HardwareDescriptor::Device { device }
            | HardwareDescriptor::Slot { device, .. }
            | HardwareDescriptor::Port { device, .. } => device,
        }
    }
}

/// A parsed impact-analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceQuery {
    Hardware(HardwareDescriptor),
    LogicalConnection { name: String },
    PhysicalConnection { name: String },
}

impl ResourceQuery {
    /// Parse a resource type discriminant and its descriptor
    ///
    /// Hardware descriptors are split on `;` and must carry one to three
    /// non-blank tokens. Connection descriptors are taken whole, trimmed.
    pub fn parse(resource_type: i32, descriptor: &str) -> Result<Self, ResourceError> {
        let invalid = || ResourceError::InvalidDescriptor(descriptor.to_string());

        match ResourceType::try_from(resource_type)? {
            ResourceType::Hardware => {
                let tokens: Vec<String> = descriptor
                    .split(DESCRIPTOR_SEPARATOR)
                    .map(|token| token.trim().to_string())
                    .collect();

                if tokens.iter().any(|token| token.is_empty()) {
                    return Err(invalid());
                }

                let hardware = match tokens.as_slice() {
                    [device] => HardwareDescriptor::Device {
                        device: device.clone(),
                    },
                    [device, slot] => HardwareDescriptor::Slot {
                        device: device.clone(),
                        slot: slot.clone(),
                    },
                    [device, slot, port] => HardwareDescriptor::Port {
                        device: device.clone(),
                        slot: slot.clone(),
                        port: port.clone(),
                    },
                    _ => return Err(invalid()),
                };
                Ok(ResourceQuery::Hardware(hardware))
            }
            ResourceType::LogicalConnection | ResourceType::PhysicalConnection => {
                let name = descriptor.trim();
                if name.is_empty() {
                    return Err(invalid());
                }
                let name = name.to_string();
                Ok(if resource_type == 2 {
                    ResourceQuery::LogicalConnection { name }
                } else {
                    ResourceQuery::PhysicalConnection { name }
                })
            }
        }
    }
}
