// Copyright (c) 2025 - Cowboy AI, Inc.
//! Special relationship names and connection sides

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Relationship parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelationshipError {
    #[error("Unknown relationship name: {0}")]
    UnknownName(String),

    #[error("Invalid side to disconnect: {0} (must be 1, 2 or 3)")]
    InvalidSide(i32),
}

/// Named directed edge between two inventory objects
///
/// The wire names are the ones persisted in the relationship store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipName {
    /// Connection → port on the A side
    #[serde(rename = "endpointA")]
    EndpointA,
    /// Connection → port on the B side
    #[serde(rename = "endpointB")]
    EndpointB,
    /// Symmetric 1:1 port pairing
    #[serde(rename = "mirror")]
    Mirror,
    /// 1:N port fan-out
    #[serde(rename = "mirrorMultiple")]
    MirrorMultiple,
    /// Service ↔ resource usage
    #[serde(rename = "uses")]
    Uses,
    /// Port ↔ VLAN membership
    #[serde(rename = "portBelongsToVlan")]
    PortBelongsToVlan,
    /// Logical connection → port on the A side
    #[serde(rename = "mplsEndpointA")]
    LogicalEndpointA,
    /// Logical connection → port on the B side
    #[serde(rename = "mplsEndpointB")]
    LogicalEndpointB,
}

impl RelationshipName {
    pub const ALL: [RelationshipName; 8] = [
        RelationshipName::EndpointA,
        RelationshipName::EndpointB,
        RelationshipName::Mirror,
        RelationshipName::MirrorMultiple,
        RelationshipName::Uses,
        RelationshipName::PortBelongsToVlan,
        RelationshipName::LogicalEndpointA,
        RelationshipName::LogicalEndpointB,
    ];

    /// Both physical endpoint relationships
    pub const PHYSICAL_ENDPOINTS: [RelationshipName; 2] =
        [RelationshipName::EndpointA, RelationshipName::EndpointB];

    /// Relationships a physical path is allowed to traverse
    pub const PHYSICAL_PATH: [RelationshipName; 4] = [
        RelationshipName::EndpointA,
        RelationshipName::EndpointB,
        RelationshipName::Mirror,
        RelationshipName::MirrorMultiple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipName::EndpointA => "endpointA",
            RelationshipName::EndpointB => "endpointB",
            RelationshipName::Mirror => "mirror",
            RelationshipName::MirrorMultiple => "mirrorMultiple",
            RelationshipName::Uses => "uses",
            RelationshipName::PortBelongsToVlan => "portBelongsToVlan",
            RelationshipName::LogicalEndpointA => "mplsEndpointA",
            RelationshipName::LogicalEndpointB => "mplsEndpointB",
        }
    }
}

impl fmt::Display for RelationshipName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipName {
    type Err = RelationshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| RelationshipError::UnknownName(s.to_string()))
    }
}

/// One of the two attachment points of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    A,
    B,
}

impl Endpoint {
    /// Relationship used for this endpoint on a physical connection
    pub fn physical(&self) -> RelationshipName {
        match self {
            Endpoint::A => RelationshipName::EndpointA,
            Endpoint::B => RelationshipName::EndpointB,
        }
    }

    /// Relationship used for this endpoint on a logical connection
    pub fn logical(&self) -> RelationshipName {
        match self {
            Endpoint::A => RelationshipName::LogicalEndpointA,
            Endpoint::B => RelationshipName::LogicalEndpointB,
        }
    }
}

/// Side(s) of a connection to release
///
/// Callers on the service boundary send `1` (A), `2` (B) or `3` (both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionSide {
    A,
    B,
    Both,
}

impl ConnectionSide {
    pub fn endpoints(&self) -> &'static [Endpoint] {
        match self {
            ConnectionSide::A => &[Endpoint::A],
            ConnectionSide::B => &[Endpoint::B],
            ConnectionSide::Both => &[Endpoint::A, Endpoint::B],
        }
    }
}

impl TryFrom<i32> for ConnectionSide {
    type Error = RelationshipError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ConnectionSide::A),
            2 => Ok(ConnectionSide::B),
            3 => Ok(ConnectionSide::Both),
            other => Err(RelationshipError::InvalidSide(other)),
        }
    }
}

impl From<Endpoint> for ConnectionSide {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::A => ConnectionSide::A,
            Endpoint::B => ConnectionSide::B,
        }
    }
}
