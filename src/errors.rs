// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology operations
//!
//! Two layers, mirroring the store/service split:
//!
//! - [`StoreError`]: raised by external collaborators (object store,
//!   relationship store, validators, path-finder)
//! - [`TopologyError`]: raised by the topology services; store failures are
//!   carried through unchanged as [`TopologyError::StoreFailure`]

use thiserror::Error;

use crate::domain::{ObjectRef, RelationshipError, RelationshipName, ResourceError};

/// Errors raised by external collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Object does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectRef),

    /// No single child with the given name
    #[error("No child named {name:?} under {parent}")]
    ChildNotFound { parent: ObjectRef, name: String },

    /// Class is not part of the class hierarchy
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    /// A guarded edge write found the relationship already present
    #[error("{object} already holds a {name} relationship")]
    Conflict {
        object: ObjectRef,
        name: RelationshipName,
    },

    /// Operation rejected by the store
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend (database, network) error
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for collaborator calls
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(feature = "neo4j")]
impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Errors raised by topology operations
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Lookup by name found nothing
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Lookup by name found more than one candidate
    #[error("More than one resource matches {0}")]
    AmbiguousResource(String),

    /// Object is not a subclass of the generic port class
    #[error("{0} is not a port")]
    NotAPort(ObjectRef),

    /// Class is not part of the expected connection family
    #[error("Class {class_name} is not a subclass of {family}")]
    NotAConnection { class_name: String, family: String },

    /// Endpoint uniqueness violated
    #[error("{object} already holds a {relationship} relationship")]
    EndpointAlreadyConnected {
        object: ObjectRef,
        relationship: RelationshipName,
    },

    /// Endpoints share no parent below the navigation root
    #[error("{a} and {b} have no common parent")]
    NoCommonAncestor { a: ObjectRef, b: ObjectRef },

    /// Mirror cardinality violated
    #[error("{object} already holds a {relationship} relationship")]
    AlreadyMirrored {
        object: ObjectRef,
        relationship: RelationshipName,
    },

    /// Nothing to release
    #[error("{object} has no {relationship} relationship")]
    NoMirrorFound {
        object: ObjectRef,
        relationship: RelationshipName,
    },

    /// Attribute-based relationship rule rejected the pairing
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    #[error("Invalid resource type: {0}")]
    InvalidResourceType(i32),

    #[error("Invalid side to disconnect: {0}")]
    InvalidSide(i32),

    #[error("Invalid resource descriptor: {0:?}")]
    InvalidDescriptor(String),

    #[error("The name of a connection can not be empty")]
    EmptyName,

    #[error("{0} can not be connected to itself")]
    SelfConnection(ObjectRef),

    /// Underlying store call failed
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),

    /// The operation failed and so did the compensating delete
    #[error("{cause} (rolling back {connection} also failed: {rollback})")]
    RollbackFailed {
        connection: ObjectRef,
        cause: Box<TopologyError>,
        rollback: StoreError,
    },
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<ResourceError> for TopologyError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::InvalidResourceType(value) => TopologyError::InvalidResourceType(value),
            ResourceError::InvalidDescriptor(descriptor) => {
                TopologyError::InvalidDescriptor(descriptor)
            }
        }
    }
}

impl From<RelationshipError> for TopologyError {
    fn from(err: RelationshipError) -> Self {
        match err {
            RelationshipError::InvalidSide(value) => TopologyError::InvalidSide(value),
            RelationshipError::UnknownName(name) => {
                TopologyError::StoreFailure(StoreError::NotPermitted(format!(
                    "unknown relationship {name}"
                )))
            }
        }
    }
}
