// Copyright (c) 2025 - Cowboy AI, Inc.
//! External Collaborators
//!
//! The topology core owns no data. It talks to the surrounding inventory
//! through these narrow contracts:
//!
//! ```text
//!                     ┌──────────────────┐
//!   ConnectionService │  ObjectStore     │ objects, containment, classes
//!   MirrorService  ──▶│  RelationshipStore│ named special edges
//!   TopologyCorrelator│  BusinessRuleValidator
//!                     │  PathFinder      │ physical paths
//!                     │  ImpactAnalysis  │ services per device/slot/port
//!                     └──────────────────┘
//! ```
//!
//! Relationship lookups are direction-agnostic: `has_edge` and
//! `get_targets` see an edge from either end. Creation is directed.
//!
//! # Guarded writes
//!
//! [`RelationshipStore::create_edge`] takes an [`EdgeWrite`] whose
//! [`EdgeGuard`] lists relationship names that must be absent on each end.
//! Implementations check and insert as one step and return
//! [`StoreError::Conflict`](crate::errors::StoreError::Conflict) when the
//! guard fails, so two racing writers can not both attach the same port.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::{AssetCorrelation, ObjectId, ObjectLight, ObjectRef, RelationshipName};
use crate::errors::StoreResult;

pub mod memory;
#[cfg(feature = "neo4j")]
pub mod neo4j;

pub use memory::{
    ClassPairingRuleValidator, InMemoryImpactAnalysis, InMemoryInventory, InventoryBuilder,
};
#[cfg(feature = "neo4j")]
pub use neo4j::{Neo4jConfig, Neo4jRelationshipStore};

/// Attribute name carrying an object's display name
pub const NAME_ATTRIBUTE: &str = "name";

/// Object to be created by the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObject {
    pub class_name: String,
    pub parent: ObjectRef,
    pub attributes: BTreeMap<String, String>,
    pub template_id: Option<String>,
}

impl NewObject {
    pub fn named(class_name: impl Into<String>, parent: ObjectRef, name: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(NAME_ATTRIBUTE.to_string(), name.into());
        Self {
            class_name: class_name.into(),
            parent,
            attributes,
            template_id: None,
        }
    }

    pub fn with_template(mut self, template_id: Option<String>) -> Self {
        self.template_id = template_id.filter(|id| !id.trim().is_empty());
        self
    }

    pub fn name(&self) -> &str {
        self.attributes
            .get(NAME_ATTRIBUTE)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Relationship names that must be absent on each end of a new edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeGuard {
    pub source_free_of: Vec<RelationshipName>,
    pub target_free_of: Vec<RelationshipName>,
}

/// A directed edge to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeWrite {
    pub source: ObjectRef,
    pub target: ObjectRef,
    pub name: RelationshipName,
    pub guard: EdgeGuard,
}

impl EdgeWrite {
    /// Unguarded edge
    pub fn new(source: ObjectRef, target: ObjectRef, name: RelationshipName) -> Self {
        Self {
            source,
            target,
            name,
            guard: EdgeGuard::default(),
        }
    }

    pub fn source_free_of(mut self, names: &[RelationshipName]) -> Self {
        self.guard.source_free_of = names.to_vec();
        self
    }

    pub fn target_free_of(mut self, names: &[RelationshipName]) -> Self {
        self.guard.target_free_of = names.to_vec();
        self
    }
}

/// Inventory object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object_light(&self, object: &ObjectRef) -> StoreResult<ObjectLight>;

    /// Direct children in the containment hierarchy
    async fn get_children(&self, object: &ObjectRef) -> StoreResult<Vec<ObjectLight>>;

    /// Containment parent; `None` for the navigation root itself
    async fn get_parent(&self, object: &ObjectRef) -> StoreResult<Option<ObjectLight>>;

    /// Closest shared strict ancestor of `a` and `b`
    async fn get_common_ancestor(
        &self,
        a: &ObjectRef,
        b: &ObjectRef,
    ) -> StoreResult<Option<ObjectLight>>;

    /// Whether `class_name` equals `parent_class` or descends from it
    async fn is_subclass_of(&self, parent_class: &str, class_name: &str) -> StoreResult<bool>;

    /// Objects of `class_name` (or a subclass) whose name is exactly `name`
    async fn find_objects_by_name(
        &self,
        class_name: &str,
        name: &str,
    ) -> StoreResult<Vec<ObjectLight>>;

    async fn create_object(&self, object: NewObject) -> StoreResult<ObjectId>;

    /// Delete an object and its children; with `release_relationships` the
    /// special edges go too, otherwise an object holding edges is refused
    async fn delete_object(&self, object: &ObjectRef, release_relationships: bool)
        -> StoreResult<()>;
}

/// Special relationship graph store
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn create_edge(&self, edge: &EdgeWrite) -> StoreResult<()>;

    /// Whether `object` holds at least `min_count` edges named `name`
    async fn has_edge(
        &self,
        object: &ObjectRef,
        name: RelationshipName,
        min_count: usize,
    ) -> StoreResult<bool>;

    /// Objects at the other end of `object`'s edges named `name`
    async fn get_targets(
        &self,
        object: &ObjectRef,
        name: RelationshipName,
    ) -> StoreResult<Vec<ObjectLight>>;

    async fn release_edge(
        &self,
        object: &ObjectRef,
        target: &ObjectRef,
        name: RelationshipName,
    ) -> StoreResult<()>;

    async fn release_edges(&self, object: &ObjectRef, names: &[RelationshipName])
        -> StoreResult<()>;
}

/// Verdict of an attribute-based relationship rule check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleVerdict {
    Allowed,
    Rejected(String),
}

/// Attribute-value business rules for relationship legality
#[async_trait]
pub trait BusinessRuleValidator: Send + Sync {
    async fn check_relationship_rules(
        &self,
        connection: &ObjectRef,
        endpoint: &ObjectRef,
    ) -> StoreResult<RuleVerdict>;
}

/// Physical path discovery
#[async_trait]
pub trait PathFinder: Send + Sync {
    /// Ordered objects on the physical path starting at `port`; empty when
    /// the port is not connected to anything
    async fn physical_path(&self, port: &ObjectRef) -> StoreResult<Vec<ObjectLight>>;
}

/// Service impact queries over hardware
#[async_trait]
pub trait ImpactAnalysis: Send + Sync {
    async fn services_in_device(&self, device: &ObjectLight) -> StoreResult<AssetCorrelation>;

    /// Fails with [`ChildNotFound`](crate::errors::StoreError::ChildNotFound)
    /// unless exactly one child of `device` carries `slot_name`
    async fn services_in_slot(
        &self,
        device: &ObjectLight,
        slot_name: &str,
    ) -> StoreResult<AssetCorrelation>;

    async fn services_in_ports(&self, ports: &[ObjectLight]) -> StoreResult<AssetCorrelation>;
}
