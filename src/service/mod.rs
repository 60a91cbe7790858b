// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Service Layer
//!
//! Stateless services that validate and apply topology changes against the
//! external collaborators in [`crate::store`].
//!
//! # Architecture
//!
//! ```text
//! Caller (RequestContext)
//!     ↓
//! ConnectionService / MirrorService / TopologyCorrelator
//!     ↓
//! Class checks (ObjectStore::is_subclass_of)
//!     ↓
//! Guarded edge writes (RelationshipStore)
//!     ↓
//! Activity log (AuditSink)
//! ```
//!
//! Every check runs before the first mutation. The only compensation is the
//! deletion of a connection created by `create_connection` when wiring it
//! fails.
//!
//! # Example
//!
//! ```rust
//! use inventory_topology::audit::RequestContext;
//! use inventory_topology::config::TopologyConfig;
//! use inventory_topology::domain::ObjectRef;
//! use inventory_topology::service::{Backends, TopologyServices};
//! use inventory_topology::store::InventoryBuilder;
//!
//! # tokio_test::block_on(async {
//! let inventory = InventoryBuilder::with_standard_classes()
//!     .object("Router", "r1", "core-1", None)
//!     .object("OpticalPort", "p1", "xe-0/0/1", Some("r1"))
//!     .object("OpticalPort", "p2", "xe-0/0/2", Some("r1"))
//!     .build()
//!     .unwrap();
//!
//! let config = TopologyConfig::default();
//! let services = TopologyServices::new(
//!     Backends::in_memory(inventory, config.classes.clone()),
//!     config,
//! );
//!
//! let ctx = RequestContext::new("admin");
//! services
//!     .mirrors
//!     .connect_mirror(
//!         &ctx,
//!         &ObjectRef::new("OpticalPort", "p1"),
//!         &ObjectRef::new("OpticalPort", "p2"),
//!     )
//!     .await
//!     .unwrap();
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

use crate::audit::{ActivityLogEntry, ActivityType, AuditSink, RequestContext, TracingAuditSink};
use crate::config::{ClassCatalog, TopologyConfig};
use crate::domain::{ObjectLight, ObjectRef};
use crate::errors::{TopologyError, TopologyResult};
use crate::store::{
    BusinessRuleValidator, ClassPairingRuleValidator, ImpactAnalysis, InMemoryImpactAnalysis,
    InMemoryInventory, ObjectStore, PathFinder, RelationshipStore,
};

pub mod connections;
pub mod correlation;
pub mod mirrors;

pub use connections::{
    ConnectionFamily, ConnectionService, CreateConnectionRequest, EndpointMap, SideWiring,
};
pub use correlation::{ContinuityMap, TopologyCorrelator};
pub use mirrors::MirrorService;

/// The collaborators every topology service talks to
#[derive(Clone)]
pub struct Backends {
    pub objects: Arc<dyn ObjectStore>,
    pub relationships: Arc<dyn RelationshipStore>,
    pub rules: Arc<dyn BusinessRuleValidator>,
    pub paths: Arc<dyn PathFinder>,
    pub impact: Arc<dyn ImpactAnalysis>,
    pub audit: Arc<dyn AuditSink>,
}

impl Backends {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        relationships: Arc<dyn RelationshipStore>,
        rules: Arc<dyn BusinessRuleValidator>,
        paths: Arc<dyn PathFinder>,
        impact: Arc<dyn ImpactAnalysis>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            objects,
            relationships,
            rules,
            paths,
            impact,
            audit,
        }
    }

    /// All collaborators served by one in-memory inventory
    ///
    /// No business rules are configured and the activity log goes to
    /// `tracing`.
    pub fn in_memory(inventory: InMemoryInventory, classes: ClassCatalog) -> Self {
        let shared = Arc::new(inventory.clone());
        Self {
            objects: shared.clone(),
            relationships: shared.clone(),
            rules: Arc::new(ClassPairingRuleValidator::new()),
            paths: shared,
            impact: Arc::new(InMemoryImpactAnalysis::new(inventory, classes)),
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_objects(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = objects;
        self
    }

    pub fn with_rules(mut self, rules: Arc<dyn BusinessRuleValidator>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }
}

/// The three topology services over one set of backends
#[derive(Clone)]
pub struct TopologyServices {
    pub connections: ConnectionService,
    pub mirrors: MirrorService,
    pub correlator: TopologyCorrelator,
}

impl TopologyServices {
    pub fn new(backends: Backends, config: TopologyConfig) -> Self {
        let core = ServiceCore::new(backends, config);
        Self {
            connections: ConnectionService::from_core(core.clone()),
            mirrors: MirrorService::from_core(core.clone()),
            correlator: TopologyCorrelator::from_core(core),
        }
    }
}

/// Backends plus configuration, shared by the services
#[derive(Clone)]
pub(crate) struct ServiceCore {
    pub(crate) backends: Backends,
    pub(crate) config: Arc<TopologyConfig>,
}

impl ServiceCore {
    pub(crate) fn new(backends: Backends, config: TopologyConfig) -> Self {
        Self {
            backends,
            config: Arc::new(config),
        }
    }

    pub(crate) fn classes(&self) -> &ClassCatalog {
        &self.config.classes
    }

    /// Whether `class_name` belongs to the `category` class
    pub(crate) async fn is_a(&self, category: &str, class_name: &str) -> TopologyResult<bool> {
        Ok(self.backends.objects.is_subclass_of(category, class_name).await?)
    }

    pub(crate) async fn is_port(&self, object: &ObjectRef) -> TopologyResult<bool> {
        self.is_a(&self.classes().port, &object.class_name).await
    }

    pub(crate) async fn require_port(&self, object: &ObjectRef) -> TopologyResult<()> {
        if self.is_port(object).await? {
            Ok(())
        } else {
            Err(TopologyError::NotAPort(object.clone()))
        }
    }

    /// Fail with `NotAConnection` unless `object` belongs to `family`
    pub(crate) async fn require_family(
        &self,
        object: &ObjectRef,
        family: &str,
    ) -> TopologyResult<()> {
        if self.is_a(family, &object.class_name).await? {
            Ok(())
        } else {
            Err(TopologyError::NotAConnection {
                class_name: object.class_name.clone(),
                family: family.to_string(),
            })
        }
    }

    /// `root` followed by every object below it, breadth first
    pub(crate) async fn subtree(&self, root: &ObjectRef) -> TopologyResult<Vec<ObjectLight>> {
        let mut found = vec![self.backends.objects.get_object_light(root).await?];
        let mut queue: VecDeque<ObjectRef> = VecDeque::from([root.clone()]);
        while let Some(current) = queue.pop_front() {
            for child in self.backends.objects.get_children(&current).await? {
                queue.push_back(child.object_ref());
                found.push(child);
            }
        }
        Ok(found)
    }

    /// Closest containment ancestor of `object` in the `category` class
    pub(crate) async fn nearest_ancestor(
        &self,
        object: &ObjectRef,
        category: &str,
    ) -> TopologyResult<Option<ObjectLight>> {
        let mut current = self.backends.objects.get_parent(object).await?;
        while let Some(parent) = current {
            if self.is_a(category, &parent.class_name).await? {
                return Ok(Some(parent));
            }
            current = self.backends.objects.get_parent(&parent.object_ref()).await?;
        }
        Ok(None)
    }

    /// New activity entry; falls back to the configured user
    pub(crate) fn entry(&self, ctx: &RequestContext, activity: ActivityType) -> ActivityLogEntry {
        let mut entry = ActivityLogEntry::new(ctx, activity);
        if entry.user.trim().is_empty() {
            entry.user = self.config.default_audit_user.clone();
        }
        entry
    }

    /// Record an entry; a failing sink never fails the operation
    pub(crate) async fn record(&self, entry: ActivityLogEntry) {
        let activity = entry.activity;
        if let Err(e) = self.backends.audit.record(entry).await {
            warn!(activity = activity.as_str(), error = %e, "Failed to record activity");
        }
    }
}

/// Comma separated ids, as recorded in activity entries
pub(crate) fn joined_ids(objects: &[ObjectLight]) -> String {
    objects
        .iter()
        .map(|object| object.id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::store::InventoryBuilder;
    use pretty_assertions::assert_eq;

    fn core(audit: Arc<MemoryAuditSink>) -> ServiceCore {
        let inventory = InventoryBuilder::with_standard_classes()
            .object("CorporateCustomer", "c1", "ACME", None)
            .object("MPLSService", "s1", "VPN-1", Some("c1"))
            .object("Router", "r1", "core-1", None)
            .object("Slot", "sl1", "0", Some("r1"))
            .object("OpticalPort", "p1", "xe-1", Some("sl1"))
            .build()
            .unwrap();
        let config = TopologyConfig::default();
        ServiceCore::new(
            Backends::in_memory(inventory, config.classes.clone()).with_audit(audit),
            config,
        )
    }

    #[tokio::test]
    async fn test_subtree_is_breadth_first() {
        let core = core(Arc::new(MemoryAuditSink::new()));
        let ids: Vec<String> = core
            .subtree(&ObjectRef::new("Router", "r1"))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id.to_string())
            .collect();
        assert_eq!(ids, vec!["r1", "sl1", "p1"]);
    }

    #[tokio::test]
    async fn test_nearest_customer() {
        let core = core(Arc::new(MemoryAuditSink::new()));
        let customer = core
            .nearest_ancestor(&ObjectRef::new("MPLSService", "s1"), "GenericCustomer")
            .await
            .unwrap();
        assert_eq!(customer.map(|c| c.name), Some("ACME".to_string()));

        let none = core
            .nearest_ancestor(&ObjectRef::new("OpticalPort", "p1"), "GenericCustomer")
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_family_check() {
        let core = core(Arc::new(MemoryAuditSink::new()));
        let err = core
            .require_family(&ObjectRef::new("OpticalPort", "p1"), "GenericPhysicalConnection")
            .await
            .unwrap_err();
        assert!(matches!(err, TopologyError::NotAConnection { .. }));
    }

    #[tokio::test]
    async fn test_blank_user_falls_back_to_configured_user() {
        let audit = Arc::new(MemoryAuditSink::new());
        let core = core(audit.clone());
        let entry = core.entry(&RequestContext::new(""), ActivityType::CreateRelationship);
        core.record(entry).await;

        let entries = audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user, "system");
    }
}
