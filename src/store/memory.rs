// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Reference Backends
//!
//! A complete, lock-protected implementation of every collaborator
//! contract, used by the test suite and by hosts that embed the topology
//! core without a database.
//!
//! - [`InMemoryInventory`]: [`ObjectStore`], [`RelationshipStore`] and
//!   [`PathFinder`] over one shared state
//! - [`InMemoryImpactAnalysis`]: ports → connections → `uses` services,
//!   grouped by customer
//! - [`ClassPairingRuleValidator`]: rejects configured connection/endpoint
//!   class pairings
//!
//! Build an inventory with [`InventoryBuilder`]:
//!
//! ```rust
//! use inventory_topology::domain::RelationshipName;
//! use inventory_topology::store::InventoryBuilder;
//!
//! let inventory = InventoryBuilder::with_standard_classes()
//!     .object("Router", "r1", "core-1", None)
//!     .object("OpticalPort", "p1", "xe-0/0/1", Some("r1"))
//!     .object("OpticalPort", "p2", "xe-0/0/2", Some("r1"))
//!     .edge("p1", "p2", RelationshipName::Mirror)
//!     .build()
//!     .unwrap();
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    BusinessRuleValidator, EdgeWrite, ImpactAnalysis, NewObject, ObjectStore, PathFinder,
    RelationshipStore, RuleVerdict,
};
use crate::config::ClassCatalog;
use crate::domain::{
    group_by_customer, AssetCorrelation, ObjectId, ObjectLight, ObjectRef, RelationshipName,
};
use crate::errors::{StoreError, StoreResult};

/// Id of the navigation root object
pub const ROOT_ID: &str = "dummy-root";

/// Class (and name) of the navigation root object
pub const ROOT_CLASS: &str = "DummyRoot";

#[derive(Debug, Clone)]
struct StoredObject {
    class_name: String,
    name: String,
    parent: Option<ObjectId>,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edge {
    source: ObjectId,
    target: ObjectId,
    name: RelationshipName,
}

impl Edge {
    fn touches(&self, id: &ObjectId) -> bool {
        &self.source == id || &self.target == id
    }

    fn other_end(&self, id: &ObjectId) -> &ObjectId {
        if &self.source == id {
            &self.target
        } else {
            &self.source
        }
    }
}

#[derive(Debug, Clone)]
struct InventoryState {
    /// class → superclass
    classes: HashMap<String, Option<String>>,
    objects: HashMap<ObjectId, StoredObject>,
    edges: Vec<Edge>,
}

impl InventoryState {
    fn new() -> Self {
        let mut classes = HashMap::new();
        classes.insert(ROOT_CLASS.to_string(), None);

        let mut objects = HashMap::new();
        objects.insert(
            ObjectId::new(ROOT_ID),
            StoredObject {
                class_name: ROOT_CLASS.to_string(),
                name: ROOT_CLASS.to_string(),
                parent: None,
                attributes: BTreeMap::new(),
            },
        );

        Self {
            classes,
            objects,
            edges: Vec::new(),
        }
    }

    fn stored(&self, object: &ObjectRef) -> StoreResult<&StoredObject> {
        self.objects
            .get(&object.id)
            .filter(|stored| stored.class_name == object.class_name)
            .ok_or_else(|| StoreError::ObjectNotFound(object.clone()))
    }

    fn light(&self, id: &ObjectId) -> ObjectLight {
        match self.objects.get(id) {
            Some(stored) => ObjectLight::new(stored.class_name.clone(), id.clone(), stored.name.clone()),
            None => ObjectLight::new(String::new(), id.clone(), String::new()),
        }
    }

    fn is_subclass_of(&self, parent_class: &str, class_name: &str) -> StoreResult<bool> {
        let mut current = Some(class_name.to_string());
        let mut hops = 0;
        while let Some(class) = current {
            if class == parent_class {
                return Ok(true);
            }
            current = self
                .classes
                .get(&class)
                .ok_or_else(|| StoreError::ClassNotFound(class.clone()))?
                .clone();
            hops += 1;
            if hops > self.classes.len() {
                return Err(StoreError::NotPermitted(format!(
                    "class hierarchy of {class_name} is cyclic"
                )));
            }
        }
        Ok(false)
    }

    /// Strict ancestors, nearest first
    fn ancestors(&self, id: &ObjectId) -> Vec<ObjectId> {
        let mut ancestors = Vec::new();
        let mut current = self.objects.get(id).and_then(|stored| stored.parent.clone());
        while let Some(parent) = current {
            current = self.objects.get(&parent).and_then(|stored| stored.parent.clone());
            ancestors.push(parent);
        }
        ancestors
    }

    fn children(&self, id: &ObjectId) -> Vec<ObjectLight> {
        let mut children: Vec<ObjectLight> = self
            .objects
            .iter()
            .filter(|(_, stored)| stored.parent.as_ref() == Some(id))
            .map(|(child, _)| self.light(child))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        children
    }

    /// Breadth-first descendants, excluding `id` itself
    fn descendants(&self, id: &ObjectId) -> Vec<ObjectLight> {
        let mut found = Vec::new();
        let mut queue: VecDeque<ObjectId> = VecDeque::from([id.clone()]);
        while let Some(current) = queue.pop_front() {
            for child in self.children(&current) {
                queue.push_back(child.id.clone());
                found.push(child);
            }
        }
        found
    }

    fn edge_count(&self, id: &ObjectId, name: RelationshipName) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.name == name && edge.touches(id))
            .count()
    }

    fn targets(&self, id: &ObjectId, name: RelationshipName) -> Vec<ObjectLight> {
        self.edges
            .iter()
            .filter(|edge| edge.name == name && edge.touches(id))
            .map(|edge| self.light(edge.other_end(id)))
            .collect()
    }

    fn neighbours(&self, id: &ObjectId, names: &[RelationshipName]) -> Vec<ObjectId> {
        self.edges
            .iter()
            .filter(|edge| names.contains(&edge.name) && edge.touches(id))
            .map(|edge| edge.other_end(id).clone())
            .collect()
    }

    fn nearest_ancestor_of_class(&self, id: &ObjectId, class_name: &str) -> Option<ObjectLight> {
        self.ancestors(id).into_iter().find_map(|ancestor| {
            let light = self.light(&ancestor);
            match self.is_subclass_of(class_name, &light.class_name) {
                Ok(true) => Some(light),
                _ => None,
            }
        })
    }

    /// Extend `path` depth-first, keeping the longest simple walk in `best`
    fn longest_walk(
        &self,
        path: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
        best: &mut Vec<ObjectId>,
    ) {
        if path.len() > best.len() {
            *best = path.clone();
        }
        let Some(last) = path.last().cloned() else {
            return;
        };
        for next in self.neighbours(&last, &RelationshipName::PHYSICAL_PATH) {
            if visited.insert(next.clone()) {
                path.push(next.clone());
                self.longest_walk(path, visited, best);
                path.pop();
                visited.remove(&next);
            }
        }
    }
}

/// Builds an [`InMemoryInventory`] from classes, objects and edges
///
/// Objects without a parent are placed under the navigation root.
#[derive(Debug, Clone)]
pub struct InventoryBuilder {
    state: InventoryState,
    pending_parents: Vec<(ObjectId, Option<ObjectId>)>,
    pending_edges: Vec<Edge>,
}

impl Default for InventoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryBuilder {
    /// Empty inventory holding only the navigation root
    pub fn new() -> Self {
        Self {
            state: InventoryState::new(),
            pending_parents: Vec::new(),
            pending_edges: Vec::new(),
        }
    }

    /// Inventory pre-loaded with the generic class hierarchy
    pub fn with_standard_classes() -> Self {
        const HIERARCHY: &[(&str, Option<&str>)] = &[
            ("InventoryObject", None),
            ("GenericLocation", Some("InventoryObject")),
            ("City", Some("GenericLocation")),
            ("Building", Some("GenericLocation")),
            ("Room", Some("GenericLocation")),
            ("Rack", Some("GenericLocation")),
            ("GenericCommunicationsElement", Some("InventoryObject")),
            ("Router", Some("GenericCommunicationsElement")),
            ("Switch", Some("GenericCommunicationsElement")),
            ("ODF", Some("GenericCommunicationsElement")),
            ("GenericBoard", Some("InventoryObject")),
            ("Slot", Some("GenericBoard")),
            ("IPBoard", Some("GenericBoard")),
            ("GenericPort", Some("InventoryObject")),
            ("GenericCommunicationsPort", Some("GenericPort")),
            ("OpticalPort", Some("GenericCommunicationsPort")),
            ("ElectricalPort", Some("GenericCommunicationsPort")),
            ("VirtualPort", Some("GenericPort")),
            ("GenericPhysicalConnection", Some("InventoryObject")),
            ("GenericPhysicalLink", Some("GenericPhysicalConnection")),
            ("OpticalLink", Some("GenericPhysicalLink")),
            ("ElectricalLink", Some("GenericPhysicalLink")),
            ("GenericPhysicalContainer", Some("GenericPhysicalConnection")),
            ("WireContainer", Some("GenericPhysicalContainer")),
            ("WirelessContainer", Some("GenericPhysicalContainer")),
            ("GenericLogicalConnection", Some("InventoryObject")),
            ("MPLSLink", Some("GenericLogicalConnection")),
            ("SDHTributaryLink", Some("GenericLogicalConnection")),
            ("GenericCustomer", Some("InventoryObject")),
            ("CorporateCustomer", Some("GenericCustomer")),
            ("HomeCustomer", Some("GenericCustomer")),
            ("GenericService", Some("InventoryObject")),
            ("MPLSService", Some("GenericService")),
            ("InternetService", Some("GenericService")),
            ("VLAN", Some("InventoryObject")),
        ];

        HIERARCHY
            .iter()
            .fold(Self::new(), |builder, (class, parent)| builder.class(class, *parent))
    }

    /// Register a class and its direct superclass
    pub fn class(mut self, class_name: &str, superclass: Option<&str>) -> Self {
        self.state
            .classes
            .insert(class_name.to_string(), superclass.map(str::to_string));
        self
    }

    /// Add an object; `parent` is an object id, `None` for top level
    pub fn object(mut self, class_name: &str, id: &str, name: &str, parent: Option<&str>) -> Self {
        let id = ObjectId::new(id);
        self.state.objects.insert(
            id.clone(),
            StoredObject {
                class_name: class_name.to_string(),
                name: name.to_string(),
                parent: None,
                attributes: BTreeMap::new(),
            },
        );
        self.pending_parents.push((id, parent.map(ObjectId::new)));
        self
    }

    /// Add a directed special relationship between two object ids
    pub fn edge(mut self, source: &str, target: &str, name: RelationshipName) -> Self {
        self.pending_edges.push(Edge {
            source: ObjectId::new(source),
            target: ObjectId::new(target),
            name,
        });
        self
    }

    /// Validate classes, parents and edges, then build the inventory
    pub fn build(mut self) -> StoreResult<InMemoryInventory> {
        for (id, parent) in std::mem::take(&mut self.pending_parents) {
            let parent = parent.unwrap_or_else(|| ObjectId::new(ROOT_ID));
            if !self.state.objects.contains_key(&parent) {
                return Err(StoreError::NotPermitted(format!(
                    "parent {parent} of {id} does not exist"
                )));
            }
            if let Some(stored) = self.state.objects.get_mut(&id) {
                stored.parent = Some(parent);
            }
        }

        for stored in self.state.objects.values() {
            if !self.state.classes.contains_key(&stored.class_name) {
                return Err(StoreError::ClassNotFound(stored.class_name.clone()));
            }
        }

        for edge in std::mem::take(&mut self.pending_edges) {
            for end in [&edge.source, &edge.target] {
                if !self.state.objects.contains_key(end) {
                    return Err(StoreError::NotPermitted(format!(
                        "{} edge references missing object {end}",
                        edge.name
                    )));
                }
            }
            self.state.edges.push(edge);
        }

        Ok(InMemoryInventory {
            state: Arc::new(RwLock::new(self.state)),
        })
    }
}

/// Object store, relationship store and path-finder over shared state
#[derive(Debug, Clone)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventory {
    /// Reference to the navigation root
    pub fn root() -> ObjectRef {
        ObjectRef::new(ROOT_CLASS, ROOT_ID)
    }

    pub async fn contains(&self, object: &ObjectRef) -> bool {
        self.state.read().await.stored(object).is_ok()
    }

    pub async fn object_count(&self) -> usize {
        self.state.read().await.objects.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.edges.len()
    }

    /// Attributes recorded for an object at creation time
    pub async fn attributes(&self, object: &ObjectRef) -> StoreResult<BTreeMap<String, String>> {
        Ok(self.state.read().await.stored(object)?.attributes.clone())
    }
}

#[async_trait]
impl ObjectStore for InMemoryInventory {
    async fn get_object_light(&self, object: &ObjectRef) -> StoreResult<ObjectLight> {
        let state = self.state.read().await;
        state.stored(object)?;
        Ok(state.light(&object.id))
    }

    async fn get_children(&self, object: &ObjectRef) -> StoreResult<Vec<ObjectLight>> {
        let state = self.state.read().await;
        state.stored(object)?;
        Ok(state.children(&object.id))
    }

    async fn get_parent(&self, object: &ObjectRef) -> StoreResult<Option<ObjectLight>> {
        let state = self.state.read().await;
        let stored = state.stored(object)?;
        Ok(stored.parent.as_ref().map(|parent| state.light(parent)))
    }

    async fn get_common_ancestor(
        &self,
        a: &ObjectRef,
        b: &ObjectRef,
    ) -> StoreResult<Option<ObjectLight>> {
        let state = self.state.read().await;
        state.stored(a)?;
        state.stored(b)?;

        let b_ancestors: HashSet<ObjectId> = state.ancestors(&b.id).into_iter().collect();
        Ok(state
            .ancestors(&a.id)
            .into_iter()
            .find(|ancestor| b_ancestors.contains(ancestor))
            .map(|ancestor| state.light(&ancestor)))
    }

    async fn is_subclass_of(&self, parent_class: &str, class_name: &str) -> StoreResult<bool> {
        self.state.read().await.is_subclass_of(parent_class, class_name)
    }

    async fn find_objects_by_name(
        &self,
        class_name: &str,
        name: &str,
    ) -> StoreResult<Vec<ObjectLight>> {
        let state = self.state.read().await;
        if !state.classes.contains_key(class_name) {
            return Err(StoreError::ClassNotFound(class_name.to_string()));
        }

        let mut found = Vec::new();
        for (id, stored) in &state.objects {
            if stored.name == name && state.is_subclass_of(class_name, &stored.class_name)? {
                found.push(state.light(id));
            }
        }
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn create_object(&self, object: NewObject) -> StoreResult<ObjectId> {
        let mut state = self.state.write().await;
        if !state.classes.contains_key(&object.class_name) {
            return Err(StoreError::ClassNotFound(object.class_name.clone()));
        }
        state.stored(&object.parent)?;

        let id = ObjectId::generate();
        if let Some(template) = &object.template_id {
            debug!("Template {} ignored by the in-memory store", template);
        }
        let name = object.name().to_string();
        state.objects.insert(
            id.clone(),
            StoredObject {
                class_name: object.class_name.clone(),
                name,
                parent: Some(object.parent.id.clone()),
                attributes: object.attributes,
            },
        );

        debug!("Created {} {} under {}", object.class_name, id, object.parent);
        Ok(id)
    }

    async fn delete_object(
        &self,
        object: &ObjectRef,
        release_relationships: bool,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.stored(object)?;
        if object.id.as_str() == ROOT_ID {
            return Err(StoreError::NotPermitted(
                "the navigation root can not be deleted".to_string(),
            ));
        }

        let mut doomed: HashSet<ObjectId> = state
            .descendants(&object.id)
            .into_iter()
            .map(|light| light.id)
            .collect();
        doomed.insert(object.id.clone());

        let holds_edges = state
            .edges
            .iter()
            .any(|edge| doomed.contains(&edge.source) || doomed.contains(&edge.target));
        if holds_edges && !release_relationships {
            return Err(StoreError::NotPermitted(format!(
                "{object} still holds relationships"
            )));
        }

        state
            .edges
            .retain(|edge| !doomed.contains(&edge.source) && !doomed.contains(&edge.target));
        state.objects.retain(|id, _| !doomed.contains(id));

        debug!("Deleted {} ({} objects)", object, doomed.len());
        Ok(())
    }
}

#[async_trait]
impl RelationshipStore for InMemoryInventory {
    async fn create_edge(&self, edge: &EdgeWrite) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.stored(&edge.source)?;
        state.stored(&edge.target)?;

        // Guard check and insert happen under the same write lock
        for name in &edge.guard.source_free_of {
            if state.edge_count(&edge.source.id, *name) > 0 {
                return Err(StoreError::Conflict {
                    object: edge.source.clone(),
                    name: *name,
                });
            }
        }
        for name in &edge.guard.target_free_of {
            if state.edge_count(&edge.target.id, *name) > 0 {
                return Err(StoreError::Conflict {
                    object: edge.target.clone(),
                    name: *name,
                });
            }
        }

        state.edges.push(Edge {
            source: edge.source.id.clone(),
            target: edge.target.id.clone(),
            name: edge.name,
        });
        Ok(())
    }

    async fn has_edge(
        &self,
        object: &ObjectRef,
        name: RelationshipName,
        min_count: usize,
    ) -> StoreResult<bool> {
        let state = self.state.read().await;
        state.stored(object)?;
        Ok(state.edge_count(&object.id, name) >= min_count)
    }

    async fn get_targets(
        &self,
        object: &ObjectRef,
        name: RelationshipName,
    ) -> StoreResult<Vec<ObjectLight>> {
        let state = self.state.read().await;
        state.stored(object)?;
        Ok(state.targets(&object.id, name))
    }

    async fn release_edge(
        &self,
        object: &ObjectRef,
        target: &ObjectRef,
        name: RelationshipName,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.stored(object)?;
        state.edges.retain(|edge| {
            !(edge.name == name && edge.touches(&object.id) && edge.touches(&target.id))
        });
        Ok(())
    }

    async fn release_edges(
        &self,
        object: &ObjectRef,
        names: &[RelationshipName],
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.stored(object)?;
        state
            .edges
            .retain(|edge| !(names.contains(&edge.name) && edge.touches(&object.id)));
        Ok(())
    }
}

#[async_trait]
impl PathFinder for InMemoryInventory {
    /// Longest simple walk over endpoint and mirror edges
    async fn physical_path(&self, port: &ObjectRef) -> StoreResult<Vec<ObjectLight>> {
        let state = self.state.read().await;
        state.stored(port)?;

        let mut path = vec![port.id.clone()];
        let mut visited: HashSet<ObjectId> = HashSet::from([port.id.clone()]);
        let mut best = Vec::new();
        state.longest_walk(&mut path, &mut visited, &mut best);

        if best.len() < 2 {
            return Ok(Vec::new());
        }
        Ok(best.iter().map(|id| state.light(id)).collect())
    }
}

/// Impact analysis over an [`InMemoryInventory`]
///
/// A port affects the services that use it directly and the services that
/// use any connection attached to it.
#[derive(Debug, Clone)]
pub struct InMemoryImpactAnalysis {
    inventory: InMemoryInventory,
    classes: ClassCatalog,
}

impl InMemoryImpactAnalysis {
    pub fn new(inventory: InMemoryInventory, classes: ClassCatalog) -> Self {
        Self { inventory, classes }
    }

    async fn correlate_ports(
        &self,
        inventory_objects: Vec<ObjectLight>,
        ports: &[ObjectLight],
    ) -> StoreResult<AssetCorrelation> {
        let state = self.inventory.state.read().await;
        let mut pairs = Vec::new();

        for port in ports {
            let mut resources = vec![port.id.clone()];
            for name in RelationshipName::PHYSICAL_ENDPOINTS {
                resources.extend(state.targets(&port.id, name).into_iter().map(|c| c.id));
            }

            for resource in resources {
                for service in state.targets(&resource, RelationshipName::Uses) {
                    if !state.is_subclass_of(&self.classes.service, &service.class_name)? {
                        continue;
                    }
                    match state.nearest_ancestor_of_class(&service.id, &self.classes.customer) {
                        Some(customer) => pairs.push((customer, service)),
                        None => debug!("Service {} has no customer, skipped", service),
                    }
                }
            }
        }

        Ok(AssetCorrelation::new(inventory_objects, group_by_customer(pairs)))
    }

    async fn ports_below(&self, object: &ObjectLight) -> StoreResult<Vec<ObjectLight>> {
        let state = self.inventory.state.read().await;
        let mut ports = Vec::new();
        for descendant in state.descendants(&object.id) {
            if state.is_subclass_of(&self.classes.port, &descendant.class_name)? {
                ports.push(descendant);
            }
        }
        Ok(ports)
    }
}

#[async_trait]
impl ImpactAnalysis for InMemoryImpactAnalysis {
    async fn services_in_device(&self, device: &ObjectLight) -> StoreResult<AssetCorrelation> {
        let ports = self.ports_below(device).await?;
        self.correlate_ports(vec![device.clone()], &ports).await
    }

    async fn services_in_slot(
        &self,
        device: &ObjectLight,
        slot_name: &str,
    ) -> StoreResult<AssetCorrelation> {
        let mut slots: Vec<ObjectLight> = self
            .inventory
            .get_children(&device.object_ref())
            .await?
            .into_iter()
            .filter(|child| child.name == slot_name)
            .collect();
        if slots.len() != 1 {
            return Err(StoreError::ChildNotFound {
                parent: device.object_ref(),
                name: slot_name.to_string(),
            });
        }
        let slot = slots.remove(0);

        let ports = self.ports_below(&slot).await?;
        self.correlate_ports(vec![slot], &ports).await
    }

    async fn services_in_ports(&self, ports: &[ObjectLight]) -> StoreResult<AssetCorrelation> {
        self.correlate_ports(ports.to_vec(), ports).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ForbiddenPairing {
    connection_class: String,
    endpoint_class: String,
    reason: String,
}

/// Rejects configured connection-class/endpoint-class pairings
///
/// With no pairings configured every relationship is allowed.
#[derive(Debug, Clone, Default)]
pub struct ClassPairingRuleValidator {
    forbidden: Vec<ForbiddenPairing>,
}

impl ClassPairingRuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbid wiring `connection_class` to `endpoint_class`
    pub fn forbid(
        mut self,
        connection_class: impl Into<String>,
        endpoint_class: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.forbidden.push(ForbiddenPairing {
            connection_class: connection_class.into(),
            endpoint_class: endpoint_class.into(),
            reason: reason.into(),
        });
        self
    }
}

#[async_trait]
impl BusinessRuleValidator for ClassPairingRuleValidator {
    async fn check_relationship_rules(
        &self,
        connection: &ObjectRef,
        endpoint: &ObjectRef,
    ) -> StoreResult<RuleVerdict> {
        let verdict = self
            .forbidden
            .iter()
            .find(|rule| {
                rule.connection_class == connection.class_name
                    && rule.endpoint_class == endpoint.class_name
            })
            .map(|rule| RuleVerdict::Rejected(rule.reason.clone()))
            .unwrap_or(RuleVerdict::Allowed);
        Ok(verdict)
    }
}
