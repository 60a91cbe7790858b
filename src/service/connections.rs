// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connection Lifecycle
//!
//! Creates, wires, unwires and deletes physical connections (links and
//! containers) between inventory objects.
//!
//! # Endpoint rules
//!
//! - a connection holds at most one `endpointA` and one `endpointB` edge
//! - a port holds at most one endpoint edge, A or B, across all connections
//! - link endpoints must be ports; container endpoints may be any object
//! - a new connection lives under the closest common ancestor of its
//!   endpoints, which may not be the navigation root
//!
//! The checks run before any write, and the edge writes are guarded so a
//! concurrent writer that slipped in between surfaces as
//! [`TopologyError::EndpointAlreadyConnected`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, error, info, warn};

use super::{joined_ids, Backends, ServiceCore};
use crate::audit::{ActivityType, RequestContext};
use crate::config::TopologyConfig;
use crate::domain::{
    BatchOutcome, ConnectionSide, Endpoint, ObjectId, ObjectLight, ObjectRef, RelationshipName,
};
use crate::errors::{StoreError, TopologyError, TopologyResult};
use crate::store::{EdgeWrite, NewObject, RuleVerdict};

/// Ports below an object, each with the connections attached to it
pub type EndpointMap = BTreeMap<ObjectLight, Vec<ObjectLight>>;

/// Request to create a physical connection between two objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConnectionRequest {
    pub connection_class: String,
    pub endpoint_a: ObjectRef,
    pub endpoint_b: ObjectRef,
    pub name: String,
    pub template_id: Option<String>,
}

impl CreateConnectionRequest {
    pub fn new(
        connection_class: impl Into<String>,
        endpoint_a: ObjectRef,
        endpoint_b: ObjectRef,
        name: impl Into<String>,
    ) -> Self {
        Self {
            connection_class: connection_class.into(),
            endpoint_a,
            endpoint_b,
            name: name.into(),
            template_id: None,
        }
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }
}

/// Sides to attach to an existing connection; `None` leaves a side alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideWiring {
    pub side_a: Option<ObjectRef>,
    pub connection: ObjectRef,
    pub side_b: Option<ObjectRef>,
}

impl SideWiring {
    pub fn new(side_a: Option<ObjectRef>, connection: ObjectRef, side_b: Option<ObjectRef>) -> Self {
        Self {
            side_a,
            connection,
            side_b,
        }
    }

    /// Wiring for a single side
    pub fn single(connection: ObjectRef, endpoint: Endpoint, target: ObjectRef) -> Self {
        match endpoint {
            Endpoint::A => Self::new(Some(target), connection, None),
            Endpoint::B => Self::new(None, connection, Some(target)),
        }
    }

    fn sides(&self) -> [(Endpoint, Option<&ObjectRef>); 2] {
        [
            (Endpoint::A, self.side_a.as_ref()),
            (Endpoint::B, self.side_b.as_ref()),
        ]
    }
}

/// Group of physical connection classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionFamily {
    /// Links and containers
    Any,
    Links,
    Containers,
}

impl ConnectionFamily {
    /// Root class of the family
    pub fn class<'a>(&self, config: &'a TopologyConfig) -> &'a str {
        match self {
            ConnectionFamily::Any => &config.classes.physical_connection,
            ConnectionFamily::Links => &config.classes.physical_link,
            ConnectionFamily::Containers => &config.classes.physical_container,
        }
    }
}

/// Edge write attaching `target` to `connection` on `endpoint`
///
/// The connection must not already hold that side; a port target must not
/// hold any endpoint edge.
fn endpoint_write(
    connection: &ObjectRef,
    target: &ObjectRef,
    endpoint: Endpoint,
    target_is_port: bool,
) -> EdgeWrite {
    let name = endpoint.physical();
    let write = EdgeWrite::new(connection.clone(), target.clone(), name).source_free_of(&[name]);
    if target_is_port {
        write.target_free_of(&RelationshipName::PHYSICAL_ENDPOINTS)
    } else {
        write
    }
}

/// A side that passed its checks and is ready to be written
struct PlannedSide<'a> {
    endpoint: Endpoint,
    target: &'a ObjectRef,
    is_port: bool,
}

fn endpoint_conflict(err: StoreError) -> TopologyError {
    match err {
        StoreError::Conflict { object, name } => TopologyError::EndpointAlreadyConnected {
            object,
            relationship: name,
        },
        other => other.into(),
    }
}

/// Physical connection lifecycle operations
#[derive(Clone)]
pub struct ConnectionService {
    core: ServiceCore,
}

impl ConnectionService {
    pub fn new(backends: Backends, config: TopologyConfig) -> Self {
        Self::from_core(ServiceCore::new(backends, config))
    }

    pub(crate) fn from_core(core: ServiceCore) -> Self {
        Self { core }
    }

    /// Create a connection between two objects and wire both ends
    ///
    /// If wiring fails the new connection is deleted again and the wiring
    /// error is returned. If that delete fails too,
    /// [`TopologyError::RollbackFailed`] carries both errors.
    pub async fn create_connection(
        &self,
        ctx: &RequestContext,
        request: &CreateConnectionRequest,
    ) -> TopologyResult<ObjectId> {
        let classes = self.core.classes();
        let connection_class = request.connection_class.as_str();

        if !self
            .core
            .is_a(&classes.physical_connection, connection_class)
            .await?
        {
            return Err(TopologyError::NotAConnection {
                class_name: connection_class.to_string(),
                family: classes.physical_connection.clone(),
            });
        }

        let (a, b) = (&request.endpoint_a, &request.endpoint_b);
        let parent = self
            .core
            .backends
            .objects
            .get_common_ancestor(a, b)
            .await?
            .filter(|parent| !self.core.config.is_navigation_root(parent))
            .ok_or_else(|| TopologyError::NoCommonAncestor {
                a: a.clone(),
                b: b.clone(),
            })?;

        let is_link = self.core.is_a(&classes.physical_link, connection_class).await?;
        if is_link && a == b {
            return Err(TopologyError::SelfConnection(a.clone()));
        }

        let mut port_ends = [false; 2];
        for (is_port, endpoint) in port_ends.iter_mut().zip([a, b]) {
            *is_port = self.core.is_port(endpoint).await?;
            if is_link && !*is_port {
                return Err(TopologyError::NotAPort(endpoint.clone()));
            }
            if *is_port {
                self.require_unconnected(endpoint).await?;
            }
        }

        let name = request.name.trim();
        if name.is_empty() {
            return Err(TopologyError::EmptyName);
        }

        let new_object = NewObject::named(connection_class, parent.object_ref(), name)
            .with_template(request.template_id.clone());
        let id = self.core.backends.objects.create_object(new_object).await?;
        let connection = ObjectRef::new(connection_class, id.clone());
        debug!(connection = %connection, parent = %parent, "Connection object created");

        if let Err(cause) = self
            .wire_new_connection(&connection, request, is_link, port_ends)
            .await
        {
            return Err(self.roll_back(&connection, cause).await);
        }

        let entry = self
            .core
            .entry(ctx, ActivityType::CreateInventoryObject)
            .object(&connection)
            .change("name", None, Some(name.to_string()))
            .notes(format!("{} between {} and {}", connection_class, a, b));
        self.core.record(entry).await;

        info!(
            connection = %connection,
            endpoint_a = %a,
            endpoint_b = %b,
            "Connection created"
        );
        Ok(id)
    }

    /// Create several connections, stopping at the first failure
    pub async fn create_connections(
        &self,
        ctx: &RequestContext,
        requests: &[CreateConnectionRequest],
    ) -> BatchOutcome<ObjectId, TopologyError> {
        BatchOutcome::run(requests, |request| self.create_connection(ctx, request)).await
    }

    /// Attach the given sides of an existing link; sides must be ports
    pub async fn connect_link(&self, ctx: &RequestContext, wiring: &SideWiring) -> TopologyResult<()> {
        self.connect_sides(ctx, wiring, ConnectionFamily::Links).await
    }

    pub async fn connect_links(
        &self,
        ctx: &RequestContext,
        wirings: &[SideWiring],
    ) -> BatchOutcome<(), TopologyError> {
        BatchOutcome::run(wirings, |wiring| self.connect_link(ctx, wiring)).await
    }

    /// Attach the given sides of an existing container
    pub async fn connect_container(
        &self,
        ctx: &RequestContext,
        wiring: &SideWiring,
    ) -> TopologyResult<()> {
        self.connect_sides(ctx, wiring, ConnectionFamily::Containers).await
    }

    pub async fn connect_containers(
        &self,
        ctx: &RequestContext,
        wirings: &[SideWiring],
    ) -> BatchOutcome<(), TopologyError> {
        BatchOutcome::run(wirings, |wiring| self.connect_container(ctx, wiring)).await
    }

    /// Release one or both sides of a physical connection
    ///
    /// Returns the objects that were detached. Sides that are not wired are
    /// skipped.
    pub async fn disconnect(
        &self,
        ctx: &RequestContext,
        connection: &ObjectRef,
        side: ConnectionSide,
    ) -> TopologyResult<Vec<ObjectLight>> {
        self.core
            .require_family(connection, &self.core.classes().physical_connection)
            .await?;
        self.release_sides(ctx, connection, side, Endpoint::physical).await
    }

    /// Release one or both sides of a logical connection
    pub async fn disconnect_logical(
        &self,
        ctx: &RequestContext,
        connection: &ObjectRef,
        side: ConnectionSide,
    ) -> TopologyResult<Vec<ObjectLight>> {
        self.core
            .require_family(connection, &self.core.classes().logical_connection)
            .await?;
        self.release_sides(ctx, connection, side, Endpoint::logical).await
    }

    /// Move either side of a connection to a new object
    ///
    /// A side given as `None` or as the no-op id is left alone. Both new
    /// sides are checked before anything is released; a write that still
    /// fails on side B leaves the new side A in place.
    pub async fn reconnect(
        &self,
        ctx: &RequestContext,
        connection: &ObjectRef,
        new_a: Option<&ObjectRef>,
        new_b: Option<&ObjectRef>,
    ) -> TopologyResult<()> {
        let classes = self.core.classes();
        self.core
            .require_family(connection, &classes.physical_connection)
            .await?;
        let family = if self
            .core
            .is_a(&classes.physical_link, &connection.class_name)
            .await?
        {
            ConnectionFamily::Links
        } else {
            ConnectionFamily::Containers
        };

        let moving = |target: Option<&ObjectRef>| target.filter(|t| !t.id.is_no_op()).cloned();
        let wiring = SideWiring::new(moving(new_a), connection.clone(), moving(new_b));
        let planned = self.plan_sides(&wiring, family, true).await?;

        for side in planned {
            self.release_sides(ctx, connection, side.endpoint.into(), Endpoint::physical)
                .await?;
            self.attach_side(ctx, connection, side).await?;
        }

        info!(connection = %connection, "Connection reconnected");
        Ok(())
    }

    /// Delete a physical connection together with its relationships
    pub async fn delete_connection(
        &self,
        ctx: &RequestContext,
        connection: &ObjectRef,
    ) -> TopologyResult<()> {
        self.core
            .require_family(connection, &self.core.classes().physical_connection)
            .await?;
        self.core.backends.objects.delete_object(connection, true).await?;

        let entry = self
            .core
            .entry(ctx, ActivityType::DeleteInventoryObject)
            .object(connection);
        self.core.record(entry).await;

        info!(connection = %connection, "Connection deleted");
        Ok(())
    }

    /// Objects attached to the A and B sides of a physical connection
    pub async fn connection_endpoints(
        &self,
        connection: &ObjectRef,
    ) -> TopologyResult<(Option<ObjectLight>, Option<ObjectLight>)> {
        self.core
            .require_family(connection, &self.core.classes().physical_connection)
            .await?;

        let relationships = &self.core.backends.relationships;
        let a = relationships
            .get_targets(connection, RelationshipName::EndpointA)
            .await?
            .into_iter()
            .next();
        let b = relationships
            .get_targets(connection, RelationshipName::EndpointB)
            .await?
            .into_iter()
            .next();
        Ok((a, b))
    }

    /// Every port at or below `object` that has connections, with them
    pub async fn physical_connections_in_object(
        &self,
        object: &ObjectRef,
    ) -> TopologyResult<EndpointMap> {
        let mut ports = EndpointMap::new();
        for (attached_to, connections) in self.attached_connections(object).await? {
            if self.core.is_port(&attached_to.object_ref()).await? {
                ports.insert(attached_to, connections);
            }
        }
        Ok(ports)
    }

    /// Connections of `family` with one end at or below `a` and the other
    /// at or below `b`
    pub async fn links_between(
        &self,
        a: &ObjectRef,
        b: &ObjectRef,
        family: ConnectionFamily,
    ) -> TopologyResult<Vec<ObjectLight>> {
        let family_class = family.class(&self.core.config);
        let below_b: HashSet<ObjectId> = self
            .core
            .subtree(b)
            .await?
            .into_iter()
            .map(|object| object.id)
            .collect();

        let mut found = BTreeSet::new();
        for (attached_to, connections) in self.attached_connections(a).await? {
            for connection in connections {
                if found.contains(&connection)
                    || !self.core.is_a(family_class, &connection.class_name).await?
                {
                    continue;
                }
                let (end_a, end_b) = self.connection_endpoints(&connection.object_ref()).await?;
                let far_end = [end_a, end_b]
                    .into_iter()
                    .flatten()
                    .find(|end| end.id != attached_to.id);
                if far_end.is_some_and(|end| below_b.contains(&end.id)) {
                    found.insert(connection);
                }
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Objects at or below `object` holding endpoint edges, with the
    /// connections at the other end
    async fn attached_connections(&self, object: &ObjectRef) -> TopologyResult<EndpointMap> {
        let mut attached = EndpointMap::new();
        for candidate in self.core.subtree(object).await? {
            let mut connections = Vec::new();
            for name in RelationshipName::PHYSICAL_ENDPOINTS {
                connections.extend(
                    self.core
                        .backends
                        .relationships
                        .get_targets(&candidate.object_ref(), name)
                        .await?,
                );
            }
            if !connections.is_empty() {
                connections.sort();
                attached.insert(candidate, connections);
            }
        }
        Ok(attached)
    }

    async fn require_unconnected(&self, port: &ObjectRef) -> TopologyResult<()> {
        for name in RelationshipName::PHYSICAL_ENDPOINTS {
            if self.core.backends.relationships.has_edge(port, name, 1).await? {
                return Err(TopologyError::EndpointAlreadyConnected {
                    object: port.clone(),
                    relationship: name,
                });
            }
        }
        Ok(())
    }

    async fn check_rules(&self, connection: &ObjectRef, endpoint: &ObjectRef) -> TopologyResult<()> {
        match self
            .core
            .backends
            .rules
            .check_relationship_rules(connection, endpoint)
            .await?
        {
            RuleVerdict::Allowed => Ok(()),
            RuleVerdict::Rejected(reason) => {
                debug!(connection = %connection, endpoint = %endpoint, reason = %reason, "Relationship rejected");
                Err(TopologyError::BusinessRuleViolation(reason))
            }
        }
    }

    async fn wire_new_connection(
        &self,
        connection: &ObjectRef,
        request: &CreateConnectionRequest,
        is_link: bool,
        port_ends: [bool; 2],
    ) -> TopologyResult<()> {
        let ends = [
            (Endpoint::A, &request.endpoint_a, port_ends[0]),
            (Endpoint::B, &request.endpoint_b, port_ends[1]),
        ];

        if is_link {
            for (_, target, _) in ends {
                self.check_rules(connection, target).await?;
            }
        }

        for (endpoint, target, is_port) in ends {
            self.core
                .backends
                .relationships
                .create_edge(&endpoint_write(connection, target, endpoint, is_port))
                .await
                .map_err(endpoint_conflict)?;
        }
        Ok(())
    }

    /// Delete a half-built connection, keeping the error that caused it
    async fn roll_back(&self, connection: &ObjectRef, cause: TopologyError) -> TopologyError {
        warn!(connection = %connection, error = %cause, "Rolling back connection");
        match self.core.backends.objects.delete_object(connection, true).await {
            Ok(()) => cause,
            Err(rollback) => {
                error!(
                    connection = %connection,
                    error = %cause,
                    rollback_error = %rollback,
                    "Rollback failed, connection left behind"
                );
                TopologyError::RollbackFailed {
                    connection: connection.clone(),
                    cause: Box::new(cause),
                    rollback,
                }
            }
        }
    }

    async fn connect_sides(
        &self,
        ctx: &RequestContext,
        wiring: &SideWiring,
        family: ConnectionFamily,
    ) -> TopologyResult<()> {
        self.core
            .require_family(&wiring.connection, family.class(&self.core.config))
            .await?;
        let planned = self.plan_sides(wiring, family, false).await?;
        for side in planned {
            self.attach_side(ctx, &wiring.connection, side).await?;
        }
        Ok(())
    }

    /// Check every requested side of `wiring` without writing anything
    ///
    /// When `replacing`, the sides are about to be released: the connection
    /// may still hold them, and a target already on that same side is
    /// accepted.
    async fn plan_sides<'a>(
        &self,
        wiring: &'a SideWiring,
        family: ConnectionFamily,
        replacing: bool,
    ) -> TopologyResult<Vec<PlannedSide<'a>>> {
        let connection = &wiring.connection;
        if let (Some(a), Some(b)) = (&wiring.side_a, &wiring.side_b) {
            if a == b {
                return Err(TopologyError::SelfConnection(a.clone()));
            }
        }

        let relationships = &self.core.backends.relationships;
        let mut planned = Vec::new();
        for (endpoint, target) in wiring.sides() {
            let Some(target) = target else {
                continue;
            };
            if target == connection {
                return Err(TopologyError::SelfConnection(target.clone()));
            }

            let is_port = self.core.is_port(target).await?;
            if family == ConnectionFamily::Links && !is_port {
                return Err(TopologyError::NotAPort(target.clone()));
            }

            let current = relationships
                .get_targets(connection, endpoint.physical())
                .await?;
            if !replacing && !current.is_empty() {
                return Err(TopologyError::EndpointAlreadyConnected {
                    object: connection.clone(),
                    relationship: endpoint.physical(),
                });
            }
            let already_there = replacing && current.iter().any(|object| object.is(target));
            if is_port && !already_there {
                self.require_unconnected(target).await?;
            }
            if family == ConnectionFamily::Links {
                self.check_rules(connection, target).await?;
            }
            planned.push(PlannedSide {
                endpoint,
                target,
                is_port,
            });
        }
        Ok(planned)
    }

    async fn attach_side(
        &self,
        ctx: &RequestContext,
        connection: &ObjectRef,
        side: PlannedSide<'_>,
    ) -> TopologyResult<()> {
        let PlannedSide {
            endpoint,
            target,
            is_port,
        } = side;
        self.core
            .backends
            .relationships
            .create_edge(&endpoint_write(connection, target, endpoint, is_port))
            .await
            .map_err(endpoint_conflict)?;

        let entry = self
            .core
            .entry(ctx, ActivityType::CreateRelationship)
            .object(connection)
            .change(endpoint.physical().as_str(), None, Some(target.id.to_string()));
        self.core.record(entry).await;

        info!(
            connection = %connection,
            side = %endpoint.physical(),
            target = %target,
            "Connection side attached"
        );
        Ok(())
    }

    async fn release_sides(
        &self,
        ctx: &RequestContext,
        connection: &ObjectRef,
        side: ConnectionSide,
        relationship: fn(&Endpoint) -> RelationshipName,
    ) -> TopologyResult<Vec<ObjectLight>> {
        let relationships = &self.core.backends.relationships;
        let mut released = Vec::new();

        for endpoint in side.endpoints() {
            let name = relationship(endpoint);
            let targets = relationships.get_targets(connection, name).await?;
            if targets.is_empty() {
                debug!(connection = %connection, side = %name, "Side not wired, skipped");
                continue;
            }

            relationships.release_edges(connection, &[name]).await?;

            let entry = self
                .core
                .entry(ctx, ActivityType::ReleaseRelationship)
                .object(connection)
                .change(name.as_str(), Some(joined_ids(&targets)), None);
            self.core.record(entry).await;

            info!(connection = %connection, side = %name, "Connection side released");
            released.extend(targets);
        }
        Ok(released)
    }
}
