// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology & Impact Correlation
//!
//! Read-only queries over the connectivity graph:
//!
//! - VLAN continuity: the physical path of every other port in the VLANs a
//!   port belongs to
//! - Affected services: which customers lose which services when a device,
//!   slot, port or connection fails
//!
//! # Resource descriptors
//!
//! | type | descriptor | resolves to |
//! |------|------------|-------------|
//! | 1 | `device` | every port in the device |
//! | 1 | `device;slot` | every port in the slot |
//! | 1 | `device;slot;port` | that port |
//! | 2 | connection name | logical connections with that name |
//! | 3 | connection name | physical connections with that name |

use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{Backends, ServiceCore};
use crate::config::TopologyConfig;
use crate::domain::{
    group_by_customer, AssetCorrelation, HardwareDescriptor, ObjectLight, ObjectRef,
    RelationshipName, ResourceQuery,
};
use crate::errors::{StoreError, TopologyError, TopologyResult};

/// Port → physical path from that port
pub type ContinuityMap = BTreeMap<ObjectLight, Vec<ObjectLight>>;

/// Exactly one device, or `ResourceNotFound` / `AmbiguousResource`
fn single_device(mut matches: Vec<ObjectLight>, what: String) -> TopologyResult<ObjectLight> {
    match matches.len() {
        0 => Err(TopologyError::ResourceNotFound(what)),
        1 => Ok(matches.remove(0)),
        _ => Err(TopologyError::AmbiguousResource(what)),
    }
}

/// Exactly one slot or port; anything else can not be resolved
fn unique_child(mut matches: Vec<ObjectLight>, what: String) -> TopologyResult<ObjectLight> {
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(TopologyError::ResourceNotFound(what)),
        n => Err(TopologyError::ResourceNotFound(format!("{what} ({n} matches)"))),
    }
}

/// Topology and impact queries
#[derive(Clone)]
pub struct TopologyCorrelator {
    core: ServiceCore,
}

impl TopologyCorrelator {
    pub fn new(backends: Backends, config: TopologyConfig) -> Self {
        Self::from_core(ServiceCore::new(backends, config))
    }

    pub(crate) fn from_core(core: ServiceCore) -> Self {
        Self { core }
    }

    /// Physical paths of the ports sharing a VLAN with `port`
    ///
    /// The port itself is not part of the result, and members without a
    /// physical path are left out. A port in several of the same VLANs
    /// appears once.
    pub async fn vlan_continuity(&self, port: Option<&ObjectRef>) -> TopologyResult<ContinuityMap> {
        let Some(port) = port else {
            return Ok(ContinuityMap::new());
        };

        let relationships = &self.core.backends.relationships;
        let mut vlans = Vec::new();
        for candidate in relationships
            .get_targets(port, RelationshipName::PortBelongsToVlan)
            .await?
        {
            if self
                .core
                .is_a(&self.core.classes().vlan, &candidate.class_name)
                .await?
            {
                vlans.push(candidate);
            }
        }

        let mut members = BTreeSet::new();
        for vlan in &vlans {
            for member in relationships
                .get_targets(&vlan.object_ref(), RelationshipName::PortBelongsToVlan)
                .await?
            {
                if !member.is(port) {
                    members.insert(member);
                }
            }
        }
        debug!(port = %port, vlans = vlans.len(), members = members.len(), "Resolving VLAN continuity");

        let paths = &self.core.backends.paths;
        let lookups = members.into_iter().map(|member| async move {
            let path = paths.physical_path(&member.object_ref()).await?;
            Ok::<_, StoreError>((member, path))
        });

        Ok(try_join_all(lookups)
            .await?
            .into_iter()
            .filter(|(_, path)| !path.is_empty())
            .collect())
    }

    /// Services affected by the failure of a resource, per customer
    ///
    /// `resource_type` is `1` (hardware), `2` (logical connection) or `3`
    /// (physical connection); see the module docs for descriptors.
    pub async fn affected_services(
        &self,
        resource_type: i32,
        descriptor: &str,
    ) -> TopologyResult<AssetCorrelation> {
        let classes = self.core.classes();
        match ResourceQuery::parse(resource_type, descriptor)? {
            ResourceQuery::Hardware(hardware) => self.hardware_impact(&hardware).await,
            ResourceQuery::LogicalConnection { name } => {
                self.connection_impact(&classes.logical_connection, &name).await
            }
            ResourceQuery::PhysicalConnection { name } => {
                self.connection_impact(&classes.physical_connection, &name).await
            }
        }
    }

    async fn hardware_impact(&self, hardware: &HardwareDescriptor) -> TopologyResult<AssetCorrelation> {
        let classes = self.core.classes();
        let objects = &self.core.backends.objects;
        let impact = &self.core.backends.impact;

        let device = single_device(
            objects
                .find_objects_by_name(&classes.communications_element, hardware.device())
                .await?,
            format!("device {}", hardware.device()),
        )?;

        match hardware {
            HardwareDescriptor::Device { .. } => Ok(impact.services_in_device(&device).await?),
            HardwareDescriptor::Slot { slot, .. } => impact
                .services_in_slot(&device, slot)
                .await
                .map_err(|e| match e {
                    StoreError::ChildNotFound { parent, name } => {
                        TopologyError::ResourceNotFound(format!("slot {name} in {parent}"))
                    }
                    other => other.into(),
                }),
            HardwareDescriptor::Port { slot, port, .. } => {
                let slot = unique_child(
                    objects
                        .get_children(&device.object_ref())
                        .await?
                        .into_iter()
                        .filter(|child| &child.name == slot)
                        .collect(),
                    format!("slot {slot} in {device}"),
                )?;

                let mut candidates = Vec::new();
                for object in self.core.subtree(&slot.object_ref()).await?.into_iter().skip(1) {
                    if &object.name == port
                        && self
                            .core
                            .is_a(&classes.communications_port, &object.class_name)
                            .await?
                    {
                        candidates.push(object);
                    }
                }
                let port = unique_child(candidates, format!("port {port} in {slot}"))?;

                Ok(impact.services_in_ports(&[port]).await?)
            }
        }
    }

    async fn connection_impact(&self, family: &str, name: &str) -> TopologyResult<AssetCorrelation> {
        let classes = self.core.classes();
        let connections = self
            .core
            .backends
            .objects
            .find_objects_by_name(family, name)
            .await?;
        if connections.is_empty() {
            return Err(TopologyError::ResourceNotFound(format!("{family} {name}")));
        }

        let mut pairs = Vec::new();
        for connection in &connections {
            let services = self
                .core
                .backends
                .relationships
                .get_targets(&connection.object_ref(), RelationshipName::Uses)
                .await?;

            for service in services {
                if !self.core.is_a(&classes.service, &service.class_name).await? {
                    continue;
                }
                match self
                    .core
                    .nearest_ancestor(&service.object_ref(), &classes.customer)
                    .await?
                {
                    Some(customer) => pairs.push((customer, service)),
                    None => debug!(service = %service, "Service without customer skipped"),
                }
            }
        }

        Ok(AssetCorrelation::new(connections, group_by_customer(pairs)))
    }
}
