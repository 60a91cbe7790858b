// Copyright (c) 2025 - Cowboy AI, Inc.
//! Mirror Relationships
//!
//! Pairs ports that are physically the same signal path, such as the front
//! and back of a patch panel position.
//!
//! - `mirror`: 1:1, neither port may already be mirrored
//! - `mirrorMultiple`: one port fans out to many; each port on the "many"
//!   side holds a single `mirrorMultiple` edge

use tracing::info;

use super::{joined_ids, Backends, ServiceCore};
use crate::audit::{ActivityType, RequestContext};
use crate::config::TopologyConfig;
use crate::domain::{BatchOutcome, ObjectLight, ObjectRef, RelationshipName};
use crate::errors::{StoreError, TopologyError, TopologyResult};
use crate::store::EdgeWrite;

fn mirror_conflict(err: StoreError) -> TopologyError {
    match err {
        StoreError::Conflict { object, name } => TopologyError::AlreadyMirrored {
            object,
            relationship: name,
        },
        other => other.into(),
    }
}

/// Mirror relationship operations
#[derive(Clone)]
pub struct MirrorService {
    core: ServiceCore,
}

impl MirrorService {
    pub fn new(backends: Backends, config: TopologyConfig) -> Self {
        Self::from_core(ServiceCore::new(backends, config))
    }

    pub(crate) fn from_core(core: ServiceCore) -> Self {
        Self { core }
    }

    /// Mirror two ports
    pub async fn connect_mirror(
        &self,
        ctx: &RequestContext,
        a: &ObjectRef,
        b: &ObjectRef,
    ) -> TopologyResult<()> {
        if a == b {
            return Err(TopologyError::SelfConnection(a.clone()));
        }
        self.core.require_port(a).await?;
        self.core.require_port(b).await?;
        for port in [a, b] {
            self.require_unmirrored(port, RelationshipName::Mirror).await?;
        }

        let write = EdgeWrite::new(a.clone(), b.clone(), RelationshipName::Mirror)
            .source_free_of(&[RelationshipName::Mirror])
            .target_free_of(&[RelationshipName::Mirror]);
        self.core
            .backends
            .relationships
            .create_edge(&write)
            .await
            .map_err(mirror_conflict)?;

        self.record_created(ctx, a, b, RelationshipName::Mirror).await;
        info!(port_a = %a, port_b = %b, "Ports mirrored");
        Ok(())
    }

    /// Mirror several port pairs, stopping at the first failure
    pub async fn connect_mirrors(
        &self,
        ctx: &RequestContext,
        pairs: &[(ObjectRef, ObjectRef)],
    ) -> BatchOutcome<(), TopologyError> {
        BatchOutcome::run(pairs, |(a, b)| self.connect_mirror(ctx, a, b)).await
    }

    /// Fan `a` out to every port in `targets`
    ///
    /// `a` and the self-pairing check are validated up front. The targets
    /// are then processed in order; the batch stops at the first target that
    /// is not a port or is already on the "many" side of a fan-out, keeping
    /// the edges created before it.
    pub async fn connect_mirror_multiple(
        &self,
        ctx: &RequestContext,
        a: &ObjectRef,
        targets: &[ObjectRef],
    ) -> TopologyResult<BatchOutcome<(), TopologyError>> {
        self.core.require_port(a).await?;
        if targets.contains(a) {
            return Err(TopologyError::SelfConnection(a.clone()));
        }

        Ok(BatchOutcome::run(targets, |b| self.fan_out(ctx, a, b)).await)
    }

    /// Remove the `mirror` pairing of `port`, returning its former partner
    pub async fn release_mirror(
        &self,
        ctx: &RequestContext,
        port: &ObjectRef,
    ) -> TopologyResult<ObjectLight> {
        let partners = self.release(ctx, port, RelationshipName::Mirror).await?;
        partners.into_iter().next().ok_or_else(|| TopologyError::NoMirrorFound {
            object: port.clone(),
            relationship: RelationshipName::Mirror,
        })
    }

    /// Remove every `mirrorMultiple` pairing of `port`
    pub async fn release_mirror_multiple(
        &self,
        ctx: &RequestContext,
        port: &ObjectRef,
    ) -> TopologyResult<Vec<ObjectLight>> {
        self.release(ctx, port, RelationshipName::MirrorMultiple).await
    }

    async fn fan_out(&self, ctx: &RequestContext, a: &ObjectRef, b: &ObjectRef) -> TopologyResult<()> {
        self.core.require_port(b).await?;
        self.require_unmirrored(b, RelationshipName::MirrorMultiple)
            .await?;

        let write = EdgeWrite::new(a.clone(), b.clone(), RelationshipName::MirrorMultiple)
            .target_free_of(&[RelationshipName::MirrorMultiple]);
        self.core
            .backends
            .relationships
            .create_edge(&write)
            .await
            .map_err(mirror_conflict)?;

        self.record_created(ctx, a, b, RelationshipName::MirrorMultiple)
            .await;
        info!(port_a = %a, port_b = %b, "Ports mirrored (multiple)");
        Ok(())
    }

    async fn require_unmirrored(&self, port: &ObjectRef, name: RelationshipName) -> TopologyResult<()> {
        if self.core.backends.relationships.has_edge(port, name, 1).await? {
            return Err(TopologyError::AlreadyMirrored {
                object: port.clone(),
                relationship: name,
            });
        }
        Ok(())
    }

    async fn release(
        &self,
        ctx: &RequestContext,
        port: &ObjectRef,
        name: RelationshipName,
    ) -> TopologyResult<Vec<ObjectLight>> {
        let relationships = &self.core.backends.relationships;
        let partners = relationships.get_targets(port, name).await?;
        if partners.is_empty() {
            return Err(TopologyError::NoMirrorFound {
                object: port.clone(),
                relationship: name,
            });
        }

        relationships.release_edges(port, &[name]).await?;

        let entry = self
            .core
            .entry(ctx, ActivityType::ReleaseRelationship)
            .object(port)
            .change(name.as_str(), Some(joined_ids(&partners)), None);
        self.core.record(entry).await;

        info!(port = %port, relationship = %name, released = partners.len(), "Mirror released");
        Ok(partners)
    }

    async fn record_created(
        &self,
        ctx: &RequestContext,
        a: &ObjectRef,
        b: &ObjectRef,
        name: RelationshipName,
    ) {
        let entry = self
            .core
            .entry(ctx, ActivityType::CreateRelationship)
            .object(a)
            .change(name.as_str(), None, Some(b.id.to_string()));
        self.core.record(entry).await;
    }
}
