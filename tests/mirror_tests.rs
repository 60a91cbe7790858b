// Copyright (c) 2025 - Cowboy AI, Inc.
//! Mirror relationship tests

mod fixtures;

use pretty_assertions::assert_eq;

use fixtures::*;
use inventory_topology::audit::ActivityType;
use inventory_topology::domain::{ItemOutcome, RelationshipName};
use inventory_topology::errors::TopologyError;
use inventory_topology::store::RelationshipStore;

/// Mirror symmetry: either side sees the other
#[tokio::test]
async fn test_mirror_is_visible_from_both_sides() {
    // Given two unmirrored ports
    let h = harness();

    // When they are mirrored
    h.services
        .mirrors
        .connect_mirror(&ctx(), &port(CORE_1_P3), &port(CORE_2_P2))
        .await
        .unwrap();

    // Then each side finds the other
    let from_a = h
        .inventory
        .get_targets(&port(CORE_1_P3), RelationshipName::Mirror)
        .await
        .unwrap();
    let from_b = h
        .inventory
        .get_targets(&port(CORE_2_P2), RelationshipName::Mirror)
        .await
        .unwrap();
    assert_eq!(ids(&from_a), vec![CORE_2_P2]);
    assert_eq!(ids(&from_b), vec![CORE_1_P3]);

    let created = h.audit.entries_of(ActivityType::CreateRelationship).await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].new_value.as_deref(), Some(CORE_2_P2));
}

#[tokio::test]
async fn test_mirror_is_one_to_one() {
    // Given ODF front-1, already mirrored to back-1
    let h = harness();
    let mirrors = &h.services.mirrors;

    // When either side of a new pairing is already mirrored
    let err = mirrors
        .connect_mirror(&ctx(), &port(CORE_1_P3), &port(ODF_BACK))
        .await
        .unwrap_err();

    // Then the pairing is refused
    assert!(matches!(
        err,
        TopologyError::AlreadyMirrored { ref object, relationship }
            if object == &port(ODF_BACK) && relationship == RelationshipName::Mirror
    ));

    let err = mirrors
        .connect_mirror(&ctx(), &port(ODF_FRONT), &port(CORE_1_P3))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::AlreadyMirrored { .. }));
}

#[tokio::test]
async fn test_mirror_rejects_self_and_non_ports() {
    let h = harness();
    let mirrors = &h.services.mirrors;

    let err = mirrors
        .connect_mirror(&ctx(), &port(CORE_1_P3), &port(CORE_1_P3))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::SelfConnection(_)));

    let err = mirrors
        .connect_mirror(&ctx(), &port(CORE_1_P3), &router(CORE_2))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::NotAPort(_)));
}

#[tokio::test]
async fn test_connect_mirrors_batch() {
    let h = harness();
    let pairs = vec![
        (port(CORE_1_P3), port(CORE_2_P2)),
        (port(CORE_1_P3), port(ODF_SPLIT)),
        (port(EDGE_1_P1), port(REMOTE_1_P1)),
    ];

    let outcome = h.services.mirrors.connect_mirrors(&ctx(), &pairs).await;

    assert!(outcome.items()[0].is_completed());
    assert!(matches!(
        outcome.items()[1],
        ItemOutcome::Failed(TopologyError::AlreadyMirrored { .. })
    ));
    assert!(matches!(outcome.items()[2], ItemOutcome::Skipped));
}

/// mirrorMultiple fan-out: one source, many targets
#[tokio::test]
async fn test_mirror_multiple_fan_out() {
    // Given the ODF split port and three free ports
    let h = harness();
    let targets = vec![
        port(CORE_1_P3),
        port(CORE_2_P2),
        electrical_port(CORE_2_ELECTRICAL),
    ];

    // When the split fans out to all of them
    let outcome = h
        .services
        .mirrors
        .connect_mirror_multiple(&ctx(), &port(ODF_SPLIT), &targets)
        .await
        .unwrap();

    // Then every target holds one edge back to the split port
    assert!(outcome.is_complete());
    let fan = h
        .inventory
        .get_targets(&port(ODF_SPLIT), RelationshipName::MirrorMultiple)
        .await
        .unwrap();
    assert_eq!(fan.len(), 3);

    // And a target can not join a second fan-out
    let err = h
        .services
        .mirrors
        .connect_mirror_multiple(&ctx(), &port(EDGE_1_P1), &[port(CORE_2_P2)])
        .await
        .unwrap()
        .into_result()
        .unwrap_err();
    assert!(matches!(
        err,
        TopologyError::AlreadyMirrored { ref object, relationship }
            if object == &port(CORE_2_P2) && relationship == RelationshipName::MirrorMultiple
    ));
}

#[tokio::test]
async fn test_mirror_multiple_keeps_edges_before_failure() {
    let h = harness();
    let targets = vec![port(CORE_1_P3), room(ROOM_1), port(CORE_2_P2)];

    let outcome = h
        .services
        .mirrors
        .connect_mirror_multiple(&ctx(), &port(ODF_SPLIT), &targets)
        .await
        .unwrap();

    assert!(outcome.items()[0].is_completed());
    assert!(matches!(
        outcome.items()[1],
        ItemOutcome::Failed(TopologyError::NotAPort(_))
    ));
    assert!(matches!(outcome.items()[2], ItemOutcome::Skipped));

    let fan = h
        .inventory
        .get_targets(&port(ODF_SPLIT), RelationshipName::MirrorMultiple)
        .await
        .unwrap();
    assert_eq!(ids(&fan), vec![CORE_1_P3]);
}

#[tokio::test]
async fn test_mirror_multiple_rejects_self_pairing_up_front() {
    let h = harness();
    let edges_before = h.inventory.edge_count().await;

    let err = h
        .services
        .mirrors
        .connect_mirror_multiple(
            &ctx(),
            &port(ODF_SPLIT),
            &[port(CORE_1_P3), port(ODF_SPLIT)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TopologyError::SelfConnection(_)));
    assert_eq!(h.inventory.edge_count().await, edges_before);
}

#[tokio::test]
async fn test_release_mirror() {
    let h = harness();
    let mirrors = &h.services.mirrors;

    let partner = mirrors.release_mirror(&ctx(), &port(ODF_BACK)).await.unwrap();
    assert_eq!(partner.id.as_str(), ODF_FRONT);
    assert!(!h
        .inventory
        .has_edge(&port(ODF_FRONT), RelationshipName::Mirror, 1)
        .await
        .unwrap());

    let released = h.audit.entries_of(ActivityType::ReleaseRelationship).await;
    assert_eq!(released[0].old_value.as_deref(), Some(ODF_FRONT));

    // Nothing left to release
    let err = mirrors
        .release_mirror(&ctx(), &port(ODF_BACK))
        .await
        .unwrap_err();
    assert!(matches!(err, TopologyError::NoMirrorFound { .. }));
}

#[tokio::test]
async fn test_release_mirror_multiple() {
    let h = harness();
    let mirrors = &h.services.mirrors;
    mirrors
        .connect_mirror_multiple(
            &ctx(),
            &port(ODF_SPLIT),
            &[port(CORE_1_P3), port(CORE_2_P2)],
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let released = mirrors
        .release_mirror_multiple(&ctx(), &port(ODF_SPLIT))
        .await
        .unwrap();
    assert_eq!(released.len(), 2);

    let err = mirrors
        .release_mirror_multiple(&ctx(), &port(ODF_SPLIT))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TopologyError::NoMirrorFound { relationship, .. }
            if relationship == RelationshipName::MirrorMultiple
    ));
}
