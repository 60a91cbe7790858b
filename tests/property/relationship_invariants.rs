// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Relationship Cardinality
//!
//! Random sequences of wiring requests against the fixture inventory must
//! never break the cardinality rules, whatever mix of them succeeds.

use inventory_topology::domain::{ObjectRef, RelationshipName};
use inventory_topology::service::CreateConnectionRequest;
use inventory_topology::store::RelationshipStore;
use proptest::prelude::*;

use crate::fixtures::*;

/// Ports the generated requests pick from; some start out wired
const PORTS: [&str; 8] = [
    CORE_1_P1,
    CORE_1_P3,
    CORE_1_UPLINK,
    CORE_2_P1,
    CORE_2_P2,
    ODF_FRONT,
    ODF_SPLIT,
    EDGE_1_P1,
];

fn port_pairs() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..PORTS.len(), 0..PORTS.len()), 1..12)
}

fn pool() -> Vec<ObjectRef> {
    PORTS.iter().map(|id| port(id)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: a port never holds more than one endpoint edge
    #[test]
    fn prop_endpoint_uniqueness(pairs in port_pairs()) {
        let h = harness();
        let ports = pool();

        tokio_test::block_on(async {
            for (index, (a, b)) in pairs.iter().enumerate() {
                let request = CreateConnectionRequest::new(
                    "OpticalLink",
                    ports[*a].clone(),
                    ports[*b].clone(),
                    format!("FO-P{index}"),
                );
                let _ = h.services.connections.create_connection(&ctx(), &request).await;
            }

            for port in &ports {
                let mut endpoints = 0;
                for name in RelationshipName::PHYSICAL_ENDPOINTS {
                    endpoints += h.inventory.get_targets(port, name).await.unwrap().len();
                }
                prop_assert!(endpoints <= 1, "{} holds {} endpoint edges", port, endpoints);
            }
            Ok(())
        })?;
    }

    /// Property: mirrors stay 1:1 and symmetric
    #[test]
    fn prop_mirror_symmetry(pairs in port_pairs()) {
        let h = harness();
        let ports = pool();

        tokio_test::block_on(async {
            for (a, b) in &pairs {
                let _ = h.services.mirrors.connect_mirror(&ctx(), &ports[*a], &ports[*b]).await;
            }

            for port in &ports {
                let partners = h.inventory.get_targets(port, RelationshipName::Mirror).await.unwrap();
                prop_assert!(partners.len() <= 1, "{} has {} mirrors", port, partners.len());

                for partner in partners {
                    let back = h
                        .inventory
                        .get_targets(&partner.object_ref(), RelationshipName::Mirror)
                        .await
                        .unwrap();
                    prop_assert!(back.iter().any(|o| o.is(port)), "mirror of {} is not symmetric", port);
                }
            }
            Ok(())
        })?;
    }
}
