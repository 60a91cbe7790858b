// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for inventory-topology
//!
//! Builds one deterministic inventory shared by the integration tests.
//! Every object id is a fixed constant so assertions can name them.
//!
//! ```text
//! DummyRoot
//! ├── HQ (Building)
//! │   ├── WC-1, WC-SPARE (WireContainer)       WC-1: Room 1 ↔ Room 2
//! │   ├── FO-EDGE (OpticalLink)                odf back-1 ↔ edge-1 xe-0/0/1
//! │   ├── Room 1
//! │   │   └── Rack 1
//! │   │       ├── core-1 (Router)
//! │   │       │   ├── slot 0: xe-0/0/1, xe-0/0/2, xe-0/0/3
//! │   │       │   └── slot 1: xe-1/0/1
//! │   │       ├── core-2 (Router)
//! │   │       │   └── slot 0: xe-0/0/1, xe-0/0/2, ge-0/0/3 (electrical)
//! │   │       ├── ODF-1: front-1 ═mirror═ back-1, split-1
//! │   │       ├── FO-CORE (OpticalLink)        core-1 xe-0/0/1 ↔ core-2 xe-0/0/1
//! │   │       ├── FO-ODF (OpticalLink)         core-1 xe-1/0/1 ↔ ODF front-1
//! │   │       ├── FO-SPARE (OpticalLink)       unwired
//! │   │       └── MPLS-CORE (MPLSLink)         core-1 xe-0/0/2 ↔ core-2 xe-0/0/2
//! │   └── Room 2
//! │       ├── edge-1 (Router): slot 0: xe-0/0/1
//! │       └── twin, twin (Router)
//! ├── DC (Building)
//! │   └── remote-1 (Router): xe-0/0/1
//! ├── ACME: ACME-VPN (uses FO-CORE, MPLS-CORE), ACME-NET (uses core-1 xe-1/0/1)
//! ├── Globex: GLOBEX-VPN (uses FO-CORE), GLOBEX-INET (uses FO-EDGE)
//! ├── ORPHAN (uses FO-CORE, no customer)
//! └── VLAN 100 {core-1 xe-0/0/3, core-1 xe-1/0/1, edge-1 xe-0/0/1}
//!     VLAN 200 {core-1 xe-0/0/3, core-1 xe-1/0/1}
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use inventory_topology::audit::MemoryAuditSink;
use inventory_topology::domain::{ObjectLight, ObjectRef, RelationshipName};
use inventory_topology::service::{Backends, TopologyServices};
use inventory_topology::store::{BusinessRuleValidator, InMemoryInventory, InventoryBuilder};
use inventory_topology::telemetry::init_tracing;
use inventory_topology::TopologyConfig;

// Locations
pub const HQ: &str = "bld-hq";
pub const DC: &str = "bld-dc";
pub const ROOM_1: &str = "room-1";
pub const ROOM_2: &str = "room-2";
pub const RACK_1: &str = "rack-1";

// Devices and slots
pub const CORE_1: &str = "dev-core-1";
pub const CORE_2: &str = "dev-core-2";
pub const EDGE_1: &str = "dev-edge-1";
pub const REMOTE_1: &str = "dev-remote-1";
pub const TWIN_A: &str = "dev-twin-a";
pub const TWIN_B: &str = "dev-twin-b";
pub const ODF_1: &str = "odf-1";
pub const CORE_1_SLOT_0: &str = "slot-c1-0";
pub const CORE_1_SLOT_1: &str = "slot-c1-1";
pub const CORE_2_SLOT_0: &str = "slot-c2-0";
pub const EDGE_1_SLOT_0: &str = "slot-e1-0";

// Ports
pub const CORE_1_P1: &str = "port-c1-0-1";
pub const CORE_1_P2: &str = "port-c1-0-2";
pub const CORE_1_P3: &str = "port-c1-0-3";
pub const CORE_1_UPLINK: &str = "port-c1-1-1";
pub const CORE_2_P1: &str = "port-c2-0-1";
pub const CORE_2_P2: &str = "port-c2-0-2";
pub const CORE_2_ELECTRICAL: &str = "port-c2-0-3";
pub const EDGE_1_P1: &str = "port-e1-0-1";
pub const REMOTE_1_P1: &str = "port-r1-1";
pub const ODF_FRONT: &str = "odf-1-front";
pub const ODF_BACK: &str = "odf-1-back";
pub const ODF_SPLIT: &str = "odf-1-split";

// Connections
pub const FO_CORE: &str = "link-fo-core";
pub const FO_ODF: &str = "link-fo-odf";
pub const FO_EDGE: &str = "link-fo-edge";
pub const FO_SPARE: &str = "link-fo-spare";
pub const WC_1: &str = "container-wc-1";
pub const WC_SPARE: &str = "container-wc-spare";
pub const MPLS_CORE: &str = "mpls-core";

// Customers, services and VLANs
pub const ACME: &str = "cust-acme";
pub const GLOBEX: &str = "cust-globex";
pub const ACME_VPN: &str = "svc-acme-vpn";
pub const ACME_NET: &str = "svc-acme-net";
pub const GLOBEX_VPN: &str = "svc-globex-vpn";
pub const GLOBEX_INET: &str = "svc-globex-inet";
pub const ORPHAN: &str = "svc-orphan";
pub const VLAN_100: &str = "vlan-100";
pub const VLAN_200: &str = "vlan-200";

pub const TEST_USER: &str = "noc-operator";

/// The fixture inventory described in the module docs
pub fn inventory() -> InMemoryInventory {
    use RelationshipName::*;

    InventoryBuilder::with_standard_classes()
        .object("Building", HQ, "HQ", None)
        .object("Building", DC, "DC", None)
        .object("Room", ROOM_1, "Room 1", Some(HQ))
        .object("Room", ROOM_2, "Room 2", Some(HQ))
        .object("Rack", RACK_1, "Rack 1", Some(ROOM_1))
        // core-1
        .object("Router", CORE_1, "core-1", Some(RACK_1))
        .object("Slot", CORE_1_SLOT_0, "0", Some(CORE_1))
        .object("Slot", CORE_1_SLOT_1, "1", Some(CORE_1))
        .object("OpticalPort", CORE_1_P1, "xe-0/0/1", Some(CORE_1_SLOT_0))
        .object("OpticalPort", CORE_1_P2, "xe-0/0/2", Some(CORE_1_SLOT_0))
        .object("OpticalPort", CORE_1_P3, "xe-0/0/3", Some(CORE_1_SLOT_0))
        .object("OpticalPort", CORE_1_UPLINK, "xe-1/0/1", Some(CORE_1_SLOT_1))
        // core-2
        .object("Router", CORE_2, "core-2", Some(RACK_1))
        .object("Slot", CORE_2_SLOT_0, "0", Some(CORE_2))
        .object("OpticalPort", CORE_2_P1, "xe-0/0/1", Some(CORE_2_SLOT_0))
        .object("OpticalPort", CORE_2_P2, "xe-0/0/2", Some(CORE_2_SLOT_0))
        .object("ElectricalPort", CORE_2_ELECTRICAL, "ge-0/0/3", Some(CORE_2_SLOT_0))
        // patch panel
        .object("ODF", ODF_1, "ODF-1", Some(RACK_1))
        .object("OpticalPort", ODF_FRONT, "front-1", Some(ODF_1))
        .object("OpticalPort", ODF_BACK, "back-1", Some(ODF_1))
        .object("OpticalPort", ODF_SPLIT, "split-1", Some(ODF_1))
        // room 2
        .object("Router", EDGE_1, "edge-1", Some(ROOM_2))
        .object("Slot", EDGE_1_SLOT_0, "0", Some(EDGE_1))
        .object("OpticalPort", EDGE_1_P1, "xe-0/0/1", Some(EDGE_1_SLOT_0))
        .object("Router", TWIN_A, "twin", Some(ROOM_2))
        .object("Router", TWIN_B, "twin", Some(ROOM_2))
        // remote site
        .object("Router", REMOTE_1, "remote-1", Some(DC))
        .object("OpticalPort", REMOTE_1_P1, "xe-0/0/1", Some(REMOTE_1))
        // connections
        .object("OpticalLink", FO_CORE, "FO-CORE", Some(RACK_1))
        .object("OpticalLink", FO_ODF, "FO-ODF", Some(RACK_1))
        .object("OpticalLink", FO_EDGE, "FO-EDGE", Some(HQ))
        .object("OpticalLink", FO_SPARE, "FO-SPARE", Some(RACK_1))
        .object("WireContainer", WC_1, "WC-1", Some(HQ))
        .object("WireContainer", WC_SPARE, "WC-SPARE", Some(HQ))
        .object("MPLSLink", MPLS_CORE, "MPLS-CORE", Some(RACK_1))
        .edge(FO_CORE, CORE_1_P1, EndpointA)
        .edge(FO_CORE, CORE_2_P1, EndpointB)
        .edge(FO_ODF, CORE_1_UPLINK, EndpointA)
        .edge(FO_ODF, ODF_FRONT, EndpointB)
        .edge(ODF_FRONT, ODF_BACK, Mirror)
        .edge(FO_EDGE, ODF_BACK, EndpointA)
        .edge(FO_EDGE, EDGE_1_P1, EndpointB)
        .edge(WC_1, ROOM_1, EndpointA)
        .edge(WC_1, ROOM_2, EndpointB)
        .edge(MPLS_CORE, CORE_1_P2, LogicalEndpointA)
        .edge(MPLS_CORE, CORE_2_P2, LogicalEndpointB)
        // customers and services
        .object("CorporateCustomer", ACME, "ACME", None)
        .object("CorporateCustomer", GLOBEX, "Globex", None)
        .object("MPLSService", ACME_VPN, "ACME-VPN", Some(ACME))
        .object("MPLSService", ACME_NET, "ACME-NET", Some(ACME))
        .object("MPLSService", GLOBEX_VPN, "GLOBEX-VPN", Some(GLOBEX))
        .object("InternetService", GLOBEX_INET, "GLOBEX-INET", Some(GLOBEX))
        .object("MPLSService", ORPHAN, "ORPHAN", None)
        .edge(ACME_VPN, FO_CORE, Uses)
        .edge(ACME_VPN, MPLS_CORE, Uses)
        .edge(ACME_NET, CORE_1_UPLINK, Uses)
        .edge(GLOBEX_VPN, FO_CORE, Uses)
        .edge(GLOBEX_INET, FO_EDGE, Uses)
        .edge(ORPHAN, FO_CORE, Uses)
        // VLANs
        .object("VLAN", VLAN_100, "VLAN 100", None)
        .object("VLAN", VLAN_200, "VLAN 200", None)
        .edge(CORE_1_P3, VLAN_100, PortBelongsToVlan)
        .edge(CORE_1_UPLINK, VLAN_100, PortBelongsToVlan)
        .edge(EDGE_1_P1, VLAN_100, PortBelongsToVlan)
        .edge(CORE_1_P3, VLAN_200, PortBelongsToVlan)
        .edge(CORE_1_UPLINK, VLAN_200, PortBelongsToVlan)
        .build()
        .expect("fixture inventory is valid")
}

/// Services wired to the fixture inventory with an in-memory activity log
pub struct Harness {
    pub inventory: InMemoryInventory,
    pub audit: Arc<MemoryAuditSink>,
    pub services: TopologyServices,
}

pub fn harness() -> Harness {
    build_harness(inventory(), None)
}

pub fn harness_with_rules(rules: Arc<dyn BusinessRuleValidator>) -> Harness {
    build_harness(inventory(), Some(rules))
}

pub fn harness_with_backends(
    inventory: InMemoryInventory,
    adjust: impl FnOnce(Backends) -> Backends,
) -> Harness {
    init_tracing("inventory_topology=debug");
    let config = TopologyConfig::default();
    let audit = Arc::new(MemoryAuditSink::new());
    let backends = adjust(
        Backends::in_memory(inventory.clone(), config.classes.clone()).with_audit(audit.clone()),
    );
    Harness {
        inventory,
        audit,
        services: TopologyServices::new(backends, config),
    }
}

fn build_harness(
    inventory: InMemoryInventory,
    rules: Option<Arc<dyn BusinessRuleValidator>>,
) -> Harness {
    harness_with_backends(inventory, |backends| match rules {
        Some(rules) => backends.with_rules(rules),
        None => backends,
    })
}

pub fn ctx() -> inventory_topology::RequestContext {
    inventory_topology::RequestContext::new(TEST_USER)
}

pub fn port(id: &str) -> ObjectRef {
    ObjectRef::new("OpticalPort", id)
}

pub fn electrical_port(id: &str) -> ObjectRef {
    ObjectRef::new("ElectricalPort", id)
}

pub fn optical_link(id: &str) -> ObjectRef {
    ObjectRef::new("OpticalLink", id)
}

pub fn container(id: &str) -> ObjectRef {
    ObjectRef::new("WireContainer", id)
}

pub fn room(id: &str) -> ObjectRef {
    ObjectRef::new("Room", id)
}

pub fn router(id: &str) -> ObjectRef {
    ObjectRef::new("Router", id)
}

pub fn light(class_name: &str, id: &str, name: &str) -> ObjectLight {
    ObjectLight::new(class_name, id, name)
}

pub fn ids(objects: &[ObjectLight]) -> Vec<&str> {
    objects.iter().map(|object| object.id.as_str()).collect()
}
