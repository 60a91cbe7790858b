// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Descriptor and Side Parsing

use inventory_topology::domain::{
    ConnectionSide, HardwareDescriptor, RelationshipError, ResourceError, ResourceQuery,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// A non-blank name token without the separator
fn token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9/_.-]{1,12}"
}

/// Whitespace padding around a token
fn padding() -> impl Strategy<Value = String> {
    "[ \t]{0,3}"
}

fn padded_token() -> impl Strategy<Value = (String, String)> {
    (padding(), token(), padding()).prop_map(|(before, token, after)| {
        (format!("{before}{token}{after}"), token)
    })
}

fn unknown_resource_type() -> impl Strategy<Value = i32> {
    any::<i32>().prop_filter("known resource types", |value| !(1..=3).contains(value))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: one to three tokens always address hardware at that depth
    #[test]
    fn prop_hardware_depth_matches_token_count(tokens in prop::collection::vec(padded_token(), 1..=3)) {
        let descriptor = tokens.iter().map(|(raw, _)| raw.as_str()).collect::<Vec<_>>().join(";");
        let names: Vec<String> = tokens.into_iter().map(|(_, name)| name).collect();

        let query = ResourceQuery::parse(1, &descriptor).unwrap();
        let expected = match names.as_slice() {
            [device] => HardwareDescriptor::Device { device: device.clone() },
            [device, slot] => HardwareDescriptor::Slot { device: device.clone(), slot: slot.clone() },
            [device, slot, port] => HardwareDescriptor::Port {
                device: device.clone(),
                slot: slot.clone(),
                port: port.clone(),
            },
            _ => unreachable!(),
        };
        prop_assert_eq!(query, ResourceQuery::Hardware(expected));
    }

    /// Property: more than three tokens is never a valid hardware address
    #[test]
    fn prop_deep_hardware_descriptors_are_rejected(tokens in prop::collection::vec(token(), 4..8)) {
        let descriptor = tokens.join(";");
        prop_assert_eq!(
            ResourceQuery::parse(1, &descriptor),
            Err(ResourceError::InvalidDescriptor(descriptor.clone()))
        );
    }

    /// Property: connection names are taken whole, only trimmed
    #[test]
    fn prop_connection_names_are_trimmed(
        (raw, _) in padded_token(),
        suffix in "(;[a-z]{1,4})?",
        logical in any::<bool>(),
    ) {
        let descriptor = format!("{raw}{suffix}");
        let expected_name = descriptor.trim().to_string();

        let query = ResourceQuery::parse(if logical { 2 } else { 3 }, &descriptor).unwrap();
        let name = match query {
            ResourceQuery::LogicalConnection { name } if logical => name,
            ResourceQuery::PhysicalConnection { name } if !logical => name,
            other => return Err(TestCaseError::fail(format!("wrong family: {other:?}"))),
        };
        prop_assert_eq!(name, expected_name);
    }

    /// Property: the resource type is checked before the descriptor
    #[test]
    fn prop_unknown_resource_types_are_rejected(
        resource_type in unknown_resource_type(),
        descriptor in ".{0,20}",
    ) {
        prop_assert_eq!(
            ResourceQuery::parse(resource_type, &descriptor),
            Err(ResourceError::InvalidResourceType(resource_type))
        );
    }

    /// Property: only 1, 2 and 3 name a connection side
    #[test]
    fn prop_side_parsing(value in any::<i32>()) {
        match ConnectionSide::try_from(value) {
            Ok(side) => {
                prop_assert!((1..=3).contains(&value));
                prop_assert_eq!(side.endpoints().len(), if value == 3 { 2 } else { 1 });
            }
            Err(err) => {
                prop_assert!(!(1..=3).contains(&value));
                prop_assert_eq!(err, RelationshipError::InvalidSide(value));
            }
        }
    }
}
