// Copyright (c) 2025 - Cowboy AI, Inc.
//! Correlated impact information
//!
//! Impact analysis answers "which services break if this resource fails",
//! grouped by the customer that owns each service.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::ObjectLight;

/// Services of a single customer affected by a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCorrelation {
    pub customer: ObjectLight,
    pub services: Vec<ObjectLight>,
}

/// Result of an impact query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCorrelation {
    /// Inventory objects the query resolved to (devices, ports, connections)
    pub inventory_objects: Vec<ObjectLight>,
    /// One entry per affected customer
    pub services: Vec<ServiceCorrelation>,
}

impl AssetCorrelation {
    pub fn new(inventory_objects: Vec<ObjectLight>, services: Vec<ServiceCorrelation>) -> Self {
        Self {
            inventory_objects,
            services,
        }
    }

    /// Correlation for the given customer, if any of its services is affected
    pub fn for_customer(&self, customer: &ObjectLight) -> Option<&ServiceCorrelation> {
        self.services.iter().find(|entry| &entry.customer == customer)
    }

    pub fn affected_service_count(&self) -> usize {
        self.services.iter().map(|entry| entry.services.len()).sum()
    }
}

/// Group `(customer, service)` pairs into one correlation per customer
///
/// Customers and their services come out sorted; a service reached
/// through several resources appears once.
pub fn group_by_customer(
    pairs: impl IntoIterator<Item = (ObjectLight, ObjectLight)>,
) -> Vec<ServiceCorrelation> {
    let mut grouped: BTreeMap<ObjectLight, BTreeSet<ObjectLight>> = BTreeMap::new();
    for (customer, service) in pairs {
        grouped.entry(customer).or_default().insert(service);
    }

    grouped
        .into_iter()
        .map(|(customer, services)| ServiceCorrelation {
            customer,
            services: services.into_iter().collect(),
        })
        .collect()
}
