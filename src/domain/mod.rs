// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Model
//!
//! Identity of inventory objects, the special relationships that wire them
//! together, and the value objects produced by topology queries.
//!
//! # Relationship Cardinality
//!
//! | name | constraint |
//! |------|------------|
//! | `endpointA` / `endpointB` | one per connection, one (A or B) per port |
//! | `mirror` | 1:1, neither side may already be mirrored |
//! | `mirrorMultiple` | 1:N, each "many" side port holds a single edge |
//! | `uses` | service ↔ resource, read-only here |
//! | `portBelongsToVlan` | port ↔ VLAN, read-only here |
//!
//! Class categories (port, link, container, customer...) are not Rust types.
//! They are resolved at run time through the object store's class hierarchy.

pub mod correlation;
pub mod object;
pub mod outcome;
pub mod relationship;
pub mod resource;

pub use correlation::{group_by_customer, AssetCorrelation, ServiceCorrelation};
pub use object::{ObjectId, ObjectLight, ObjectRef};
pub use outcome::{BatchOutcome, ItemOutcome};
pub use relationship::{ConnectionSide, Endpoint, RelationshipError, RelationshipName};
pub use resource::{HardwareDescriptor, ResourceError, ResourceQuery, ResourceType};
