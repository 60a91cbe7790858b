//! Connectivity topology for network inventory models
//!
//! This crate manages the physical and logical wiring between inventory
//! objects: creating and wiring links and containers, mirroring ports, and
//! answering continuity and service-impact queries. The inventory itself
//! lives behind the collaborator traits in [`store`].

pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod service;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use audit::{ActivityLogEntry, ActivityType, AuditSink, RequestContext};
pub use config::{ClassCatalog, TopologyConfig};
pub use domain::{
    AssetCorrelation, BatchOutcome, ConnectionSide, ItemOutcome, ObjectId, ObjectLight, ObjectRef,
    RelationshipName, ServiceCorrelation,
};
pub use errors::{StoreError, StoreResult, TopologyError, TopologyResult};
pub use service::{
    Backends, ConnectionService, MirrorService, TopologyCorrelator, TopologyServices,
};
