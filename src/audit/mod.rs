// Copyright (c) 2025 - Cowboy AI, Inc.
//! Activity Log
//!
//! Every topology mutation emits an [`ActivityLogEntry`]. Entries go to an
//! [`AuditSink`]; recording is fire-and-forget from the caller's point of
//! view, so a failing sink is logged and never fails the operation.
//!
//! # Sinks
//!
//! - [`TracingAuditSink`]: writes entries as structured `tracing` events
//! - [`MemoryAuditSink`]: keeps entries in memory (tests, embedding)
//! - [`nats::NatsAuditSink`]: publishes JSON entries on NATS subjects

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ObjectRef;

pub mod nats;

pub use nats::{NatsAuditSink, NatsConfig};

/// Audit sink errors
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("NATS error: {0}")]
    Nats(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Who is asking, and under which correlation id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user: String,
    pub correlation_id: Uuid,
}

impl RequestContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            correlation_id: Uuid::now_v7(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }
}

/// Kind of recorded activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    CreateInventoryObject,
    DeleteInventoryObject,
    CreateRelationship,
    ReleaseRelationship,
}

impl ActivityType {
    /// Subject token used when publishing the entry
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::CreateInventoryObject => "create_inventory_object",
            ActivityType::DeleteInventoryObject => "delete_inventory_object",
            ActivityType::CreateRelationship => "create_relationship",
            ActivityType::ReleaseRelationship => "release_relationship",
        }
    }
}

/// One append-only activity log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub entry_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub correlation_id: Uuid,
    pub activity: ActivityType,
    pub object: Option<ObjectRef>,
    pub affected_property: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub notes: Option<String>,
}

impl ActivityLogEntry {
    pub fn new(ctx: &RequestContext, activity: ActivityType) -> Self {
        Self {
            entry_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            user: ctx.user.clone(),
            correlation_id: ctx.correlation_id,
            activity,
            object: None,
            affected_property: None,
            old_value: None,
            new_value: None,
            notes: None,
        }
    }

    pub fn object(mut self, object: &ObjectRef) -> Self {
        self.object = Some(object.clone());
        self
    }

    /// Record a property change, old and new values as recorded strings
    pub fn change(
        mut self,
        property: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.affected_property = Some(property.into());
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Append-only destination for activity log entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), AuditError>;
}

/// Writes entries to the tracing pipeline
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), AuditError> {
        info!(
            target: "inventory_topology::audit",
            entry_id = %entry.entry_id,
            user = %entry.user,
            correlation_id = %entry.correlation_id,
            activity = entry.activity.as_str(),
            object = ?entry.object,
            property = ?entry.affected_property,
            old_value = ?entry.old_value,
            new_value = ?entry.new_value,
            notes = ?entry.notes,
            "activity recorded"
        );
        Ok(())
    }
}

/// Keeps every entry in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
    entries: Arc<RwLock<Vec<ActivityLogEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries, oldest first
    pub async fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_of(&self, activity: ActivityType) -> Vec<ActivityLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.activity == activity)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), AuditError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}
