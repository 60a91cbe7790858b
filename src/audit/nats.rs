// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS activity log sink
//!
//! Publishes each entry as JSON on `<prefix>.<activity>`, e.g.
//! `inventory.audit.create_relationship`.

use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::{ActivityLogEntry, AuditError, AuditSink};

/// Configuration for the NATS audit connection
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Subject prefix for audit entries
    pub subject_prefix: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "inventory-topology".to_string(),
            connect_timeout: Duration::from_secs(10),
            subject_prefix: "inventory.audit".to_string(),
        }
    }
}

impl NatsConfig {
    /// Subject an entry is published on
    pub fn subject_for(&self, entry: &ActivityLogEntry) -> String {
        format!("{}.{}", self.subject_prefix, entry.activity.as_str())
    }
}

/// Publishes activity log entries to NATS
#[derive(Clone)]
pub struct NatsAuditSink {
    client: Client,
    config: NatsConfig,
}

impl NatsAuditSink {
    /// Connect to NATS with the given configuration
    pub async fn connect(config: NatsConfig) -> Result<Self, AuditError> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout);

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| AuditError::Nats(e.to_string()))?;

        info!("Audit sink connected to NATS at {:?}", config.servers);

        Ok(Self { client, config })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client, config: NatsConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AuditSink for NatsAuditSink {
    async fn record(&self, entry: ActivityLogEntry) -> Result<(), AuditError> {
        let subject = self.config.subject_for(&entry);
        let payload = serde_json::to_vec(&entry)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| AuditError::Nats(e.to_string()))?;

        debug!("Published activity {} to {}", entry.entry_id, subject);
        Ok(())
    }
}
