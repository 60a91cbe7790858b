// Copyright (c) 2025 - Cowboy AI, Inc.
//! Neo4j Relationship Store
//!
//! Special relationships persisted in a Neo4j graph.
//!
//! # Graph Model
//!
//! ```text
//! (:InventoryObject {_uuid, className, name})
//!     -[:RELATED_TO_SPECIAL {name}]->
//! (:InventoryObject {_uuid, className, name})
//! ```
//!
//! The relationship `name` property carries the wire name
//! (`endpointA`, `mirror`, `uses`, ...). Guarded writes run as a single
//! statement, so the "endpoint free" check and the insert can not be split
//! by another writer.

use async_trait::async_trait;
use neo4rs::{Graph, Query};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::{EdgeWrite, PathFinder, RelationshipStore};
use crate::domain::{ObjectLight, ObjectRef, RelationshipName};
use crate::errors::{StoreError, StoreResult};

/// Neo4j connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Neo4j URI (e.g., "bolt://localhost:7687")
    pub uri: String,

    /// Username for authentication
    pub user: String,

    /// Password for authentication
    pub password: String,
}

impl Neo4jConfig {
    pub fn new(uri: String, user: String, password: String) -> Self {
        Self { uri, user, password }
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
        }
    }
}

const GUARDED_CREATE: &str = r#"
MATCH (source:InventoryObject {_uuid: $source_id, className: $source_class})
MATCH (target:InventoryObject {_uuid: $target_id, className: $target_class})
WHERE NOT EXISTS {
        MATCH (source)-[r:RELATED_TO_SPECIAL]-() WHERE r.name IN $source_free_of
    }
  AND NOT EXISTS {
        MATCH (target)-[r:RELATED_TO_SPECIAL]-() WHERE r.name IN $target_free_of
    }
CREATE (source)-[:RELATED_TO_SPECIAL {name: $name}]->(target)
RETURN count(*) AS created
"#;

const EDGE_COUNT: &str = r#"
MATCH (o:InventoryObject {_uuid: $id, className: $class})
OPTIONAL MATCH (o)-[r:RELATED_TO_SPECIAL]-() WHERE r.name IN $names
RETURN count(r) AS edges
"#;

const TARGETS: &str = r#"
MATCH (o:InventoryObject {_uuid: $id, className: $class})-[r:RELATED_TO_SPECIAL {name: $name}]-(t:InventoryObject)
RETURN t._uuid AS id, t.className AS class_name, t.name AS name
ORDER BY id
"#;

const RELEASE_EDGE: &str = r#"
MATCH (o:InventoryObject {_uuid: $id, className: $class})-[r:RELATED_TO_SPECIAL {name: $name}]-(t:InventoryObject {_uuid: $target_id})
DELETE r
"#;

const RELEASE_EDGES: &str = r#"
MATCH (o:InventoryObject {_uuid: $id, className: $class})-[r:RELATED_TO_SPECIAL]-()
WHERE r.name IN $names
DELETE r
"#;

const PHYSICAL_PATH: &str = r#"
MATCH path = (port:InventoryObject {_uuid: $id})-[:RELATED_TO_SPECIAL*1..]-(:InventoryObject)
WHERE all(r IN relationships(path) WHERE r.name IN $names)
WITH path ORDER BY length(path) DESC LIMIT 1
RETURN [n IN nodes(path) | n._uuid] AS ids,
       [n IN nodes(path) | n.className] AS classes,
       [n IN nodes(path) | n.name] AS names
"#;

fn wire_names(names: &[RelationshipName]) -> Vec<String> {
    names.iter().map(|name| name.as_str().to_string()).collect()
}

/// Relationship store and path-finder backed by Neo4j
#[derive(Clone)]
pub struct Neo4jRelationshipStore {
    graph: Arc<Graph>,
}

impl Neo4jRelationshipStore {
    /// Connect to Neo4j
    pub async fn connect(config: &Neo4jConfig) -> StoreResult<Self> {
        info!("Connecting to Neo4j at {}", config.uri);
        let graph = Graph::new(&config.uri, &config.user, &config.password)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to Neo4j: {}", e)))?;
        Ok(Self::with_graph(Arc::new(graph)))
    }

    /// Use an existing graph handle
    pub fn with_graph(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Create the lookup index on object ids
    pub async fn initialize(&self) -> StoreResult<()> {
        self.graph
            .run(Query::new(
                "CREATE INDEX inventory_object_uuid IF NOT EXISTS FOR (o:InventoryObject) ON (o._uuid)"
                    .to_string(),
            ))
            .await?;
        Ok(())
    }

    async fn count_edges(&self, object: &ObjectRef, names: &[RelationshipName]) -> StoreResult<Option<usize>> {
        let query = Query::new(EDGE_COUNT.to_string())
            .param("id", object.id.as_str())
            .param("class", object.class_name.as_str())
            .param("names", wire_names(names));

        let mut result = self.graph.execute(query).await?;
        match result.next().await? {
            Some(row) => {
                let edges: i64 = row.get("edges").unwrap_or_default();
                Ok(Some(usize::try_from(edges).unwrap_or_default()))
            }
            None => Ok(None),
        }
    }

    async fn require_edges(&self, object: &ObjectRef, names: &[RelationshipName]) -> StoreResult<usize> {
        self.count_edges(object, names)
            .await?
            .ok_or_else(|| StoreError::ObjectNotFound(object.clone()))
    }

    /// Work out why a guarded create matched nothing
    async fn explain_rejected_write(&self, edge: &EdgeWrite) -> StoreError {
        let sides = [
            (&edge.source, &edge.guard.source_free_of),
            (&edge.target, &edge.guard.target_free_of),
        ];
        for (object, guard) in sides {
            match self.count_edges(object, &[]).await {
                Ok(None) => return StoreError::ObjectNotFound(object.clone()),
                Err(err) => return err,
                Ok(Some(_)) => {}
            }
            for name in guard {
                match self.count_edges(object, &[*name]).await {
                    Ok(Some(count)) if count > 0 => {
                        return StoreError::Conflict {
                            object: object.clone(),
                            name: *name,
                        }
                    }
                    Err(err) => return err,
                    _ => {}
                }
            }
        }
        StoreError::Backend(format!("{} edge between {} and {} was not created", edge.name, edge.source, edge.target))
    }
}

#[async_trait]
impl RelationshipStore for Neo4jRelationshipStore {
    async fn create_edge(&self, edge: &EdgeWrite) -> StoreResult<()> {
        let query = Query::new(GUARDED_CREATE.to_string())
            .param("source_id", edge.source.id.as_str())
            .param("source_class", edge.source.class_name.as_str())
            .param("target_id", edge.target.id.as_str())
            .param("target_class", edge.target.class_name.as_str())
            .param("source_free_of", wire_names(&edge.guard.source_free_of))
            .param("target_free_of", wire_names(&edge.guard.target_free_of))
            .param("name", edge.name.as_str());

        let mut result = self.graph.execute(query).await?;
        let created: i64 = match result.next().await? {
            Some(row) => row.get("created").unwrap_or_default(),
            None => 0,
        };

        if created == 0 {
            return Err(self.explain_rejected_write(edge).await);
        }

        debug!("Created {} edge {} -> {}", edge.name, edge.source, edge.target);
        Ok(())
    }

    async fn has_edge(
        &self,
        object: &ObjectRef,
        name: RelationshipName,
        min_count: usize,
    ) -> StoreResult<bool> {
        Ok(self.require_edges(object, &[name]).await? >= min_count)
    }

    async fn get_targets(
        &self,
        object: &ObjectRef,
        name: RelationshipName,
    ) -> StoreResult<Vec<ObjectLight>> {
        self.require_edges(object, &[]).await?;

        let query = Query::new(TARGETS.to_string())
            .param("id", object.id.as_str())
            .param("class", object.class_name.as_str())
            .param("name", name.as_str());

        let mut result = self.graph.execute(query).await?;
        let mut targets = Vec::new();
        while let Some(row) = result.next().await? {
            let id: String = row.get("id").unwrap_or_default();
            let class_name: String = row.get("class_name").unwrap_or_default();
            let name: String = row.get("name").unwrap_or_default();
            targets.push(ObjectLight::new(class_name, id, name));
        }
        Ok(targets)
    }

    async fn release_edge(
        &self,
        object: &ObjectRef,
        target: &ObjectRef,
        name: RelationshipName,
    ) -> StoreResult<()> {
        let query = Query::new(RELEASE_EDGE.to_string())
            .param("id", object.id.as_str())
            .param("class", object.class_name.as_str())
            .param("target_id", target.id.as_str())
            .param("name", name.as_str());
        self.graph.run(query).await?;

        debug!("Released {} edge {} -> {}", name, object, target);
        Ok(())
    }

    async fn release_edges(
        &self,
        object: &ObjectRef,
        names: &[RelationshipName],
    ) -> StoreResult<()> {
        let query = Query::new(RELEASE_EDGES.to_string())
            .param("id", object.id.as_str())
            .param("class", object.class_name.as_str())
            .param("names", wire_names(names));
        self.graph.run(query).await?;
        Ok(())
    }
}

#[async_trait]
impl PathFinder for Neo4jRelationshipStore {
    async fn physical_path(&self, port: &ObjectRef) -> StoreResult<Vec<ObjectLight>> {
        let query = Query::new(PHYSICAL_PATH.to_string())
            .param("id", port.id.as_str())
            .param("names", wire_names(&RelationshipName::PHYSICAL_PATH));

        let mut result = self.graph.execute(query).await?;
        let Some(row) = result.next().await? else {
            return Ok(Vec::new());
        };

        let ids: Vec<String> = row.get("ids").unwrap_or_default();
        let classes: Vec<String> = row.get("classes").unwrap_or_default();
        let names: Vec<String> = row.get("names").unwrap_or_default();
        if ids.len() != classes.len() || ids.len() != names.len() {
            return Err(StoreError::Serialization(
                "physical path columns have different lengths".to_string(),
            ));
        }

        Ok(ids
            .into_iter()
            .zip(classes)
            .zip(names)
            .map(|((id, class_name), name)| ObjectLight::new(class_name, id, name))
            .collect())
    }
}
