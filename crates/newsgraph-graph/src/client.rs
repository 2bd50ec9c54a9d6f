//! Neo4j connection client.

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use newsgraph_core::{NewsGraphError, NewsGraphResult};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    "neo4j".to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: default_database(),
        }
    }
}

/// Process-wide handle to the Neo4j connection pool.
///
/// Built once at startup, shared by reference with every component that
/// talks to the graph, and closed explicitly at shutdown.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// neo4rs creates its pool lazily, so a `RETURN 1` ping runs right away to
    /// surface an unreachable server here rather than on the first write.
    pub async fn connect(config: &GraphConfig) -> NewsGraphResult<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(4)
            .fetch_size(200)
            .build()
            .map_err(|e| NewsGraphError::config(format!("invalid Neo4j config: {e}")))?;

        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(|e| NewsGraphError::Connectivity(e.to_string()))?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(|e| NewsGraphError::Connectivity(e.to_string()))?;

        info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query, context: &str) -> NewsGraphResult<()> {
        self.graph
            .run(query)
            .await
            .map_err(|e| NewsGraphError::store(context, e))
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query, context: &str) -> NewsGraphResult<Vec<neo4rs::Row>> {
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| NewsGraphError::store(context, e))?;

        let mut rows = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| NewsGraphError::store(context, e))?
        {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(
        &self,
        query: Query,
        field: &str,
        context: &str,
    ) -> NewsGraphResult<Option<T>> {
        let rows = self.query(query, context).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let val: T = row.get(field).map_err(|e| {
                    NewsGraphError::store(context, format!("field '{field}': {e:?}"))
                })?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Release the pool. Outstanding clones keep their connections until dropped.
    pub fn close(self) {
        drop(self.graph);
        info!("Neo4j connection pool closed");
    }
}
