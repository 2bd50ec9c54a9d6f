//! `GraphStore` backed by Neo4j.
//!
//! Sources are read by the server with `LOAD CSV` and committed in batches
//! with `CALL { ... } IN TRANSACTIONS`. Rows streamed from the loader instead
//! travel as one `$rows` list-of-maps parameter per batch and are expanded
//! server-side with `UNWIND`. Either way, a null value leaves its property
//! unset.

use async_trait::async_trait;
use neo4rs::{BoltFloat, BoltInteger, BoltMap, BoltString, BoltType, Query};
use tracing::{debug, warn};

use newsgraph_core::{
    ArticleRecord, NewsGraphError, NewsGraphResult, NodeKind, RelKind, TrafficRecord,
    UniqueConstraint,
};

use super::{GraphCounts, GraphStore, LoadStep};
use crate::queries::performance::ReporterPerformance;
use crate::GraphClient;

const MERGE_ARTICLES: &str = "
    UNWIND $rows AS row
    MERGE (article:Article {article_id: row.article_id})
        ON CREATE SET article.title = row.title,
                      article.published_at = row.published_at,
                      article.source = row.source,
                      article.lead = row.lead,
                      article.body_content = row.body_content
    MERGE (:Reporter {reporter_name: row.reporter_name})
    MERGE (:Category {category_name: row.category_name})";

const MERGE_WROTE: &str = "
    UNWIND $rows AS row
    MATCH (article:Article {article_id: row.article_id})
    MATCH (reporter:Reporter {reporter_name: row.reporter_name})
    MERGE (reporter)-[:WROTE]->(article)";

const MERGE_CONTAIN: &str = "
    UNWIND $rows AS row
    MATCH (article:Article {article_id: row.article_id})
    MATCH (category:Category {category_name: row.category_name})
    MERGE (category)-[:CONTAIN]->(article)";

const MERGE_TRAFFIC: &str = "
    UNWIND $rows AS row
    MERGE (:Traffic {traffic_date: row.traffic_date})";

const MERGE_GAIN: &str = "
    UNWIND $rows AS row
    MATCH (traffic:Traffic {traffic_date: row.traffic_date})
    MATCH (article:Article {article_id: row.article_id})
    MERGE (article)-[gain:GAIN]->(traffic)
        ON CREATE SET gain.activeUsers = row.activeUsers,
                      gain.sessions = row.sessions,
                      gain.screenPageViews = row.screenPageViews,
                      gain.screenPageViewsPerSession = row.screenPageViewsPerSession,
                      gain.screenPageViewsPerUser = row.screenPageViewsPerUser";

// `LOAD CSV` bodies: cells arrive as strings (null when blank) and are
// coerced the same way the streamed rows are.

const CSV_ARTICLES: &str = "
        MERGE (article:Article {article_id: toInteger(trim(row.article_id))})
            ON CREATE SET article.title = row.title,
                          article.published_at = row.published_at,
                          article.source = row.source,
                          article.lead = row.lead,
                          article.body_content = row.body_content
        MERGE (:Reporter {reporter_name: trim(row.reporter_name)})
        MERGE (:Category {category_name: trim(row.category_name)})";

const CSV_WROTE: &str = "
        MATCH (article:Article {article_id: toInteger(trim(row.article_id))})
        MATCH (reporter:Reporter {reporter_name: trim(row.reporter_name)})
        MERGE (reporter)-[:WROTE]->(article)";

const CSV_CONTAIN: &str = "
        MATCH (article:Article {article_id: toInteger(trim(row.article_id))})
        MATCH (category:Category {category_name: trim(row.category_name)})
        MERGE (category)-[:CONTAIN]->(article)";

const CSV_TRAFFIC: &str = "
        MERGE (:Traffic {traffic_date: trim(row.traffic_date)})";

const CSV_GAIN: &str = "
        MATCH (traffic:Traffic {traffic_date: trim(row.traffic_date)})
        MATCH (article:Article {article_id: toInteger(trim(row.article_id))})
        MERGE (article)-[gain:GAIN]->(traffic)
            ON CREATE SET gain.activeUsers = toInteger(trim(row.activeUsers)),
                          gain.sessions = toInteger(trim(row.sessions)),
                          gain.screenPageViews = toInteger(trim(row.screenPageViews)),
                          gain.screenPageViewsPerSession = toFloat(trim(row.screenPageViewsPerSession)),
                          gain.screenPageViewsPerUser = toFloat(trim(row.screenPageViewsPerUser))";

const REPORTER_SESSIONS: &str = "
    MATCH (reporter:Reporter)
    OPTIONAL MATCH (reporter)-[:WROTE]->(:Article)-[gain:GAIN]->(:Traffic)
    RETURN reporter.reporter_name AS reporter_name,
           coalesce(sum(gain.sessions), 0) AS total_sessions";

fn csv_body(step: LoadStep) -> &'static str {
    match step {
        LoadStep::ArticleNodes => CSV_ARTICLES,
        LoadStep::Authorship => CSV_WROTE,
        LoadStep::Categories => CSV_CONTAIN,
        LoadStep::TrafficNodes => CSV_TRAFFIC,
        LoadStep::TrafficEdges => CSV_GAIN,
    }
}

/// Wrap a step body in `LOAD CSV` with a commit every `batch_size` rows.
fn load_csv_query(step: LoadStep, batch_size: usize) -> String {
    format!(
        "LOAD CSV WITH HEADERS FROM $url AS row
    CALL {{
        WITH row{body}
    }} IN TRANSACTIONS OF {batch_size} ROWS
    RETURN count(*) AS row_count",
        body = csv_body(step),
        batch_size = batch_size.max(1),
    )
}

fn string(value: &str) -> BoltType {
    BoltType::String(BoltString::from(value))
}

fn integer(value: i64) -> BoltType {
    BoltType::Integer(BoltInteger::new(value))
}

fn float(value: f64) -> BoltType {
    BoltType::Float(BoltFloat::new(value))
}

/// Absent entries read as null in Cypher.
fn bolt_map(entries: Vec<(&str, Option<BoltType>)>) -> BoltType {
    BoltType::Map(BoltMap::from_iter(entries.into_iter().filter_map(
        |(key, value)| value.map(|value| (BoltString::from(key), value)),
    )))
}

fn article_rows(rows: &[ArticleRecord]) -> Vec<BoltType> {
    rows.iter()
        .map(|row| {
            bolt_map(vec![
                ("article_id", Some(integer(row.article_id))),
                ("title", row.title.as_deref().map(string)),
                ("published_at", row.published_at.as_deref().map(string)),
                ("source", row.source.as_deref().map(string)),
                ("lead", row.lead.as_deref().map(string)),
                ("body_content", row.body_content.as_deref().map(string)),
                ("reporter_name", Some(string(&row.reporter_name))),
                ("category_name", Some(string(&row.category_name))),
            ])
        })
        .collect()
}

fn traffic_rows(rows: &[TrafficRecord]) -> Vec<BoltType> {
    rows.iter()
        .map(|row| {
            bolt_map(vec![
                ("traffic_date", Some(string(&row.traffic_date))),
                ("article_id", Some(integer(row.article_id))),
                ("activeUsers", row.active_users.map(integer)),
                ("sessions", row.sessions.map(integer)),
                ("screenPageViews", row.screen_page_views.map(integer)),
                ("screenPageViewsPerSession", row.screen_page_views_per_session.map(float)),
                ("screenPageViewsPerUser", row.screen_page_views_per_user.map(float)),
            ])
        })
        .collect()
}

/// Status codes of schema failures that retrying cannot fix, such as
/// existing nodes with duplicate keys. `Neo.TransientError.Schema.*` is not
/// among them.
fn is_schema_failure(code: &str) -> bool {
    code.starts_with("Neo.ClientError.Schema.") || code.starts_with("Neo.DatabaseError.Schema.")
}

fn is_already_exists(code: Option<&str>, message: &str) -> bool {
    let message = message.to_lowercase();
    code.is_some_and(|code| code.ends_with("AlreadyExists"))
        || message.contains("already exists")
        || message.contains("equivalent")
}

/// Outcome of a failed constraint statement: `None` when the constraint is
/// already in place.
fn classify_constraint_error(
    kind: NodeKind,
    code: Option<&str>,
    message: String,
) -> Option<NewsGraphError> {
    if is_already_exists(code, &message) {
        return None;
    }
    match code {
        Some(code) if is_schema_failure(code) => Some(NewsGraphError::SchemaConflict {
            label: kind.label().to_string(),
            message,
        }),
        _ => Some(NewsGraphError::Connectivity(message)),
    }
}

fn server_code(err: &neo4rs::Error) -> Option<&str> {
    match err {
        neo4rs::Error::Neo4j(e) => Some(e.code()),
        _ => None,
    }
}

impl GraphClient {
    async fn write_batch(&self, cypher: &str, rows: Vec<BoltType>, context: &str) -> NewsGraphResult<()> {
        let batch_len = rows.len();
        let query = Query::new(cypher.to_string()).param("rows", rows);
        self.execute(query, context).await?;
        debug!(rows = batch_len, context, "Batch written");
        Ok(())
    }

    async fn count(&self, cypher: String, context: &str) -> NewsGraphResult<usize> {
        let count: i64 = self
            .query_scalar(Query::new(cypher), "count", context)
            .await?
            .unwrap_or(0);
        Ok(count.max(0) as usize)
    }

    async fn count_nodes(&self, kind: NodeKind) -> NewsGraphResult<usize> {
        self.count(
            format!("MATCH (n:{}) RETURN count(n) AS count", kind.label()),
            "counting nodes",
        )
        .await
    }

    async fn count_relationships(&self, kind: RelKind) -> NewsGraphResult<usize> {
        self.count(
            format!("MATCH ()-[r:{}]->() RETURN count(r) AS count", kind.rel_type()),
            "counting relationships",
        )
        .await
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn ensure_unique_constraint(&self, constraint: &UniqueConstraint) -> NewsGraphResult<()> {
        let err = match self.inner().run(Query::new(constraint.cypher())).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        match classify_constraint_error(constraint.kind, server_code(&err), err.to_string()) {
            None => {
                warn!(constraint = constraint.kind.constraint_name(), "Constraint already exists (skipped)");
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    async fn bulk_load(&self, step: LoadStep, url: &str, batch_size: usize) -> NewsGraphResult<Option<usize>> {
        let query = Query::new(load_csv_query(step, batch_size)).param("url", url);
        let rows: i64 = self
            .query_scalar(query, "row_count", "loading CSV on the server")
            .await?
            .unwrap_or(0);
        Ok(Some(rows.max(0) as usize))
    }

    async fn merge_articles(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.write_batch(MERGE_ARTICLES, article_rows(rows), "merging article nodes")
            .await
    }

    async fn merge_wrote(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.write_batch(MERGE_WROTE, article_rows(rows), "merging WROTE relationships")
            .await
    }

    async fn merge_contain(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.write_batch(MERGE_CONTAIN, article_rows(rows), "merging CONTAIN relationships")
            .await
    }

    async fn merge_traffic(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        self.write_batch(MERGE_TRAFFIC, traffic_rows(rows), "merging traffic nodes")
            .await
    }

    async fn merge_gain(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        self.write_batch(MERGE_GAIN, traffic_rows(rows), "merging GAIN relationships")
            .await
    }

    async fn counts(&self) -> NewsGraphResult<GraphCounts> {
        Ok(GraphCounts {
            articles: self.count_nodes(NodeKind::Article).await?,
            reporters: self.count_nodes(NodeKind::Reporter).await?,
            categories: self.count_nodes(NodeKind::Category).await?,
            traffic: self.count_nodes(NodeKind::Traffic).await?,
            wrote: self.count_relationships(RelKind::Wrote).await?,
            contain: self.count_relationships(RelKind::Contain).await?,
            gain: self.count_relationships(RelKind::Gain).await?,
        })
    }

    async fn reporter_sessions(&self) -> NewsGraphResult<Vec<ReporterPerformance>> {
        let context = "reading reporter sessions";
        let rows = self
            .query(Query::new(REPORTER_SESSIONS.to_string()), context)
            .await?;

        rows.into_iter()
            .map(|row| {
                let reporter_name: String = row
                    .get("reporter_name")
                    .map_err(|e| NewsGraphError::store(context, format!("{e:?}")))?;
                let total_sessions: i64 = row
                    .get("total_sessions")
                    .map_err(|e| NewsGraphError::store(context, format!("{e:?}")))?;
                Ok(ReporterPerformance {
                    reporter_name,
                    total_sessions,
                })
            })
            .collect()
    }
}
