//! Storage seam between the loader and the backing graph.
//!
//! Every write is a merge: create-if-absent, otherwise leave unchanged.
//! Relationship merges only connect endpoints that already exist; rows whose
//! endpoints are missing are skipped without error.
//!
//! A store either receives rows streamed by the loader (`merge_*`) or reads a
//! source itself (`bulk_load`), as Neo4j does with `LOAD CSV`.

pub mod memory;
pub mod neo4j;

use async_trait::async_trait;
use serde::Serialize;

use newsgraph_core::{ArticleRecord, NewsGraphResult, TrafficRecord, UniqueConstraint};

use crate::queries::performance::ReporterPerformance;

pub use memory::{MemoryGraph, StoredArticle};

/// One row-driven load step, steps 2 to 6 of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStep {
    ArticleNodes,
    Authorship,
    Categories,
    TrafficNodes,
    TrafficEdges,
}

impl LoadStep {
    pub const ALL: [LoadStep; 5] = [
        LoadStep::ArticleNodes,
        LoadStep::Authorship,
        LoadStep::Categories,
        LoadStep::TrafficNodes,
        LoadStep::TrafficEdges,
    ];
}

/// A property graph the loader can write into.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create the constraint unless it already exists.
    async fn ensure_unique_constraint(&self, constraint: &UniqueConstraint) -> NewsGraphResult<()>;

    /// Run `step` over the CSV at `url`, read by the store itself, committing
    /// every `batch_size` rows. Returns the number of rows read, or `None`
    /// when the store cannot read sources and needs the rows streamed in.
    async fn bulk_load(&self, _step: LoadStep, _url: &str, _batch_size: usize) -> NewsGraphResult<Option<usize>> {
        Ok(None)
    }

    /// Article nodes (attributes set on create only) plus the Reporter and
    /// Category nodes each row references.
    async fn merge_articles(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()>;

    /// `(Reporter)-[:WROTE]->(Article)` for each row.
    async fn merge_wrote(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()>;

    /// `(Category)-[:CONTAIN]->(Article)` for each row.
    async fn merge_contain(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()>;

    /// One Traffic node per date.
    async fn merge_traffic(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()>;

    /// `(Article)-[:GAIN]->(Traffic)` with metrics set on create only.
    async fn merge_gain(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()>;

    async fn counts(&self) -> NewsGraphResult<GraphCounts>;

    /// Total sessions per reporter, including reporters without traffic.
    async fn reporter_sessions(&self) -> NewsGraphResult<Vec<ReporterPerformance>>;
}

/// Node and relationship counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub articles: usize,
    pub reporters: usize,
    pub categories: usize,
    pub traffic: usize,
    pub wrote: usize,
    pub contain: usize,
    pub gain: usize,
}

impl GraphCounts {
    pub fn nodes(&self) -> usize {
        self.articles + self.reporters + self.categories + self.traffic
    }

    pub fn relationships(&self) -> usize {
        self.wrote + self.contain + self.gain
    }
}
