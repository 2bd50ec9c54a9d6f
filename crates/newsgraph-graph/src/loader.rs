//! CSV to graph loading pipeline.
//!
//! Steps run strictly in order so that no relationship merge references a
//! node that has not been merged yet:
//!
//! 1. uniqueness constraints
//! 2. Article, Reporter and Category nodes
//! 3. WROTE relationships
//! 4. CONTAIN relationships
//! 5. Traffic nodes
//! 6. GAIN relationships
//!
//! Every step is idempotent, so a failed run is resumed by running it again
//! from the start. Steps 2 to 6 each read their source anew, either inside
//! the store (`LOAD CSV`) or streamed from this host in batches.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use newsgraph_core::{
    ArticleRecord, CsvSource, NewsGraphError, NewsGraphResult, RetryError, RetryPolicy,
    TrafficRecord,
};

use crate::schema;
use crate::store::{GraphStore, LoadStep};

/// Rows sent to the store per write.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// The two tabular inputs of a load.
#[derive(Debug, Clone)]
pub struct LoaderSources {
    pub articles: CsvSource,
    pub traffic: CsvSource,
}

impl LoaderSources {
    pub fn new(articles_location: &str, traffic_location: &str) -> Self {
        Self {
            articles: CsvSource::new("articles", articles_location),
            traffic: CsvSource::new("traffic", traffic_location),
        }
    }
}

/// Who reads the sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ingest {
    /// The store reads each source itself when it can (Neo4j `LOAD CSV`), so
    /// locations resolve on the database server. Stores that cannot read
    /// sources fall back to `Streamed`.
    #[default]
    ServerSide,
    /// The loader reads each source on this host and streams the rows to the
    /// store in batches.
    Streamed,
}

/// Summary of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub attempts: u32,
    pub constraints: usize,
    pub article_rows: usize,
    pub traffic_rows: usize,
    pub elapsed: Duration,
}

/// Loads the articles and traffic sources into a graph store.
pub struct GraphLoader<S> {
    store: S,
    sources: LoaderSources,
    batch_size: usize,
    ingest: Ingest,
}

impl<S: GraphStore> GraphLoader<S> {
    pub fn new(store: S, sources: LoaderSources) -> Self {
        Self {
            store,
            sources,
            batch_size: DEFAULT_BATCH_SIZE,
            ingest: Ingest::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_ingest(mut self, ingest: Ingest) -> Self {
        self.ingest = ingest;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Let the store read `source` for `step` if it can.
    async fn bulk(&self, step: LoadStep, source: &CsvSource) -> NewsGraphResult<Option<usize>> {
        if self.ingest == Ingest::Streamed {
            return Ok(None);
        }
        let url = source.load_csv_url();
        let rows = self.store.bulk_load(step, &url, self.batch_size).await?;
        if rows.is_some() {
            debug!(?step, %url, "Source read by the store");
        }
        Ok(rows)
    }

    /// Step 1: one uniqueness constraint per node kind.
    pub async fn ensure_constraints(&self) -> NewsGraphResult<usize> {
        info!("Setting uniqueness constraints on nodes");
        schema::ensure_constraints(&self.store).await
    }

    /// Step 2: Article nodes with their attributes, plus the Reporter and
    /// Category nodes they reference.
    pub async fn load_article_and_dimension_nodes(&self) -> NewsGraphResult<usize> {
        info!("Loading article nodes");
        if let Some(rows) = self.bulk(LoadStep::ArticleNodes, &self.sources.articles).await? {
            return Ok(rows);
        }
        let mut batches = self.sources.articles.batches::<ArticleRecord>(self.batch_size).await?;
        let mut rows = 0;
        while let Some(batch) = batches.next_batch()? {
            self.store.merge_articles(&batch).await?;
            rows += batch.len();
        }
        Ok(rows)
    }

    /// Step 3: WROTE relationships. Rows without both endpoints are skipped.
    pub async fn load_authorship_edges(&self) -> NewsGraphResult<usize> {
        info!("Loading 'WROTE' relationships");
        if let Some(rows) = self.bulk(LoadStep::Authorship, &self.sources.articles).await? {
            return Ok(rows);
        }
        let mut batches = self.sources.articles.batches::<ArticleRecord>(self.batch_size).await?;
        let mut rows = 0;
        while let Some(batch) = batches.next_batch()? {
            self.store.merge_wrote(&batch).await?;
            rows += batch.len();
        }
        Ok(rows)
    }

    /// Step 4: CONTAIN relationships. Rows without both endpoints are skipped.
    pub async fn load_category_edges(&self) -> NewsGraphResult<usize> {
        info!("Loading 'CONTAIN' relationships");
        if let Some(rows) = self.bulk(LoadStep::Categories, &self.sources.articles).await? {
            return Ok(rows);
        }
        let mut batches = self.sources.articles.batches::<ArticleRecord>(self.batch_size).await?;
        let mut rows = 0;
        while let Some(batch) = batches.next_batch()? {
            self.store.merge_contain(&batch).await?;
            rows += batch.len();
        }
        Ok(rows)
    }

    /// Step 5: Traffic nodes keyed by date.
    pub async fn load_traffic_nodes(&self) -> NewsGraphResult<usize> {
        info!("Loading traffic nodes");
        if let Some(rows) = self.bulk(LoadStep::TrafficNodes, &self.sources.traffic).await? {
            return Ok(rows);
        }
        let mut batches = self.sources.traffic.batches::<TrafficRecord>(self.batch_size).await?;
        let mut rows = 0;
        while let Some(batch) = batches.next_batch()? {
            self.store.merge_traffic(&batch).await?;
            rows += batch.len();
        }
        Ok(rows)
    }

    /// Step 6: GAIN relationships. Metrics are written when the relationship
    /// is created and never overwritten.
    pub async fn load_traffic_edges(&self) -> NewsGraphResult<usize> {
        info!("Loading 'GAIN' relationships");
        if let Some(rows) = self.bulk(LoadStep::TrafficEdges, &self.sources.traffic).await? {
            return Ok(rows);
        }
        let mut batches = self.sources.traffic.batches::<TrafficRecord>(self.batch_size).await?;
        let mut rows = 0;
        while let Some(batch) = batches.next_batch()? {
            self.store.merge_gain(&batch).await?;
            rows += batch.len();
        }
        Ok(rows)
    }

    /// One attempt at the full load.
    pub async fn run(&self) -> NewsGraphResult<LoadReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();

        async {
            let constraints = self.ensure_constraints().await?;

            let article_rows = self.load_article_and_dimension_nodes().await?;
            self.load_authorship_edges().await?;
            self.load_category_edges().await?;

            let traffic_rows = self.load_traffic_nodes().await?;
            self.load_traffic_edges().await?;

            let report = LoadReport {
                run_id,
                started_at,
                attempts: 1,
                constraints,
                article_rows,
                traffic_rows,
                elapsed: clock.elapsed(),
            };
            info!(
                article_rows = report.article_rows,
                traffic_rows = report.traffic_rows,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Graph load complete"
            );
            Ok::<_, NewsGraphError>(report)
        }
        .instrument(tracing::info_span!("graph_load", %run_id))
        .await
    }

    /// Run the full load under `policy`, restarting from step 1 after every
    /// transient failure.
    pub async fn run_with_retry(&self, policy: &RetryPolicy) -> Result<LoadReport, RetryError<NewsGraphError>> {
        policy
            .run(|attempt| async move {
                let mut report = self.run().await?;
                report.attempts = attempt;
                Ok::<_, NewsGraphError>(report)
            })
            .await
    }
}
