//! Loader scenarios against the in-memory graph store.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use newsgraph_core::{
    ArticleRecord, NewsGraphError, NewsGraphResult, NodeKind, RetryError, RetryPolicy,
    TrafficRecord, UniqueConstraint,
};
use newsgraph_graph::{
    GraphCounts, GraphLoader, GraphStore, LoaderSources, MemoryGraph, ReporterPerformance,
};

const ARTICLES_HEADER: &str =
    "article_id,title,published_at,source,lead,body_content,reporter_name,category_name";
const TRAFFIC_HEADER: &str = "traffic_date,article_id,activeUsers,sessions,screenPageViews,screenPageViewsPerSession,screenPageViewsPerUser";

fn csv_file(header: &str, rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "{header}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn sources(articles: &NamedTempFile, traffic: &NamedTempFile) -> LoaderSources {
    LoaderSources::new(
        articles.path().to_str().unwrap(),
        traffic.path().to_str().unwrap(),
    )
}

fn no_delay(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::fixed(max_attempts, Duration::ZERO)
}

fn sample_articles() -> NamedTempFile {
    csv_file(
        ARTICLES_HEADER,
        &[
            "1,Rates rise,2024-03-01 08:00:00,Wire,Lead one,Body one,Ana Silva,Economy",
            "2,Storm warning,2024-03-02 09:00:00,Desk,Lead two,Body two,Ben Ortiz,Weather",
            "3,Markets calm,2024-03-02 10:00:00,Wire,Lead three,Body three,Ana Silva,Economy",
        ],
    )
}

fn sample_traffic() -> NamedTempFile {
    csv_file(
        TRAFFIC_HEADER,
        &[
            "2024-03-01,1,100,120,240,2.0,2.4",
            "2024-03-02,1,80,90,180,2.0,2.25",
            "2024-03-02,2,50,60,90,1.5,1.8",
        ],
    )
}

#[tokio::test]
async fn full_load_builds_expected_graph() {
    let articles = sample_articles();
    let traffic = sample_traffic();
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    let report = loader.run().await.unwrap();
    assert_eq!(report.constraints, 4);
    assert_eq!(report.article_rows, 3);
    assert_eq!(report.traffic_rows, 3);

    let counts = loader.store().counts().await.unwrap();
    assert_eq!(
        counts,
        GraphCounts {
            articles: 3,
            reporters: 2,
            categories: 2,
            traffic: 2,
            wrote: 3,
            contain: 3,
            gain: 3,
        }
    );
    for kind in NodeKind::ALL {
        assert!(loader.store().has_constraint(kind), "missing constraint on {kind}");
    }
}

#[tokio::test]
async fn loading_twice_is_idempotent() {
    let articles = sample_articles();
    let traffic = sample_traffic();
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    loader.run().await.unwrap();
    let once = loader.store().counts().await.unwrap();
    loader.run().await.unwrap();
    let twice = loader.store().counts().await.unwrap();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn small_batches_match_single_batch() {
    let articles = sample_articles();
    let traffic = sample_traffic();

    let batched = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic)).with_batch_size(1);
    batched.run().await.unwrap();
    let whole = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));
    whole.run().await.unwrap();

    assert_eq!(
        batched.store().counts().await.unwrap(),
        whole.store().counts().await.unwrap()
    );
}

#[tokio::test]
async fn edges_before_nodes_create_nothing() {
    let articles = sample_articles();
    let traffic = sample_traffic();
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    assert_eq!(loader.load_authorship_edges().await.unwrap(), 3);
    assert_eq!(loader.load_category_edges().await.unwrap(), 3);
    assert_eq!(loader.load_traffic_edges().await.unwrap(), 3);
    assert_eq!(loader.store().counts().await.unwrap(), GraphCounts::default());
}

#[tokio::test]
async fn gain_metrics_are_create_only() {
    let articles = sample_articles();
    let first = csv_file(TRAFFIC_HEADER, &["2024-03-01,1,100,120,240,2.0,2.4"]);
    let second = csv_file(TRAFFIC_HEADER, &["2024-03-01,1,999,999,999,9.9,9.9"]);

    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &first));
    loader.run().await.unwrap();
    let store = loader.into_store();

    let reload = GraphLoader::new(store, sources(&articles, &second));
    reload.run().await.unwrap();

    let metrics = reload.store().gain(1, "2024-03-01").unwrap();
    assert_eq!(metrics.active_users, Some(100));
    assert_eq!(metrics.sessions, Some(120));
    assert_eq!(metrics.screen_page_views, Some(240));
    assert_eq!(metrics.screen_page_views_per_session, Some(2.0));
    assert_eq!(metrics.screen_page_views_per_user, Some(2.4));
}

#[tokio::test]
async fn blank_and_fractional_metrics_still_create_gain() {
    let articles = sample_articles();
    let traffic = csv_file(
        TRAFFIC_HEADER,
        &["2024-03-01,1,100.0,,240,2.0,2.4", "2024-03-02,2,50,60.0,90,,"],
    );
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    let report = loader.run_with_retry(&no_delay(1)).await.unwrap();
    assert_eq!(report.attempts, 1);
    assert_eq!(report.traffic_rows, 2);

    let counts = loader.store().counts().await.unwrap();
    assert_eq!(counts.traffic, 2);
    assert_eq!(counts.gain, 2);

    let first = loader.store().gain(1, "2024-03-01").unwrap();
    assert_eq!(first.active_users, Some(100));
    assert_eq!(first.sessions, None);
    assert_eq!(first.screen_page_views, Some(240));

    let second = loader.store().gain(2, "2024-03-02").unwrap();
    assert_eq!(second.sessions, Some(60));
    assert_eq!(second.screen_page_views_per_session, None);
    assert_eq!(second.screen_page_views_per_user, None);
}

#[tokio::test]
async fn blank_attributes_stay_unset_and_text_is_verbatim() {
    let articles = csv_file(
        ARTICLES_HEADER,
        &["1,  Padded title ,,Wire,,\"  Body, with comma \", Ana ,Economy"],
    );
    let traffic = csv_file(TRAFFIC_HEADER, &[]);
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    loader.run().await.unwrap();

    let article = loader.store().article(1).unwrap();
    assert_eq!(article.title.as_deref(), Some("  Padded title "));
    assert_eq!(article.published_at, None);
    assert_eq!(article.lead, None);
    assert_eq!(article.body_content.as_deref(), Some("  Body, with comma "));
    assert!(loader.store().wrote("Ana", 1));
}

#[tokio::test]
async fn article_attributes_are_not_overwritten() {
    let original = csv_file(ARTICLES_HEADER, &["1,Original,2024-03-01,Wire,Lead,Body,Ana,Economy"]);
    let edited = csv_file(ARTICLES_HEADER, &["1,Edited,2024-04-01,Desk,New lead,New body,Ana,Economy"]);
    let traffic = csv_file(TRAFFIC_HEADER, &[]);

    let loader = GraphLoader::new(MemoryGraph::new(), sources(&original, &traffic));
    loader.run().await.unwrap();
    let reload = GraphLoader::new(loader.into_store(), sources(&edited, &traffic));
    reload.run().await.unwrap();

    let article = reload.store().article(1).unwrap();
    assert_eq!(article.title.as_deref(), Some("Original"));
    assert_eq!(article.published_at.as_deref(), Some("2024-03-01"));
    assert_eq!(article.body_content.as_deref(), Some("Body"));
}

#[tokio::test]
async fn single_article_without_traffic() {
    let articles = csv_file(ARTICLES_HEADER, &["1,T,2024-03-01,S,L,B,R,C"]);
    let traffic = csv_file(TRAFFIC_HEADER, &[]);
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    loader.run().await.unwrap();

    let counts = loader.store().counts().await.unwrap();
    assert_eq!(
        counts,
        GraphCounts {
            articles: 1,
            reporters: 1,
            categories: 1,
            traffic: 0,
            wrote: 1,
            contain: 1,
            gain: 0,
        }
    );
    assert!(loader.store().wrote("R", 1));
}

#[tokio::test]
async fn traffic_for_unknown_article_creates_no_gain() {
    let articles = csv_file(ARTICLES_HEADER, &["1,T,2024-03-01,S,L,B,R,C"]);
    let traffic = csv_file(TRAFFIC_HEADER, &["2024-03-05,42,10,10,10,1.0,1.0"]);
    let loader = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));

    loader.run().await.unwrap();

    let counts = loader.store().counts().await.unwrap();
    assert_eq!(counts.traffic, 1);
    assert_eq!(counts.gain, 0);
    assert!(loader.store().contains_traffic("2024-03-05"));
    assert!(loader.store().gain(42, "2024-03-05").is_none());
}

/// Fails the first `outages` runs at their first store call.
struct FlakyStore {
    inner: MemoryGraph,
    outages: AtomicU32,
    constraint_calls: AtomicU32,
}

impl FlakyStore {
    fn new(outages: u32) -> Self {
        Self {
            inner: MemoryGraph::new(),
            outages: AtomicU32::new(outages),
            constraint_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl GraphStore for FlakyStore {
    async fn ensure_unique_constraint(&self, constraint: &UniqueConstraint) -> NewsGraphResult<()> {
        self.constraint_calls.fetch_add(1, Ordering::SeqCst);
        if constraint.kind == NodeKind::Article {
            let remaining = self.outages.load(Ordering::SeqCst);
            if remaining > 0 {
                self.outages.store(remaining - 1, Ordering::SeqCst);
                return Err(NewsGraphError::Connectivity("connection refused".to_string()));
            }
        }
        self.inner.ensure_unique_constraint(constraint).await
    }

    async fn merge_articles(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.inner.merge_articles(rows).await
    }

    async fn merge_wrote(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.inner.merge_wrote(rows).await
    }

    async fn merge_contain(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.inner.merge_contain(rows).await
    }

    async fn merge_traffic(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        self.inner.merge_traffic(rows).await
    }

    async fn merge_gain(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        self.inner.merge_gain(rows).await
    }

    async fn counts(&self) -> NewsGraphResult<GraphCounts> {
        self.inner.counts().await
    }

    async fn reporter_sessions(&self) -> NewsGraphResult<Vec<ReporterPerformance>> {
        self.inner.reporter_sessions().await
    }
}

#[tokio::test]
async fn retries_through_unreachable_store() {
    let articles = sample_articles();
    let traffic = sample_traffic();

    let flaky = GraphLoader::new(FlakyStore::new(3), sources(&articles, &traffic));
    let report = flaky.run_with_retry(&no_delay(10)).await.unwrap();
    assert_eq!(report.attempts, 4);

    let clean = GraphLoader::new(MemoryGraph::new(), sources(&articles, &traffic));
    clean.run().await.unwrap();

    assert_eq!(
        flaky.store().counts().await.unwrap(),
        clean.store().counts().await.unwrap()
    );
}

#[tokio::test]
async fn retry_budget_exhaustion_propagates() {
    let articles = sample_articles();
    let traffic = sample_traffic();
    let loader = GraphLoader::new(FlakyStore::new(5), sources(&articles, &traffic));

    let err = loader.run_with_retry(&no_delay(3)).await.unwrap_err();

    assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
    assert!(matches!(err.into_inner(), NewsGraphError::Connectivity(_)));
    assert_eq!(loader.store().counts().await.unwrap(), GraphCounts::default());
}

/// Rejects constraint creation the way a store holding duplicate keys does.
struct ConflictingStore {
    inner: MemoryGraph,
    attempts: AtomicU32,
}

#[async_trait]
impl GraphStore for ConflictingStore {
    async fn ensure_unique_constraint(&self, constraint: &UniqueConstraint) -> NewsGraphResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NewsGraphError::SchemaConflict {
            label: constraint.kind.label().to_string(),
            message: "existing nodes share the key".to_string(),
        })
    }

    async fn merge_articles(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.inner.merge_articles(rows).await
    }

    async fn merge_wrote(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.inner.merge_wrote(rows).await
    }

    async fn merge_contain(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        self.inner.merge_contain(rows).await
    }

    async fn merge_traffic(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        self.inner.merge_traffic(rows).await
    }

    async fn merge_gain(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        self.inner.merge_gain(rows).await
    }

    async fn counts(&self) -> NewsGraphResult<GraphCounts> {
        self.inner.counts().await
    }

    async fn reporter_sessions(&self) -> NewsGraphResult<Vec<ReporterPerformance>> {
        self.inner.reporter_sessions().await
    }
}

#[tokio::test]
async fn schema_conflict_aborts_without_loading() {
    let articles = sample_articles();
    let traffic = sample_traffic();
    let store = ConflictingStore {
        inner: MemoryGraph::new(),
        attempts: AtomicU32::new(0),
    };
    let loader = GraphLoader::new(store, sources(&articles, &traffic));

    let err = loader.run_with_retry(&no_delay(10)).await.unwrap_err();

    assert!(matches!(err, RetryError::Aborted { attempt: 1, .. }));
    assert_eq!(loader.store().attempts.load(Ordering::SeqCst), 1);
    assert_eq!(loader.store().counts().await.unwrap(), GraphCounts::default());
}

#[tokio::test]
async fn malformed_rows_are_retried_until_exhausted() {
    let articles = csv_file(ARTICLES_HEADER, &["not-a-number,T,2024-03-01,S,L,B,R,C"]);
    let traffic = csv_file(TRAFFIC_HEADER, &[]);
    let loader = GraphLoader::new(FlakyStore::new(0), sources(&articles, &traffic));

    let err = loader.run_with_retry(&no_delay(3)).await.unwrap_err();

    assert_eq!(err.attempts(), 3);
    assert!(matches!(err.into_inner(), NewsGraphError::MalformedRow { .. }));
    assert_eq!(loader.store().counts().await.unwrap(), GraphCounts::default());
    // Constraints are set on every attempt before the source is read.
    assert_eq!(loader.store().constraint_calls.load(Ordering::SeqCst), 12);
}
