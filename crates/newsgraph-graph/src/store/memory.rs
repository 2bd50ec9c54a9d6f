//! In-process `GraphStore` with the same merge semantics as the Neo4j store.
//!
//! Backs `load --dry-run` and the loader tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use newsgraph_core::{
    ArticleRecord, GainMetrics, NewsGraphResult, NodeKind, TrafficRecord, UniqueConstraint,
};

use super::{GraphCounts, GraphStore};
use crate::queries::performance::ReporterPerformance;

/// Attributes of an Article node as first written. `None` is an unset
/// property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArticle {
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<String>,
    pub lead: Option<String>,
    pub body_content: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    constraints: HashSet<NodeKind>,
    articles: BTreeMap<i64, StoredArticle>,
    reporters: BTreeSet<String>,
    categories: BTreeSet<String>,
    traffic: BTreeSet<String>,
    wrote: BTreeSet<(String, i64)>,
    contain: BTreeSet<(String, i64)>,
    gain: BTreeMap<(i64, String), GainMetrics>,
}

/// Property graph held in memory.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<State>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave a half-applied merge
        // behind, so the poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_constraint(&self, kind: NodeKind) -> bool {
        self.lock().constraints.contains(&kind)
    }

    pub fn article(&self, article_id: i64) -> Option<StoredArticle> {
        self.lock().articles.get(&article_id).cloned()
    }

    pub fn gain(&self, article_id: i64, traffic_date: &str) -> Option<GainMetrics> {
        self.lock()
            .gain
            .get(&(article_id, traffic_date.to_string()))
            .copied()
    }

    pub fn wrote(&self, reporter_name: &str, article_id: i64) -> bool {
        self.lock()
            .wrote
            .contains(&(reporter_name.to_string(), article_id))
    }

    pub fn contains_traffic(&self, traffic_date: &str) -> bool {
        self.lock().traffic.contains(traffic_date)
    }

    fn counts_now(&self) -> GraphCounts {
        let state = self.lock();
        GraphCounts {
            articles: state.articles.len(),
            reporters: state.reporters.len(),
            categories: state.categories.len(),
            traffic: state.traffic.len(),
            wrote: state.wrote.len(),
            contain: state.contain.len(),
            gain: state.gain.len(),
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn ensure_unique_constraint(&self, constraint: &UniqueConstraint) -> NewsGraphResult<()> {
        self.lock().constraints.insert(constraint.kind);
        Ok(())
    }

    async fn merge_articles(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        let mut state = self.lock();
        for row in rows {
            state
                .articles
                .entry(row.article_id)
                .or_insert_with(|| StoredArticle {
                    title: row.title.clone(),
                    published_at: row.published_at.clone(),
                    source: row.source.clone(),
                    lead: row.lead.clone(),
                    body_content: row.body_content.clone(),
                });
            state.reporters.insert(row.reporter_name.clone());
            state.categories.insert(row.category_name.clone());
        }
        Ok(())
    }

    async fn merge_wrote(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        let mut state = self.lock();
        for row in rows {
            if state.articles.contains_key(&row.article_id)
                && state.reporters.contains(&row.reporter_name)
            {
                state.wrote.insert((row.reporter_name.clone(), row.article_id));
            }
        }
        Ok(())
    }

    async fn merge_contain(&self, rows: &[ArticleRecord]) -> NewsGraphResult<()> {
        let mut state = self.lock();
        for row in rows {
            if state.articles.contains_key(&row.article_id)
                && state.categories.contains(&row.category_name)
            {
                state.contain.insert((row.category_name.clone(), row.article_id));
            }
        }
        Ok(())
    }

    async fn merge_traffic(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        let mut state = self.lock();
        for row in rows {
            state.traffic.insert(row.traffic_date.clone());
        }
        Ok(())
    }

    async fn merge_gain(&self, rows: &[TrafficRecord]) -> NewsGraphResult<()> {
        let mut state = self.lock();
        for row in rows {
            if state.articles.contains_key(&row.article_id)
                && state.traffic.contains(&row.traffic_date)
            {
                state
                    .gain
                    .entry((row.article_id, row.traffic_date.clone()))
                    .or_insert_with(|| row.metrics());
            }
        }
        Ok(())
    }

    async fn counts(&self) -> NewsGraphResult<GraphCounts> {
        Ok(self.counts_now())
    }

    async fn reporter_sessions(&self) -> NewsGraphResult<Vec<ReporterPerformance>> {
        let state = self.lock();
        let performances = state
            .reporters
            .iter()
            .map(|reporter| {
                let total_sessions = state
                    .wrote
                    .iter()
                    .filter(|(name, _)| name == reporter)
                    .flat_map(|(_, article_id)| {
                        state
                            .gain
                            .range((*article_id, String::new())..)
                            .take_while(move |((id, _), _)| id == article_id)
                            .filter_map(|(_, metrics)| metrics.sessions)
                    })
                    .sum();
                ReporterPerformance {
                    reporter_name: reporter.clone(),
                    total_sessions,
                }
            })
            .collect();
        Ok(performances)
    }
}
