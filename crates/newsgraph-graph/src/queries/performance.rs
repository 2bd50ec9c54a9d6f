//! Reporter traffic performance.
//!
//! Ranks reporters by the sessions their articles gained, summed over every
//! `(Reporter)-[:WROTE]->(Article)-[:GAIN]->(Traffic)` path.

use serde::{Deserialize, Serialize};

use newsgraph_core::NewsGraphResult;

use crate::store::GraphStore;

/// Total sessions gained by one reporter's articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterPerformance {
    pub reporter_name: String,
    pub total_sessions: i64,
}

/// The reporter whose articles gained the most sessions.
///
/// Ties go to the alphabetically first name. `None` when the graph holds no
/// reporters.
pub async fn most_productive_reporter<S>(store: &S) -> NewsGraphResult<Option<ReporterPerformance>>
where
    S: GraphStore + ?Sized,
{
    let performances = store.reporter_sessions().await?;
    Ok(performances.into_iter().min_by(|a, b| {
        b.total_sessions
            .cmp(&a.total_sessions)
            .then_with(|| a.reporter_name.cmp(&b.reporter_name))
    }))
}

/// Performance of one reporter, matched case-insensitively.
pub async fn reporter_performance<S>(
    store: &S,
    reporter_name: &str,
) -> NewsGraphResult<Option<ReporterPerformance>>
where
    S: GraphStore + ?Sized,
{
    let wanted = reporter_name.trim().to_lowercase();
    let performances = store.reporter_sessions().await?;
    Ok(performances
        .into_iter()
        .find(|p| p.reporter_name.to_lowercase() == wanted))
}
