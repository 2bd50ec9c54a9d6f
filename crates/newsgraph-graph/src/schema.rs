//! Neo4j schema initialization (uniqueness constraints).

use tracing::info;

use newsgraph_core::{NewsGraphResult, UniqueConstraint};

use crate::store::GraphStore;

/// Create one uniqueness constraint per node kind.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses. Stops at the
/// first failure so no data is loaded against an incomplete schema.
pub async fn ensure_constraints<S>(store: &S) -> NewsGraphResult<usize>
where
    S: GraphStore + ?Sized,
{
    let constraints = UniqueConstraint::all();
    for constraint in &constraints {
        store.ensure_unique_constraint(constraint).await?;
    }

    info!("Uniqueness constraints in place ({} node kinds)", constraints.len());
    Ok(constraints.len())
}
