//! # newsgraph graph
//!
//! Neo4j integration for the news knowledge graph.
//!
//! Provides the connection client, the `GraphStore` seam with Neo4j and
//! in-memory implementations, the CSV loader and the reporter analytics.

pub mod client;
pub mod loader;
pub mod queries;
pub mod schema;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::{GraphClient, GraphConfig};
pub use loader::{GraphLoader, Ingest, LoadReport, LoaderSources, DEFAULT_BATCH_SIZE};
pub use queries::{most_productive_reporter, reporter_performance, ReporterPerformance};
pub use store::{GraphCounts, GraphStore, LoadStep, MemoryGraph};
