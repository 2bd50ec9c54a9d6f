//! newsgraph core library
//!
//! Domain records, graph ontology, error taxonomy and retry policy shared by
//! the loader, the HTTP API and the CLI.

pub mod error;
pub mod ingest;
pub mod retry;
pub mod schema;

pub use error::{NewsGraphError, NewsGraphResult};
pub use ingest::{ArticleRecord, CsvSource, GainMetrics, TrafficRecord};
pub use retry::{Backoff, RetryError, RetryPolicy, Transient};
pub use schema::{NodeKind, RelKind, UniqueConstraint};
