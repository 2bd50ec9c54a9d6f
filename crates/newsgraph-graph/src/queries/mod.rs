//! Read-side queries over the loaded graph.

pub mod performance;

pub use performance::{most_productive_reporter, reporter_performance, ReporterPerformance};
