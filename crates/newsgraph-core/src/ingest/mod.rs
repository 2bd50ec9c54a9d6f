//! Tabular sources feeding the graph loader.

pub mod model;
pub mod source;

pub use model::{ArticleRecord, GainMetrics, KeyedRecord, TrafficRecord};
pub use source::{parse_records, CsvBatches, CsvSource, SourceLocation};
