//! CSV sources addressed by URL or filesystem path.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::model::KeyedRecord;
use crate::error::{NewsGraphError, NewsGraphResult};

/// Where a tabular source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    Path(PathBuf),
}

impl SourceLocation {
    /// `http(s)://` locations are fetched over HTTP, `file://` URLs and bare
    /// strings are read from the local filesystem.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else if let Some(path) = raw.strip_prefix("file://") {
            Self::Path(PathBuf::from(path))
        } else {
            Self::Path(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A named CSV source with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    name: String,
    raw: String,
    location: SourceLocation,
}

impl CsvSource {
    pub fn new(name: impl Into<String>, location: &str) -> Self {
        Self {
            name: name.into(),
            raw: location.trim().to_string(),
            location: SourceLocation::parse(location),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// The location as a `LOAD CSV` URL, resolved by the database server.
    ///
    /// Strings with a scheme pass through unchanged, so `file:///articles.csv`
    /// names a file in the server's import directory. Bare paths are mapped
    /// into the import directory the same way.
    pub fn load_csv_url(&self) -> String {
        if self.raw.contains("://") {
            self.raw.clone()
        } else {
            format!("file:///{}", self.raw.trim_start_matches('/'))
        }
    }

    /// Open the source for reading on this host.
    ///
    /// Files are read incrementally; HTTP bodies are fetched in full first.
    async fn open(&self) -> NewsGraphResult<Box<dyn Read + Send>> {
        let unavailable = |message: String| NewsGraphError::SourceUnavailable {
            location: self.location.to_string(),
            message,
        };

        match &self.location {
            SourceLocation::Path(path) => {
                let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
                Ok(Box::new(BufReader::new(file)))
            }
            SourceLocation::Url(url) => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(60))
                    .build()
                    .unwrap_or_default();

                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| unavailable(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(unavailable(format!("HTTP {}", response.status())));
                }

                let body = response
                    .bytes()
                    .await
                    .map_err(|e| unavailable(e.to_string()))?;
                Ok(Box::new(Cursor::new(body)))
            }
        }
    }

    /// Open the source and read its rows in batches of at most `batch_size`.
    pub async fn batches<T>(&self, batch_size: usize) -> NewsGraphResult<CsvBatches<Box<dyn Read + Send>, T>>
    where
        T: DeserializeOwned + KeyedRecord,
    {
        let reader = self.open().await?;
        debug!(source = %self.name, location = %self.location, "Opened CSV source");
        CsvBatches::new(&self.name, reader, batch_size)
    }
}

/// Typed rows read lazily from a CSV stream with a header row.
///
/// Fails on the first row that does not deserialize or has a blank key column.
pub struct CsvBatches<R, T> {
    source_name: String,
    reader: csv::Reader<R>,
    headers: csv::StringRecord,
    record: csv::StringRecord,
    batch_size: usize,
    _rows: PhantomData<fn() -> T>,
}

impl<R: Read, T: DeserializeOwned + KeyedRecord> CsvBatches<R, T> {
    pub fn new(source_name: &str, input: R, batch_size: usize) -> NewsGraphResult<Self> {
        // Cell values stay untrimmed; key and numeric columns trim themselves.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| malformed(source_name, 1, e.to_string()))?
            .clone();

        Ok(Self {
            source_name: source_name.to_string(),
            reader,
            headers,
            record: csv::StringRecord::new(),
            batch_size: batch_size.max(1),
            _rows: PhantomData,
        })
    }

    /// The next batch, or `None` once the source is exhausted.
    pub fn next_batch(&mut self) -> NewsGraphResult<Option<Vec<T>>> {
        let mut batch = Vec::with_capacity(self.batch_size.min(1024));
        while batch.len() < self.batch_size {
            let more = self.reader.read_record(&mut self.record).map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                malformed(&self.source_name, line, e.to_string())
            })?;
            if !more {
                break;
            }

            let line = self.record.position().map(|p| p.line()).unwrap_or(0);
            let row: T = self
                .record
                .deserialize(Some(&self.headers))
                .map_err(|e| malformed(&self.source_name, line, e.to_string()))?;

            if let Some(column) = row.blank_key() {
                return Err(malformed(
                    &self.source_name,
                    line,
                    format!("blank key column '{}'", column),
                ));
            }
            batch.push(row);
        }

        Ok(if batch.is_empty() { None } else { Some(batch) })
    }
}

fn malformed(source_name: &str, line: u64, message: String) -> NewsGraphError {
    NewsGraphError::MalformedRow {
        source_name: source_name.to_string(),
        line,
        message,
    }
}

/// Parse CSV bytes with a header row into typed records.
pub fn parse_records<T>(source_name: &str, bytes: &[u8]) -> NewsGraphResult<Vec<T>>
where
    T: DeserializeOwned + KeyedRecord,
{
    let mut batches = CsvBatches::<_, T>::new(source_name, bytes, usize::MAX)?;
    Ok(batches.next_batch()?.unwrap_or_default())
}
