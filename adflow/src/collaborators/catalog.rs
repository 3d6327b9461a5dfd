//! Product feed collaborator.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::ProductRecord;
use crate::errors::RemoteError;

/// One feed row: a record, or the reason it could not be read.
pub type FeedRecord = Result<ProductRecord, String>;

/// Supplies raw product records for import.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches every row of the feed.
    ///
    /// `Err` means the feed as a whole is unusable. A single bad row is
    /// returned as an `Err` entry and does not affect the others.
    async fn fetch(&self) -> Result<Vec<FeedRecord>, RemoteError>;

    /// Where the records come from, for logs.
    fn describe(&self) -> String;
}

/// A product feed read from disk or over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Local file holding a JSON array of records.
    File(PathBuf),
    /// http(s) URL returning a JSON array of records.
    Url(String),
    /// Local CSV file with a header row.
    Csv(PathBuf),
}

impl FeedSource {
    /// Interprets a feed argument.
    ///
    /// http(s) URLs are fetched, paths ending in `.csv` are read as CSV and
    /// anything else is a JSON file.
    #[must_use]
    pub fn parse(feed: &str) -> Self {
        let trimmed = feed.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Self::Url(trimmed.to_string());
        }
        let path = PathBuf::from(trimmed);
        if has_csv_extension(&path) {
            Self::Csv(path)
        } else {
            Self::File(path)
        }
    }

    async fn read_raw(&self) -> Result<String, RemoteError> {
        match self {
            Self::File(path) | Self::Csv(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| RemoteError::Transport(format!("{}: {e}", path.display()))),
            #[cfg(feature = "http")]
            Self::Url(url) => {
                let response = reqwest::get(url.as_str()).await?;
                crate::collaborators::http::read_body(response).await
            }
            #[cfg(not(feature = "http"))]
            Self::Url(url) => Err(RemoteError::Transport(format!(
                "cannot fetch {url}: built without the http feature"
            ))),
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn record_from_value(value: Value) -> FeedRecord {
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn json_records(raw: &str) -> Result<Vec<FeedRecord>, RemoteError> {
    let rows: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| RemoteError::malformed(format!("feed is not a JSON array: {e}")))?;
    Ok(rows.into_iter().map(record_from_value).collect())
}

/// Normalizes a CSV header: trimmed, lowercase, spaces as underscores.
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

fn csv_records(raw: &str) -> Result<Vec<FeedRecord>, RemoteError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.trim_start_matches('\u{feff}').as_bytes());
    let headers: csv::StringRecord = reader
        .headers()
        .map_err(|e| RemoteError::malformed(format!("CSV feed has no readable header row: {e}")))?
        .iter()
        .map(normalize_header)
        .collect();

    Ok(reader
        .records()
        .map(|row| {
            let row = row.map_err(|e| e.to_string())?;
            let fields: BTreeMap<String, String> = row.deserialize(Some(&headers)).map_err(|e| e.to_string())?;
            let object = fields
                .into_iter()
                .map(|(column, value)| (column, Value::String(value.trim().to_string())))
                .collect();
            record_from_value(Value::Object(object))
        })
        .collect())
}

#[async_trait]
impl CatalogSource for FeedSource {
    async fn fetch(&self) -> Result<Vec<FeedRecord>, RemoteError> {
        let raw = self.read_raw().await?;
        match self {
            Self::Csv(_) => csv_records(&raw),
            Self::File(_) | Self::Url(_) => json_records(&raw),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(path) | Self::Csv(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}
