use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::Path;

/// A station to ingest, as listed in the station code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationEntry {
    pub name: String,
    pub code: String,
}

/// The externally supplied `{ station name: station code }` table, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationList {
    entries: Vec<StationEntry>,
}

impl StationList {
    pub fn new(entries: Vec<StationEntry>) -> Self {
        Self { entries }
    }

    /// Builds a list from `(name, code)` pairs.
    pub fn from_pairs<N, C>(pairs: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, code)| StationEntry {
                    name: name.into(),
                    code: code.into(),
                })
                .collect(),
        )
    }

    /// Reads the station table from a JSON file.
    ///
    /// # Errors
    ///
    /// Any failure to read or interpret the table is a [`ConfigError`]: without a
    /// station list there is nothing to ingest.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ConfigError::StationTableRead(path.to_path_buf(), e))?;
        let table: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::StationTableParse(path.to_path_buf(), e))?;

        let mut entries = Vec::with_capacity(table.len());
        for (name, code) in table {
            let code = match code {
                Value::String(code) => code,
                Value::Number(code) => code.to_string(),
                _ => {
                    return Err(ConfigError::InvalidStationCode {
                        path: path.to_path_buf(),
                        station: name,
                    })
                }
            };
            entries.push(StationEntry { name, code });
        }

        if entries.is_empty() {
            return Err(ConfigError::EmptyStationList);
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
