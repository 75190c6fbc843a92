use crate::error::{AdapterError, Result};
use crate::source::{SourceAdapter, SourceQuery, SourceRow};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Reads a JSON array of rows exported from one of the source ledgers.
pub fn load_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let json = std::fs::read_to_string(path)?;
    let rows: Vec<R> = serde_json::from_str(&json)?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Adapter over a JSON export file. The file is re-read on every fetch so the
/// engine always sees its current contents.
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource<R> {
    name: String,
    path: PathBuf,
    _row: PhantomData<fn() -> R>,
}

impl<R> JsonSnapshotSource<R> {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            _row: PhantomData,
        }
    }
}

#[async_trait]
impl<R> SourceAdapter for JsonSnapshotSource<R>
where
    R: DeserializeOwned + SourceRow + Send,
{
    type Row = R;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &SourceQuery) -> std::result::Result<Vec<R>, AdapterError> {
        let rows: Vec<R> = load_rows(&self.path)?;
        Ok(rows.into_iter().filter(|row| query.admits(row)).collect())
    }
}
