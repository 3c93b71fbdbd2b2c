use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::config::DataSourceConfig;
use crate::error::SqlConnectorError;

/// Read-only boundary to wherever data-source records live. Implemented by
/// the embedding application; this crate never writes through it.
#[async_trait]
pub trait DataSourceStore: Send + Sync {
    /// Look up a data source by identifier. `Ok(None)` means "no such
    /// record"; errors are reserved for storage failures.
    async fn find_by_id(&self, id: &str) -> Result<Option<DataSourceConfig>, SqlConnectorError>;
}

/// In-memory store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryDataSourceStore {
    entries: RwLock<HashMap<String, DataSourceConfig>>,
}

impl MemoryDataSourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, config: DataSourceConfig) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), config);
    }

    pub fn remove(&self, id: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

#[async_trait]
impl DataSourceStore for MemoryDataSourceStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<DataSourceConfig>, SqlConnectorError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }
}
