//! Mock connector and connection for exercising coordinator logic without
//! a live database. Enabled by the `test-utils` feature (the crate's own
//! integration tests turn it on through a dev-dependency on itself).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::config::{DataSourceConfig, Secret};
use crate::connection::{ConnectionHandle, Connector};
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

/// Counters and recordings shared between a [`MockConnector`] and the
/// connections it hands out.
#[derive(Debug, Default)]
pub struct MockActivity {
    connects: AtomicUsize,
    closes: AtomicUsize,
    queries: Mutex<Vec<(String, Vec<RowValues>)>>,
}

impl MockActivity {
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// The (rewritten SQL, ordered args) pairs seen by mock connections.
    #[must_use]
    pub fn recorded_queries(&self) -> Vec<(String, Vec<RowValues>)> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A fake connection that records what reaches it and answers with canned
/// rows.
pub struct MockConnection {
    dialect: DatabaseType,
    activity: Arc<MockActivity>,
    columns: Vec<String>,
    rows: Vec<Vec<RowValues>>,
    fail_query: Option<String>,
}

impl MockConnection {
    #[must_use]
    pub(crate) fn database_type(&self) -> DatabaseType {
        self.dialect
    }

    pub(crate) fn run_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlConnectorError> {
        self.activity
            .queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((sql.to_string(), params.to_vec()));

        if let Some(message) = &self.fail_query {
            return Err(SqlConnectorError::ExecutionError(message.clone()));
        }

        let mut result_set = ResultSet::with_capacity(self.rows.len());
        result_set.set_columns(self.columns.clone(), None);
        for row in &self.rows {
            result_set.add_row_values(row.clone());
        }
        Ok(result_set)
    }

    pub(crate) fn close(self) {
        self.activity.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`Connector`] whose connections never touch the network.
pub struct MockConnector {
    dialect: DatabaseType,
    activity: Arc<MockActivity>,
    columns: Vec<String>,
    rows: Vec<Vec<RowValues>>,
    fail_connect: Option<String>,
    fail_query: Option<String>,
}

impl MockConnector {
    #[must_use]
    pub fn new(dialect: DatabaseType) -> Self {
        Self {
            dialect,
            activity: Arc::new(MockActivity::default()),
            columns: Vec::new(),
            rows: Vec::new(),
            fail_connect: None,
            fail_query: None,
        }
    }

    /// Canned result every connection answers with.
    #[must_use]
    pub fn with_rows(mut self, columns: Vec<&str>, rows: Vec<Vec<RowValues>>) -> Self {
        self.columns = columns.into_iter().map(str::to_string).collect();
        self.rows = rows;
        self
    }

    /// Make every connection attempt fail.
    #[must_use]
    pub fn with_connect_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_connect = Some(message.into());
        self
    }

    /// Make every query fail after the connection succeeds.
    #[must_use]
    pub fn with_query_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_query = Some(message.into());
        self
    }

    #[must_use]
    pub fn activity(&self) -> Arc<MockActivity> {
        self.activity.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        config: &DataSourceConfig,
    ) -> Result<ConnectionHandle, SqlConnectorError> {
        config.validate()?;
        self.activity.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_connect {
            return Err(SqlConnectorError::ConnectionError(message.clone()));
        }
        Ok(ConnectionHandle::Mock(MockConnection {
            dialect: self.dialect,
            activity: self.activity.clone(),
            columns: self.columns.clone(),
            rows: self.rows.clone(),
            fail_query: self.fail_query.clone(),
        }))
    }
}

/// A structurally valid config pointing at nothing in particular.
#[must_use]
pub fn sample_config(db_type: DatabaseType) -> DataSourceConfig {
    DataSourceConfig {
        db_type,
        host: "db.example.test".to_string(),
        port: db_type.default_port(),
        database: "reports".to_string(),
        username: "reader".to_string(),
        password: Secret::new("s3cret"),
        schema_name: "public".to_string(),
        use_tls: false,
        extra_options: std::collections::HashMap::new(),
        enabled: true,
    }
}
