use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{error, info};

use crate::binding::bind_named_params;
use crate::config::DataSourceConfig;
use crate::connection::{ConnectionManager, Connector};
use crate::error::SqlConnectorError;
use crate::guard;
use crate::results::QueryResult;
use crate::store::DataSourceStore;
use crate::types::NamedParams;

/// One execution attempt: target data source, raw SQL, named parameters,
/// and opaque options a collaborator may want carried alongside (e.g. a row
/// limit). Options are never interpreted here.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub data_source_id: String,
    pub sql: String,
    pub params: NamedParams,
    pub options: HashMap<String, JsonValue>,
}

impl QueryRequest {
    pub fn new(
        data_source_id: impl Into<String>,
        sql: impl Into<String>,
        params: NamedParams,
    ) -> Self {
        Self {
            data_source_id: data_source_id.into(),
            sql: sql.into(),
            params,
            options: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: HashMap<String, JsonValue>) -> Self {
        self.options = options;
        self
    }
}

/// Coordinates one end-to-end query execution: resolve the data source,
/// gate the SQL, connect, bind, run, normalize, and always disconnect.
///
/// Stateless between calls: no pool, no cache, one connection per in-flight
/// call. Concurrent calls need no coordination because nothing is shared.
/// No retries anywhere in this path; a failed execution is reported once
/// and left to the caller.
pub struct SqlExecutor<S, C = ConnectionManager> {
    store: S,
    connector: C,
}

impl<S: DataSourceStore> SqlExecutor<S> {
    /// Build an executor over the given store, connecting to live backends.
    pub fn new(store: S) -> Self {
        Self {
            store,
            connector: ConnectionManager::new(),
        }
    }
}

impl<S: DataSourceStore, C: Connector> SqlExecutor<S, C> {
    /// Build an executor with a custom connection boundary.
    pub fn with_connector(store: S, connector: C) -> Self {
        Self { store, connector }
    }

    /// Execute `sql` against the identified data source.
    ///
    /// # Errors
    ///
    /// `NotFound`/`Disabled` before anything else runs, `QueryError` from
    /// the safety gate, `ConnectionError` from connect, and
    /// `ExecutionError` for backend runtime failures. Whatever happens, a
    /// connection that was opened is closed exactly once before this
    /// returns.
    pub async fn execute(
        &self,
        data_source_id: &str,
        sql: &str,
        params: &NamedParams,
    ) -> Result<QueryResult, SqlConnectorError> {
        let started = Instant::now();
        let outcome = self.run(data_source_id, sql, params, started).await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            Ok(result) => {
                info!(
                    data_source_id,
                    query_length = sql.len(),
                    row_count = result.row_count,
                    execution_time_ms = result.execution_time,
                    "sql query executed"
                );
            }
            Err(e) => {
                error!(
                    data_source_id,
                    query_length = sql.len(),
                    execution_time_ms = elapsed_ms,
                    error = %e,
                    "sql query execution failed"
                );
            }
        }
        outcome
    }

    /// Execute a [`QueryRequest`]; options ride along untouched.
    ///
    /// # Errors
    ///
    /// Same as [`SqlExecutor::execute`].
    pub async fn execute_request(
        &self,
        request: &QueryRequest,
    ) -> Result<QueryResult, SqlConnectorError> {
        self.execute(&request.data_source_id, &request.sql, &request.params)
            .await
    }

    async fn run(
        &self,
        data_source_id: &str,
        sql: &str,
        params: &NamedParams,
        started: Instant,
    ) -> Result<QueryResult, SqlConnectorError> {
        let config = self
            .store
            .find_by_id(data_source_id)
            .await?
            .ok_or_else(|| SqlConnectorError::NotFound(data_source_id.to_string()))?;
        if !config.enabled {
            return Err(SqlConnectorError::Disabled(data_source_id.to_string()));
        }

        guard::validate_query(sql)?;

        let mut handle = self.connector.connect(&config).await?;
        let (query, args) = bind_named_params(sql, params, config.db_type);
        let outcome = handle.run_query(&query, &args).await;
        // Cleanup runs on success and failure alike, before any `?`.
        self.connector.disconnect(handle).await;
        let result_set = outcome?;

        Ok(QueryResult::from_result_set(result_set, started.elapsed()))
    }

    /// Report whether the configured database is reachable. Never fails;
    /// validation and connection problems come back as `false`.
    pub async fn test_connection(&self, config: &DataSourceConfig) -> bool {
        self.connector.test_connection(config).await
    }

    /// Stored procedure execution is declared but not built yet.
    ///
    /// # Errors
    ///
    /// Always returns `SqlConnectorError::Unimplemented`.
    pub async fn execute_stored_procedure(
        &self,
        _data_source_id: &str,
        _procedure_name: &str,
        _params: &NamedParams,
    ) -> Result<QueryResult, SqlConnectorError> {
        Err(SqlConnectorError::Unimplemented(
            "stored procedure execution".to_string(),
        ))
    }

    /// Function execution is declared but not built yet.
    ///
    /// # Errors
    ///
    /// Always returns `SqlConnectorError::Unimplemented`.
    pub async fn execute_function(
        &self,
        _data_source_id: &str,
        _function_name: &str,
        _params: &NamedParams,
    ) -> Result<QueryResult, SqlConnectorError> {
        Err(SqlConnectorError::Unimplemented(
            "function execution".to_string(),
        ))
    }

    /// Query-plan explanation is declared but not built yet.
    ///
    /// # Errors
    ///
    /// Always returns `SqlConnectorError::Unimplemented`.
    pub async fn explain_query(
        &self,
        _data_source_id: &str,
        _sql: &str,
    ) -> Result<QueryResult, SqlConnectorError> {
        Err(SqlConnectorError::Unimplemented(
            "query explanation".to_string(),
        ))
    }
}
