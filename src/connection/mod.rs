//! Connection lifecycle management.
//!
//! One connection per in-flight call: a [`ConnectionHandle`] is owned by
//! exactly one execution, never pooled, and consumed by [`close`]. The
//! [`Connector`] trait is the seam an executor talks through; the real
//! implementation is [`ConnectionManager`], and the `test-utils` feature
//! provides a mock.
//!
//! [`close`]: ConnectionHandle::close

use async_trait::async_trait;
use tracing::error;

use crate::config::DataSourceConfig;
use crate::error::SqlConnectorError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};
use crate::{mysql, postgres};

/// An open connection to one backend, exclusively owned by a single
/// execution for its duration.
pub enum ConnectionHandle {
    Postgres(postgres::PostgresConnection),
    Mysql(Box<mysql_async::Conn>),
    #[cfg(any(test, feature = "test-utils"))]
    Mock(crate::test_utils::MockConnection),
}

impl ConnectionHandle {
    /// The dialect this handle speaks.
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            ConnectionHandle::Postgres(_) => DatabaseType::Postgres,
            ConnectionHandle::Mysql(_) => DatabaseType::Mysql,
            #[cfg(any(test, feature = "test-utils"))]
            ConnectionHandle::Mock(mock) => mock.database_type(),
        }
    }

    /// Run a bound query on this connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ExecutionError` on any backend runtime
    /// failure.
    pub async fn run_query(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlConnectorError> {
        match self {
            ConnectionHandle::Postgres(conn) => postgres::query::run_query(conn, sql, params).await,
            ConnectionHandle::Mysql(conn) => mysql::query::run_query(conn, sql, params).await,
            #[cfg(any(test, feature = "test-utils"))]
            ConnectionHandle::Mock(mock) => mock.run_query(sql, params),
        }
    }

    /// Close the connection. Consumes the handle, so a connection cannot be
    /// closed twice or used after closing. Teardown failures are logged,
    /// never raised.
    pub async fn close(self) {
        match self {
            ConnectionHandle::Postgres(conn) => conn.close().await,
            ConnectionHandle::Mysql(conn) => mysql::connect::close(*conn).await,
            #[cfg(any(test, feature = "test-utils"))]
            ConnectionHandle::Mock(mock) => mock.close(),
        }
    }
}

/// The connection-management boundary an executor depends on.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Validate the config, then open and liveness-check a connection.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the config is incomplete, `ConnectionError` when
    /// the backend is unreachable or rejects the credentials.
    async fn connect(&self, config: &DataSourceConfig)
    -> Result<ConnectionHandle, SqlConnectorError>;

    /// Close a connection, swallowing (but logging) teardown failures so
    /// they cannot mask a query result or an error already propagating.
    async fn disconnect(&self, handle: ConnectionHandle) {
        handle.close().await;
    }

    /// Report whether the configured database is reachable. This is the one
    /// place connection failures are swallowed by design.
    async fn test_connection(&self, config: &DataSourceConfig) -> bool {
        match self.connect(config).await {
            Ok(handle) => {
                self.disconnect(handle).await;
                true
            }
            Err(e) => {
                error!(error = %e, "connection test failed");
                false
            }
        }
    }
}

/// Dialect-dispatched connection management against live backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionManager;

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for ConnectionManager {
    async fn connect(
        &self,
        config: &DataSourceConfig,
    ) -> Result<ConnectionHandle, SqlConnectorError> {
        config.validate()?;
        match config.db_type {
            DatabaseType::Postgres => Ok(ConnectionHandle::Postgres(
                postgres::connect::open_connection(config).await?,
            )),
            DatabaseType::Mysql => Ok(ConnectionHandle::Mysql(Box::new(
                mysql::connect::open_connection(config).await?,
            ))),
        }
    }
}
