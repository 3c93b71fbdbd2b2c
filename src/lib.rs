//! Read-only SQL execution against externally configured PostgreSQL and
//! MySQL data sources, behind one dialect-independent API.
//!
//! The pieces, leaf first: [`config`] validates data-source records,
//! [`guard`] rejects apparent mutating statements, [`binding`] rewrites
//! `:name` placeholders into each backend's positional syntax,
//! [`connection`] opens and closes one short-lived connection per call, and
//! [`executor`] orchestrates the whole thing into a normalized
//! [`QueryResult`].
//!
//! ```rust,no_run
//! use sql_connector::prelude::*;
//! use std::collections::HashMap;
//!
//! # async fn demo() -> Result<(), SqlConnectorError> {
//! let store = MemoryDataSourceStore::new();
//! // store.insert("ds1", config) happens wherever data sources are managed
//! let executor = SqlExecutor::new(store);
//!
//! let params = HashMap::from([("id".to_string(), RowValues::Int(7))]);
//! let result = executor
//!     .execute("ds1", "SELECT * FROM users WHERE id = :id", &params)
//!     .await?;
//! println!("{} rows in {} ms", result.row_count, result.execution_time);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod guard;
pub mod mysql;
pub mod postgres;
pub mod results;
pub mod store;
pub mod types;

pub mod prelude;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use binding::bind_named_params;
pub use config::{DataSourceConfig, Secret};
pub use connection::{ConnectionHandle, ConnectionManager, Connector};
pub use error::SqlConnectorError;
pub use executor::{QueryRequest, SqlExecutor};
pub use results::{ColumnField, DbRow, QueryResult, ResultSet};
pub use store::{DataSourceStore, MemoryDataSourceStore};
pub use types::{DatabaseType, NamedParams, RowValues, named_params_from_json};
