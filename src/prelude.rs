//! Convenient imports for common functionality.

pub use crate::binding::bind_named_params;
pub use crate::config::{DataSourceConfig, Secret};
pub use crate::connection::{ConnectionHandle, ConnectionManager, Connector};
pub use crate::error::SqlConnectorError;
pub use crate::executor::{QueryRequest, SqlExecutor};
pub use crate::guard::{remove_comments, validate_query};
pub use crate::results::{ColumnField, DbRow, QueryResult, ResultSet};
pub use crate::store::{DataSourceStore, MemoryDataSourceStore};
pub use crate::types::{DatabaseType, NamedParams, RowValues, named_params_from_json};
