// Dialect-independent result shapes.
//
// - row: a single result row with shared column names
// - result_set: rows plus column metadata as produced by a backend
// - query_result: the normalized outcome handed back to callers

mod query_result;
mod result_set;
mod row;

pub use query_result::QueryResult;
pub use result_set::{ColumnField, ResultSet};
pub use row::DbRow;
