use std::time::Duration;

use serde::Serialize;

use super::result_set::{ColumnField, ResultSet};
use super::row::DbRow;

/// The normalized outcome of one query execution.
///
/// The shape is identical regardless of which backend produced it, and its
/// serialization is the wire form surfaced to collaborators:
/// `{ rows, rowCount, fields?, executionTime }` with the execution time in
/// wall-clock milliseconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<DbRow>,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ColumnField>>,
    #[serde(rename = "executionTime")]
    pub execution_time: u64,
}

impl QueryResult {
    pub(crate) fn from_result_set(result_set: ResultSet, elapsed: Duration) -> Self {
        let (rows, fields) = result_set.into_parts();
        QueryResult {
            row_count: rows.len(),
            rows,
            fields,
            execution_time: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    #[test]
    fn wire_shape_matches_contract() {
        let mut rs = ResultSet::with_capacity(1);
        rs.set_columns(
            vec!["id".to_string()],
            Some(vec![ColumnField {
                name: "id".to_string(),
                data_type: "int8".to_string(),
            }]),
        );
        rs.add_row_values(vec![RowValues::Int(7)]);

        let result = QueryResult::from_result_set(rs, Duration::from_millis(12));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rows": [{"id": 7}],
                "rowCount": 1,
                "fields": [{"name": "id", "dataType": "int8"}],
                "executionTime": 12,
            })
        );
    }

    #[test]
    fn fields_are_omitted_when_absent() {
        let mut rs = ResultSet::with_capacity(0);
        rs.set_columns(vec!["id".to_string()], None);
        let result = QueryResult::from_result_set(rs, Duration::from_millis(1));
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("fields").is_none());
        assert_eq!(json["rowCount"], serde_json::json!(0));
    }
}
