use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use tokio_postgres::Statement;

use super::connect::PostgresConnection;
use super::params::as_pg_params;
use crate::error::SqlConnectorError;
use crate::results::{ColumnField, ResultSet};
use crate::types::RowValues;

/// Run a bound query on an open connection and normalize the outcome.
///
/// # Errors
///
/// Returns `SqlConnectorError::ExecutionError` carrying the driver's
/// message on preparation, execution, or extraction failure.
pub(crate) async fn run_query(
    conn: &PostgresConnection,
    sql: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlConnectorError> {
    let stmt = conn
        .client
        .prepare(sql)
        .await
        .map_err(|e| SqlConnectorError::ExecutionError(format!("postgres prepare error: {e}")))?;
    let refs = as_pg_params(params);
    let rows = conn
        .client
        .query(&stmt, &refs)
        .await
        .map_err(|e| SqlConnectorError::ExecutionError(format!("postgres query error: {e}")))?;
    build_result_set(&stmt, &rows)
}

// Column metadata comes from the prepared statement so empty result sets
// still carry names and types.
fn build_result_set(
    stmt: &Statement,
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, SqlConnectorError> {
    let column_names: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
    let fields: Vec<ColumnField> = stmt
        .columns()
        .iter()
        .map(|c| ColumnField {
            name: c.name().to_string(),
            data_type: c.type_().name().to_string(),
        })
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_columns(column_names, Some(fields));

    for row in rows {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(row, idx)?);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}

fn extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<RowValues, SqlConnectorError> {
    let type_name = row.columns()[idx].type_().name();
    let extracted = match type_name {
        "int2" => {
            let val: Option<i16> = try_get(row, idx)?;
            val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v)))
        }
        "int4" => {
            let val: Option<i32> = try_get(row, idx)?;
            val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v)))
        }
        "int8" => {
            let val: Option<i64> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::Int)
        }
        "float4" => {
            let val: Option<f32> = try_get(row, idx)?;
            val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v)))
        }
        "float8" => {
            let val: Option<f64> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::Float)
        }
        "bool" => {
            let val: Option<bool> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::Bool)
        }
        "timestamp" | "timestamptz" => {
            let val: Option<NaiveDateTime> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::Timestamp)
        }
        "json" | "jsonb" => {
            let val: Option<JsonValue> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::JSON)
        }
        "bytea" => {
            let val: Option<Vec<u8>> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::Blob)
        }
        // text, varchar, char, name, and anything else readable as text
        _ => {
            let val: Option<String> = try_get(row, idx)?;
            val.map_or(RowValues::Null, RowValues::Text)
        }
    };
    Ok(extracted)
}

fn try_get<'a, T>(row: &'a tokio_postgres::Row, idx: usize) -> Result<T, SqlConnectorError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(idx)
        .map_err(|e| SqlConnectorError::ExecutionError(format!("postgres column read error: {e}")))
}
