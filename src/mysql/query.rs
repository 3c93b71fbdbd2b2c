use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Column, Conn, Row, Value};

use super::params::to_mysql_params;
use crate::error::SqlConnectorError;
use crate::results::{ColumnField, ResultSet};
use crate::types::RowValues;

/// Run a bound query on an open connection and normalize the outcome.
///
/// # Errors
///
/// Returns `SqlConnectorError::ExecutionError` carrying the driver's
/// message on preparation or execution failure.
pub(crate) async fn run_query(
    conn: &mut Conn,
    sql: &str,
    params: &[RowValues],
) -> Result<ResultSet, SqlConnectorError> {
    let stmt = conn
        .prep(sql)
        .await
        .map_err(|e| SqlConnectorError::ExecutionError(format!("mysql prepare error: {e}")))?;
    let rows: Vec<Row> = conn
        .exec(&stmt, to_mysql_params(params))
        .await
        .map_err(|e| SqlConnectorError::ExecutionError(format!("mysql query error: {e}")))?;

    // Column metadata comes from the prepared statement so empty result
    // sets still carry names and types.
    let columns = stmt.columns();
    let column_names: Vec<String> = columns.iter().map(|c| c.name_str().into_owned()).collect();
    let fields: Vec<ColumnField> = columns
        .iter()
        .map(|c| ColumnField {
            name: c.name_str().into_owned(),
            data_type: type_name(c.column_type()).to_string(),
        })
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_columns(column_names, Some(fields));

    for row in &rows {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row.as_ref(idx).unwrap_or(&Value::NULL);
            let column = row.columns_ref().get(idx);
            values.push(extract_value(value, column));
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}

fn extract_value(value: &Value, column: Option<&Column>) -> RowValues {
    match value {
        Value::NULL => RowValues::Null,
        Value::Int(i) => RowValues::Int(*i),
        Value::UInt(u) => {
            i64::try_from(*u).map_or_else(|_| RowValues::Text(u.to_string()), RowValues::Int)
        }
        Value::Float(f) => RowValues::Float(f64::from(*f)),
        Value::Double(d) => RowValues::Float(*d),
        Value::Bytes(bytes) => extract_bytes(bytes, column),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(*hour),
                        u32::from(*minute),
                        u32::from(*second),
                        *micros,
                    )
                })
                .map_or(RowValues::Null, RowValues::Timestamp)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = days * 24 + u32::from(*hours);
            let sign = if *negative { "-" } else { "" };
            let rendered = if *micros > 0 {
                format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
            } else {
                format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}")
            };
            RowValues::Text(rendered)
        }
    }
}

// The text protocol ships most things as bytes; use the column type to pick
// a better shape, falling back from UTF-8 text to a blob.
fn extract_bytes(bytes: &[u8], column: Option<&Column>) -> RowValues {
    if let Some(col) = column
        && col.column_type() == ColumnType::MYSQL_TYPE_JSON
        && let Ok(parsed) = serde_json::from_slice(bytes)
    {
        return RowValues::JSON(parsed);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => RowValues::Text(text.to_string()),
        Err(_) => RowValues::Blob(bytes.to_vec()),
    }
}

fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => "decimal",
        ColumnType::MYSQL_TYPE_TINY => "tinyint",
        ColumnType::MYSQL_TYPE_SHORT => "smallint",
        ColumnType::MYSQL_TYPE_LONG => "int",
        ColumnType::MYSQL_TYPE_INT24 => "mediumint",
        ColumnType::MYSQL_TYPE_LONGLONG => "bigint",
        ColumnType::MYSQL_TYPE_FLOAT => "float",
        ColumnType::MYSQL_TYPE_DOUBLE => "double",
        ColumnType::MYSQL_TYPE_NULL => "null",
        ColumnType::MYSQL_TYPE_TIMESTAMP | ColumnType::MYSQL_TYPE_TIMESTAMP2 => "timestamp",
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => "date",
        ColumnType::MYSQL_TYPE_TIME | ColumnType::MYSQL_TYPE_TIME2 => "time",
        ColumnType::MYSQL_TYPE_DATETIME | ColumnType::MYSQL_TYPE_DATETIME2 => "datetime",
        ColumnType::MYSQL_TYPE_YEAR => "year",
        ColumnType::MYSQL_TYPE_VARCHAR | ColumnType::MYSQL_TYPE_VAR_STRING => "varchar",
        ColumnType::MYSQL_TYPE_STRING => "char",
        ColumnType::MYSQL_TYPE_BIT => "bit",
        ColumnType::MYSQL_TYPE_JSON => "json",
        ColumnType::MYSQL_TYPE_ENUM => "enum",
        ColumnType::MYSQL_TYPE_SET => "set",
        ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_BLOB => "blob",
        ColumnType::MYSQL_TYPE_GEOMETRY => "geometry",
        _ => "unknown",
    }
}
