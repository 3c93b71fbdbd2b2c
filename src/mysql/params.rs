use chrono::{Datelike, Timelike};
use mysql_async::{Params, Value};

use crate::types::RowValues;

/// Convert a unified argument slice into driver parameters. An empty slice
/// becomes `Params::Empty`, which the driver requires for statements with
/// no placeholders.
pub(crate) fn to_mysql_params(values: &[RowValues]) -> Params {
    if values.is_empty() {
        return Params::Empty;
    }
    Params::Positional(values.iter().map(to_mysql_value).collect())
}

fn to_mysql_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Int(*i),
        RowValues::Float(f) => Value::Double(*f),
        RowValues::Text(s) => Value::Bytes(s.clone().into_bytes()),
        RowValues::Bool(b) => Value::Int(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Date(
            u16::try_from(dt.year()).unwrap_or_default(),
            u8::try_from(dt.month()).unwrap_or_default(),
            u8::try_from(dt.day()).unwrap_or_default(),
            u8::try_from(dt.hour()).unwrap_or_default(),
            u8::try_from(dt.minute()).unwrap_or_default(),
            u8::try_from(dt.second()).unwrap_or_default(),
            dt.nanosecond() / 1_000,
        ),
        RowValues::Null => Value::NULL,
        RowValues::JSON(j) => Value::Bytes(j.to_string().into_bytes()),
        RowValues::Blob(bytes) => Value::Bytes(bytes.clone()),
    }
}
