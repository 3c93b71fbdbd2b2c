use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// A single row from a query result.
///
/// Column names and the name→index map are shared across every row of one
/// result set, so a row is just its values plus two `Arc`s.
#[derive(Debug, Clone)]
pub struct DbRow {
    pub(crate) column_names: Arc<Vec<String>>,
    pub(crate) values: Vec<RowValues>,
    pub(crate) column_index: Arc<HashMap<String, usize>>,
}

impl DbRow {
    /// Build a standalone row. Prefer [`ResultSet::add_row_values`] when
    /// producing many rows, which shares the column metadata.
    ///
    /// [`ResultSet::add_row_values`]: super::ResultSet::add_row_values
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// The column names for this row.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// The values for this row, in column order.
    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.column_index
            .get(column_name)
            .and_then(|idx| self.values.get(*idx))
    }

    /// Get a value by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }
}

// Rows cross the wire as objects mapping column name to value.
impl Serialize for DbRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.column_names.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
