use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::row::DbRow;
use crate::types::RowValues;

/// Column metadata surfaced alongside the rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnField {
    pub name: String,
    pub data_type: String,
}

/// Raw rows and column metadata in a backend-independent shape, before the
/// coordinator stamps timing onto it.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    rows: Vec<DbRow>,
    fields: Option<Vec<ColumnField>>,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a result set preallocated for `capacity` rows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names (shared by all rows) and optional field
    /// metadata. Must be called before [`ResultSet::add_row_values`].
    pub fn set_columns(&mut self, column_names: Vec<String>, fields: Option<Vec<ColumnField>>) {
        let index = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<HashMap<_, _>>();
        self.column_names = Some(Arc::new(column_names));
        self.column_index = Some(Arc::new(index));
        self.fields = fields;
    }

    /// Append a row sharing this result set's column metadata. Rows added
    /// before `set_columns` are dropped, since they could never be read
    /// back by name.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        if let (Some(names), Some(index)) = (&self.column_names, &self.column_index) {
            self.rows.push(DbRow {
                column_names: names.clone(),
                values,
                column_index: index.clone(),
            });
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[DbRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn fields(&self) -> Option<&[ColumnField]> {
        self.fields.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Vec<DbRow>, Option<Vec<ColumnField>>) {
        (self.rows, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_metadata() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_columns(vec!["id".to_string(), "name".to_string()], None);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("b".into())]);

        assert_eq!(rs.row_count(), 2);
        assert_eq!(rs.rows()[1].get("id"), Some(&RowValues::Int(2)));
        assert!(Arc::ptr_eq(
            &rs.rows()[0].column_names,
            &rs.rows()[1].column_names
        ));
    }

    #[test]
    fn rows_without_columns_are_dropped() {
        let mut rs = ResultSet::default();
        rs.add_row_values(vec![RowValues::Int(1)]);
        assert_eq!(rs.row_count(), 0);
    }
}
