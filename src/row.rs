use std::sync::Arc;

use crate::column::Column;
use crate::error::Error;
use crate::value::Value;

/// One row of a result set. Values are ordered parallel to the shared
/// column list.
#[derive(Debug, Clone)]
pub struct Row {
    pub(crate) columns: Arc<Vec<Column>>,
    pub(crate) values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Vec<Column>>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks a value up by column name, case-insensitively.
    ///
    /// An absent name yields `Value::Null`, not an error; higher-level
    /// decoders that need to distinguish use [`Row::try_get`].
    pub fn get(&self, name: &str) -> Value {
        self.index_of(name)
            .map_or(Value::Null, |i| self.values[i].clone())
    }

    /// Like [`Row::get`], but an absent name is `Error::ColumnNotFound`.
    pub fn try_get(&self, name: &str) -> Result<&Value, Error> {
        self.index_of(name)
            .map(|i| &self.values[i])
            .ok_or_else(|| Error::ColumnNotFound(name.to_owned()))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }
}

/// An ordered sequence of rows sharing one column list.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub(crate) columns: Arc<Vec<Column>>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Arc<Vec<Column>>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let columns = Arc::new(vec![
            Column::new("Id".into(), 0),
            Column::new("name".into(), 0),
        ]);
        Row::new(columns, vec![Value::Int(7), Value::Text("dept".into())])
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        let row = row();

        assert_eq!(row.get("id"), Value::Int(7));
        assert_eq!(row.get("NAME"), Value::Text("dept".into()));
    }

    #[test]
    fn absent_name_is_null_not_error() {
        let row = row();

        assert_eq!(row.get("missing"), Value::Null);
        assert!(matches!(
            row.try_get("missing"),
            Err(Error::ColumnNotFound(_))
        ));
    }
}
