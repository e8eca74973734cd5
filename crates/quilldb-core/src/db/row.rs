use crate::value::Value;
use derive_more::Deref;
use std::collections::BTreeMap;

///
/// Row
///
/// One raw row as returned by the execution facility: column name to scalar
/// value. Hydration into entities happens in the (out-of-scope) mapping layer
/// through the function supplied to the slice cursor.
///

#[derive(Clone, Debug, Default, Deref, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one column, replacing any previous value for the same name.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    #[must_use]
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    #[must_use]
    pub fn into_columns(self) -> BTreeMap<String, Value> {
        self.columns
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
