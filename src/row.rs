//! The row and column-schema types shared by the runner contract, the
//! facade, and the query value itself.

use std::collections::BTreeMap;
use std::fmt;

/// A single cell value returned by the runner. Kept deliberately small and
/// untyped (mirroring the source's dynamically-typed cell values) rather
/// than modeling DuckDB's full type system, which is out of scope.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("null"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One row of a query result: an ordered mapping from column name to cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(BTreeMap<String, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, CellValue)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.0.insert(column.into(), value);
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Builds the placeholder row used for in-range reads before data has
    /// resolved: every known column name maps to `CellValue::Null`.
    pub fn mock_from_columns(columns: &[ColumnDescriptor]) -> Self {
        Self(
            columns
                .iter()
                .map(|c| (c.column_name.clone(), CellValue::Null))
                .collect(),
        )
    }
}

/// One entry of a `DESCRIBE` result: a column's name and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub column_type: String,
}

impl ColumnDescriptor {
    pub fn new(column_name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            column_type: column_type.into(),
        }
    }
}
