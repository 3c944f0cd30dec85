use rusqlite::types::Value as SqlValue;
use std::collections::BTreeMap;

/// A single column value in a lookup or insert
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    /// Values identifying a row of the table this column references.
    /// Resolved to that row's id before the outer lookup runs.
    Ref(Record),
}

impl FieldValue {
    /// Convert a flat value into its SQL form. Nested references have no SQL form.
    pub(crate) fn to_sql(&self) -> Option<SqlValue> {
        match self {
            FieldValue::Null => Some(SqlValue::Null),
            FieldValue::Int(i) => Some(SqlValue::Integer(*i)),
            FieldValue::Float(f) => Some(SqlValue::Real(*f)),
            FieldValue::Text(s) => Some(SqlValue::Text(s.clone())),
            FieldValue::Ref(_) => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Record> for FieldValue {
    fn from(value: Record) -> Self {
        FieldValue::Ref(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Column/value pairs used to find or create a row
///
/// ```
/// use qtl_importer::store::Record;
///
/// let qtl_type = Record::new()
///     .with("name", "QTL")
///     .with("cv_id", Record::new().with("name", "sequence"));
/// assert_eq!(qtl_type.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Record::set`]
    pub fn with(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<FieldValue>) {
        self.fields.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
