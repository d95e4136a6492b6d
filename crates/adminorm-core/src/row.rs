//! Database row representation.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column names.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }
}

/// A single row returned from a database query.
///
/// Projected fetches return rows carrying only the selected columns, so
/// model hydration goes through [`Row::get_or_default`] rather than failing
/// on absent columns.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with the given columns and values.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        let columns = Arc::new(ColumnInfo::new(column_names));
        Self { values, columns }
    }

    /// Create a new row with shared column metadata.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get a typed value by column name.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{name}' not found"),
                column: Some(name.to_string()),
            })
        })?;
        decode_named(value, name)
    }

    /// Get a typed value by column name, or `T::default()` when the row does
    /// not carry that column.
    #[allow(clippy::result_large_err)]
    pub fn get_or_default<T: FromValue + Default>(&self, name: &str) -> Result<T> {
        match self.get_by_name(name) {
            Some(value) => decode_named(value, name),
            None => Ok(T::default()),
        }
    }

    /// Iterate over (column name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names
            .iter()
            .map(String::as_str)
            .zip(&self.values)
    }
}

#[allow(clippy::result_large_err)]
fn decode_named<T: FromValue>(value: &Value, name: &str) -> Result<T> {
    T::from_value(value).map_err(|e| match e {
        Error::Type(mut te) => {
            te.column = Some(name.to_string());
            Error::Type(te)
        }
        e => e,
    })
}

/// Trait for converting from a `Value` to a typed value.
pub trait FromValue: Sized {
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| value.type_error("bool"))
    }
}

fn narrow<T: TryFrom<i64>>(value: &Value, expected: &'static str) -> Result<T> {
    let wide = value.as_i64().ok_or_else(|| value.type_error(expected))?;
    T::try_from(wide).map_err(|_| {
        Error::Type(TypeError {
            expected,
            actual: format!("value {wide} out of range"),
            column: None,
        })
    })
}

// Drivers may hand back a wider integer than the field declares; any value
// that fits is accepted.
macro_rules! narrowing_from_value {
    ($($ty:ty),*) => {
        $(impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self> {
                narrow(value, stringify!($ty))
            }
        })*
    };
}

narrowing_from_value!(i8, i16, i32, u8, u16, u32);

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| value.type_error("i64"))
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            other => other
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| other.type_error("f32")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| value.type_error("f64"))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
            other => Err(other.type_error("String")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| value.type_error("Vec<u8>"))
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| {
                Error::Type(TypeError {
                    expected: "valid JSON",
                    actual: format!("invalid JSON: {e}"),
                    column: None,
                })
            }),
            other => Err(other.type_error("JSON")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            vec!["id".to_string(), "name".to_string(), "age".to_string()],
            vec![
                Value::BigInt(1),
                Value::Text("Alice".to_string()),
                Value::Null,
            ],
        )
    }

    #[test]
    fn named_access_attaches_column_to_errors() {
        let row = sample();
        assert_eq!(row.get_named::<i32>("id").unwrap(), 1);
        assert_eq!(row.get_named::<String>("name").unwrap(), "Alice");
        assert_eq!(row.get_named::<Option<i64>>("age").unwrap(), None);

        match row.get_named::<i64>("name") {
            Err(Error::Type(te)) => assert_eq!(te.column.as_deref(), Some("name")),
            other => panic!("expected type error, got {:?}", other),
        }
    }

    #[test]
    fn missing_column_defaults_only_when_asked() {
        let row = sample();
        assert!(row.get_named::<String>("email").is_err());
        assert_eq!(row.get_or_default::<String>("email").unwrap(), "");
        assert_eq!(row.get_or_default::<i64>("id").unwrap(), 1);
    }

    #[test]
    fn iterates_in_column_order() {
        let row = sample();
        let names: Vec<_> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["id", "name", "age"]);
        assert_eq!(row.get(1), Some(&Value::Text("Alice".to_string())));
    }

    #[test]
    fn narrowing_rejects_out_of_range() {
        assert!(i8::from_value(&Value::BigInt(300)).is_err());
        assert_eq!(u16::from_value(&Value::BigInt(300)).unwrap(), 300);
    }

    #[test]
    fn json_from_text_column() {
        let v = serde_json::Value::from_value(&Value::Text("{\"a\":1}".to_string())).unwrap();
        assert_eq!(v["a"], 1);
    }
}
