//! Model trait for database-mapped structs.

use crate::Result;
use crate::field::FieldInfo;
use crate::row::Row;
use crate::value::Value;

/// Trait for types that can be mapped to database tables.
///
/// Usually derived with `#[derive(Model)]`. The field table is the only
/// structural information the integrator has about a model: primary keys
/// and column names are derived from it on each call.
pub trait Model: Sized + Send + Sync + 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// Ordered field table.
    fn fields() -> &'static [FieldInfo];

    /// Field values keyed by logical field name, in declaration order.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Construct a model instance from a database row.
    ///
    /// Columns absent from the row take the field's default value.
    #[allow(clippy::result_large_err)]
    fn from_row(row: &Row) -> Result<Self>;

    /// Short type name used in error messages.
    fn model_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Value of a single field by logical name.
    fn field_value(&self, name: &str) -> Option<Value> {
        self.to_row()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}
