//! Update payloads: the explicit (field, column, value) list of an UPDATE.

use adminorm_core::{Error, Model, ModelSchema, Result, SchemaField, Value};

/// One column assignment of an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadEntry {
    pub field: &'static str,
    pub column: String,
    pub value: Value,
}

/// The SET list of an UPDATE plus the primary key that scopes it.
///
/// The primary key entry is always present. A full update sets it to the
/// key the update is scoped by; a projected update that names the key field
/// carries the instance's value, so the row can be re-keyed.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePayload {
    entries: Vec<PayloadEntry>,
    key_column: String,
    key: Value,
}

impl UpdatePayload {
    /// Every field of `model`, with the primary key column set to `key`.
    #[allow(clippy::result_large_err)]
    pub fn full<M: Model>(model: &M, schema: &ModelSchema, key: Value) -> Result<Self> {
        let pk = schema.primary_field()?;
        let row = model.to_row();

        let entries = schema
            .fields()
            .iter()
            .map(|field| -> Result<PayloadEntry> {
                let value = if field.primary_key {
                    key.clone()
                } else {
                    value_of(&row, schema, field)?
                };
                Ok(PayloadEntry {
                    field: field.name,
                    column: field.column.clone(),
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entries,
            key_column: pk.column.clone(),
            key,
        })
    }

    /// Only the named fields with the instance's values, in request order
    /// with duplicates collapsed, plus the primary key bound to `key` when it
    /// was not requested.
    ///
    /// An empty list is a full update.
    #[allow(clippy::result_large_err)]
    pub fn for_fields<M: Model>(
        model: &M,
        schema: &ModelSchema,
        fields: &[&str],
        key: Value,
    ) -> Result<Self> {
        if fields.is_empty() {
            return Self::full(model, schema, key);
        }

        let pk = schema.primary_field()?;
        let row = model.to_row();
        let mut entries: Vec<PayloadEntry> = Vec::with_capacity(fields.len() + 1);

        for name in fields {
            let field = schema.require_field(name)?;
            if entries.iter().any(|e| e.field == field.name) {
                continue;
            }
            entries.push(PayloadEntry {
                field: field.name,
                column: field.column.clone(),
                value: value_of(&row, schema, field)?,
            });
        }

        if !entries.iter().any(|e| e.field == pk.name) {
            entries.push(PayloadEntry {
                field: pk.name,
                column: pk.column.clone(),
                value: key.clone(),
            });
        }

        Ok(Self {
            entries,
            key_column: pk.column.clone(),
            key,
        })
    }

    pub fn entries(&self) -> &[PayloadEntry] {
        &self.entries
    }

    /// Value assigned to a field, by logical name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.value)
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The value `Model::to_row` produced for `field`.
///
/// A field the descriptor lists but the row lacks is `UnknownField` rather
/// than an implicit NULL.
#[allow(clippy::result_large_err)]
pub(crate) fn value_of(
    row: &[(&'static str, Value)],
    schema: &ModelSchema,
    field: &SchemaField,
) -> Result<Value> {
    row.iter()
        .find(|(name, _)| *name == field.name)
        .map(|(_, value)| value.clone())
        .ok_or_else(|| Error::UnknownField {
            model: schema.model(),
            field: field.name.to_string(),
        })
}
