//! Model descriptors parsed from a model's field table.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::Result;
use crate::error::Error;
use crate::field::FieldTag;
use crate::model::Model;
use crate::types::SqlType;

/// One declared field with its naming metadata resolved.
#[derive(Debug, Clone)]
pub struct SchemaField {
    /// Logical (Rust) field name
    pub name: &'static str,
    /// Database column name
    pub column: String,
    pub tag: FieldTag,
    pub sql_type: SqlType,
    pub nullable: bool,
    /// Set on the single prioritized primary key field, if any
    pub primary_key: bool,
}

/// Parsed descriptor of a model type.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    model: &'static str,
    table: &'static str,
    fields: Vec<SchemaField>,
    primary: Option<usize>,
}

impl ModelSchema {
    /// Parse the descriptor of `M` from its field table.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "trace", fields(model = M::model_name()))]
    pub fn parse<M: Model>() -> Result<Self> {
        let model = M::model_name();
        let infos = M::fields();
        if infos.is_empty() {
            return Err(Error::schema(model, None, "model declares no fields"));
        }

        let mut fields: Vec<SchemaField> = Vec::with_capacity(infos.len());
        for info in infos {
            let tag = info
                .parse_tag()
                .map_err(|msg| Error::schema(model, Some(info.name), msg))?;
            let column = tag.column().unwrap_or(info.name).to_string();

            if fields.iter().any(|f| f.name == info.name) {
                return Err(Error::schema(model, Some(info.name), "duplicate field"));
            }
            if let Some(other) = fields
                .iter()
                .find(|f| f.column.eq_ignore_ascii_case(&column))
            {
                return Err(Error::schema(
                    model,
                    Some(info.name),
                    format!("column '{}' already used by field {}", column, other.name),
                ));
            }

            fields.push(SchemaField {
                name: info.name,
                column,
                tag,
                sql_type: info.sql_type.clone(),
                nullable: info.nullable,
                primary_key: false,
            });
        }

        let primary = prioritize_primary(&fields);
        if let Some(idx) = primary {
            fields[idx].primary_key = true;
        }
        tracing::trace!(
            table = M::TABLE_NAME,
            primary = primary.map(|i| fields[i].name),
            "parsed model schema"
        );

        Ok(Self {
            model,
            table: M::TABLE_NAME,
            fields,
            primary,
        })
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.column.as_str())
    }

    /// Look up a field by logical name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Like [`field`](Self::field), failing with `UnknownField`.
    #[allow(clippy::result_large_err)]
    pub fn require_field(&self, name: &str) -> Result<&SchemaField> {
        self.field(name).ok_or_else(|| Error::UnknownField {
            model: self.model,
            field: name.to_string(),
        })
    }

    pub fn prioritized_primary_field(&self) -> Option<&SchemaField> {
        self.primary.map(|i| &self.fields[i])
    }

    #[allow(clippy::result_large_err)]
    pub fn primary_field(&self) -> Result<&SchemaField> {
        self.prioritized_primary_field()
            .ok_or(Error::NoPrimaryKeyFound { model: self.model })
    }
}

/// Exactly one tagged field wins; among several tagged fields the one whose
/// column is `id` wins; with none tagged, a field named or columned `id`.
fn prioritize_primary(fields: &[SchemaField]) -> Option<usize> {
    let tagged: Vec<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.tag.is_primary_key())
        .map(|(i, _)| i)
        .collect();

    match tagged.as_slice() {
        [only] => Some(*only),
        [] => fields.iter().position(|f| {
            f.name.eq_ignore_ascii_case("id") || f.column.eq_ignore_ascii_case("id")
        }),
        many => many
            .iter()
            .copied()
            .find(|&i| fields[i].column.eq_ignore_ascii_case("id")),
    }
}

/// Explicit registration of model descriptors by type and table name.
///
/// Optional: the integrator parses descriptors per call and never consults
/// a registry. Admin panels use this to enumerate the models they expose.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_type: HashMap<TypeId, Arc<ModelSchema>>,
    by_table: HashMap<&'static str, Arc<ModelSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register `M`, replacing any earlier registration.
    #[allow(clippy::result_large_err)]
    pub fn register<M: Model>(&self) -> Result<Arc<ModelSchema>> {
        let schema = Arc::new(ModelSchema::parse::<M>()?);
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.by_type.insert(TypeId::of::<M>(), Arc::clone(&schema));
        inner.by_table.insert(M::TABLE_NAME, Arc::clone(&schema));
        tracing::debug!(table = M::TABLE_NAME, "registered model schema");
        Ok(schema)
    }

    pub fn get<M: Model>(&self) -> Option<Arc<ModelSchema>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_type.get(&TypeId::of::<M>()).cloned()
    }

    pub fn by_table(&self, table: &str) -> Option<Arc<ModelSchema>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.by_table.get(table).cloned()
    }

    /// Registered table names, sorted.
    pub fn tables(&self) -> Vec<&'static str> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut tables: Vec<_> = inner.by_table.keys().copied().collect();
        tables.sort_unstable();
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldInfo;
    use crate::row::Row;
    use crate::value::Value;

    macro_rules! fixture {
        ($name:ident, $table:literal, [$($field:expr),* $(,)?]) => {
            struct $name;
            impl Model for $name {
                const TABLE_NAME: &'static str = $table;
                fn fields() -> &'static [FieldInfo] {
                    static FIELDS: &[FieldInfo] = &[$($field),*];
                    FIELDS
                }
                fn to_row(&self) -> Vec<(&'static str, Value)> {
                    Vec::new()
                }
                fn from_row(_row: &Row) -> Result<Self> {
                    Ok($name)
                }
            }
        };
    }

    fixture!(Tagged, "tagged", [
        FieldInfo::new("Code", SqlType::Text).tag("column:code;primaryKey"),
        FieldInfo::new("Name", SqlType::Text).tag("column:name_col"),
    ]);

    fixture!(Conventional, "conventional", [
        FieldInfo::new("ID", SqlType::BigInt),
        FieldInfo::new("Email", SqlType::Text),
    ]);

    fixture!(TwoTagged, "two_tagged", [
        FieldInfo::new("Tenant", SqlType::BigInt).tag("primaryKey"),
        FieldInfo::new("Key", SqlType::BigInt).tag("primaryKey;column:id"),
    ]);

    fixture!(TwoTaggedNoId, "two_tagged_no_id", [
        FieldInfo::new("Tenant", SqlType::BigInt).tag("primaryKey"),
        FieldInfo::new("Slot", SqlType::BigInt).tag("primaryKey"),
    ]);

    fixture!(NoKey, "no_key", [
        FieldInfo::new("Name", SqlType::Text),
    ]);

    fixture!(DuplicateColumn, "dup", [
        FieldInfo::new("A", SqlType::Text).tag("column:same"),
        FieldInfo::new("B", SqlType::Text).tag("column:SAME"),
    ]);

    fixture!(BadTag, "bad", [
        FieldInfo::new("A", SqlType::Text).tag("column:"),
    ]);

    #[test]
    fn single_tagged_field_wins() {
        let schema = ModelSchema::parse::<Tagged>().unwrap();
        let pk = schema.primary_field().unwrap();
        assert_eq!(pk.name, "Code");
        assert_eq!(pk.column, "code");
        assert_eq!(schema.require_field("Name").unwrap().column, "name_col");
        assert_eq!(schema.columns().collect::<Vec<_>>(), ["code", "name_col"]);
    }

    #[test]
    fn id_by_convention() {
        let schema = ModelSchema::parse::<Conventional>().unwrap();
        assert_eq!(schema.primary_field().unwrap().name, "ID");
    }

    #[test]
    fn several_tagged_prefers_id_column() {
        let schema = ModelSchema::parse::<TwoTagged>().unwrap();
        assert_eq!(schema.primary_field().unwrap().name, "Key");
        assert_eq!(schema.fields().iter().filter(|f| f.primary_key).count(), 1);
    }

    #[test]
    fn no_candidate_is_no_primary_key() {
        for err in [
            ModelSchema::parse::<TwoTaggedNoId>().unwrap().primary_field().err(),
            ModelSchema::parse::<NoKey>().unwrap().primary_field().err(),
        ] {
            assert!(matches!(err, Some(Error::NoPrimaryKeyFound { .. })));
        }
    }

    #[test]
    fn unknown_field_names_the_model() {
        let schema = ModelSchema::parse::<Tagged>().unwrap();
        match schema.require_field("Missing") {
            Err(Error::UnknownField { model, field }) => {
                assert_eq!(model, "Tagged");
                assert_eq!(field, "Missing");
            }
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }

    #[test]
    fn parse_failures() {
        assert!(matches!(
            ModelSchema::parse::<DuplicateColumn>(),
            Err(Error::SchemaParseFailed(_))
        ));
        assert!(matches!(
            ModelSchema::parse::<BadTag>(),
            Err(Error::SchemaParseFailed(_))
        ));
    }

    #[test]
    fn registry_by_type_and_table() {
        let registry = SchemaRegistry::new();
        registry.register::<Tagged>().unwrap();
        registry.register::<Conventional>().unwrap();

        assert_eq!(registry.get::<Tagged>().unwrap().table(), "tagged");
        assert!(registry.get::<NoKey>().is_none());
        assert_eq!(registry.by_table("conventional").unwrap().model(), "Conventional");
        assert_eq!(registry.tables(), ["conventional", "tagged"]);
        assert!(registry.register::<BadTag>().is_err());
    }
}
