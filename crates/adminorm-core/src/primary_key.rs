//! Primary key resolution for generic model values.

use crate::Result;
use crate::error::Error;
use crate::model::Model;
use crate::schema::ModelSchema;
use crate::shape::ModelShape;
use crate::types::SqlType;
use crate::value::Value;

/// The primary key of one model value, resolved from its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrimaryKey {
    /// Logical field name
    pub field: &'static str,
    /// Database column name
    pub column: String,
    pub value: Value,
    pub sql_type: SqlType,
}

/// Resolve field, column, value and type of a model's primary key.
///
/// The descriptor is parsed afresh on each call.
#[allow(clippy::result_large_err)]
pub fn resolve_primary_key<M, S>(model: S) -> Result<ResolvedPrimaryKey>
where
    M: Model,
    S: ModelShape<M>,
{
    let model = model.resolve_model()?;
    let schema = ModelSchema::parse::<M>()?;
    let field = schema.primary_field()?;

    let value = model
        .field_value(field.name)
        .ok_or(Error::PrimaryKeyFieldMissing {
            model: M::model_name(),
            field: field.name,
        })?;

    tracing::debug!(
        table = M::TABLE_NAME,
        field = field.name,
        column = %field.column,
        "resolved primary key"
    );

    Ok(ResolvedPrimaryKey {
        field: field.name,
        column: field.column.clone(),
        value,
        sql_type: field.sql_type.clone(),
    })
}

/// Runtime value of a model's primary key.
#[allow(clippy::result_large_err)]
pub fn primary_key_value<M, S>(model: S) -> Result<Value>
where
    M: Model,
    S: ModelShape<M>,
{
    resolve_primary_key(model).map(|pk| pk.value)
}

/// Declared SQL type of a model's primary key.
///
/// The model value is only checked for shape; the type comes from the
/// descriptor.
#[allow(clippy::result_large_err)]
pub fn primary_key_type<M, S>(model: S) -> Result<SqlType>
where
    M: Model,
    S: ModelShape<M>,
{
    model.resolve_model()?;
    let schema = ModelSchema::parse::<M>()?;
    Ok(schema.primary_field()?.sql_type.clone())
}

/// Column of `M`'s primary key, without needing a value.
#[allow(clippy::result_large_err)]
pub fn primary_key_column<M: Model>() -> Result<String> {
    let schema = ModelSchema::parse::<M>()?;
    Ok(schema.primary_field()?.column.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldInfo;
    use crate::row::Row;
    use crate::shape::AnyModel;

    struct Account {
        code: String,
        owner: String,
    }

    impl Model for Account {
        const TABLE_NAME: &'static str = "accounts";
        fn fields() -> &'static [FieldInfo] {
            static FIELDS: &[FieldInfo] = &[
                FieldInfo::new("code", SqlType::VarChar(16)).tag("column:account_code;primaryKey"),
                FieldInfo::new("owner", SqlType::Text),
            ];
            FIELDS
        }
        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("code", Value::Text(self.code.clone())),
                ("owner", Value::Text(self.owner.clone())),
            ]
        }
        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                code: row.get_or_default("account_code")?,
                owner: row.get_or_default("owner")?,
            })
        }
    }

    // Declares a primary key its row never carries.
    struct Hollow;

    impl Model for Hollow {
        const TABLE_NAME: &'static str = "hollow";
        fn fields() -> &'static [FieldInfo] {
            static FIELDS: &[FieldInfo] = &[FieldInfo::new("id", SqlType::BigInt)];
            FIELDS
        }
        fn to_row(&self) -> Vec<(&'static str, Value)> {
            Vec::new()
        }
        fn from_row(_row: &Row) -> Result<Self> {
            Ok(Hollow)
        }
    }

    struct Keyless {
        name: String,
    }

    impl Model for Keyless {
        const TABLE_NAME: &'static str = "keyless";
        fn fields() -> &'static [FieldInfo] {
            static FIELDS: &[FieldInfo] = &[FieldInfo::new("name", SqlType::Text)];
            FIELDS
        }
        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("name", Value::Text(self.name.clone()))]
        }
        fn from_row(row: &Row) -> Result<Self> {
            Ok(Self {
                name: row.get_or_default("name")?,
            })
        }
    }

    fn account() -> Account {
        Account {
            code: "ACC-1".to_string(),
            owner: "bob".to_string(),
        }
    }

    #[test]
    fn resolves_tagged_key() {
        let acct = account();
        let pk = resolve_primary_key(&acct).unwrap();
        assert_eq!(pk.field, "code");
        assert_eq!(pk.column, "account_code");
        assert_eq!(pk.value, Value::Text("ACC-1".to_string()));
        assert_eq!(pk.sql_type, SqlType::VarChar(16));
        assert_eq!(acct.owner, "bob");
    }

    #[test]
    fn value_and_type_through_any_shape() {
        let acct = account();
        let boxed = Box::new(account());
        assert_eq!(
            primary_key_value::<Account, _>(AnyModel::new(&boxed)).unwrap(),
            Value::Text("ACC-1".to_string())
        );
        assert_eq!(
            primary_key_type::<Account, _>(AnyModel::new(&acct)).unwrap(),
            SqlType::VarChar(16)
        );
        assert_eq!(primary_key_column::<Account>().unwrap(), "account_code");
    }

    #[test]
    fn invalid_shapes() {
        assert!(matches!(
            primary_key_value(None::<&Account>),
            Err(Error::InvalidModelShape(_))
        ));
        let wrong = 5_i32;
        assert!(matches!(
            primary_key_type::<Account, _>(AnyModel::new(&wrong)),
            Err(Error::InvalidModelShape(_))
        ));
    }

    #[test]
    fn missing_and_absent_keys() {
        assert!(matches!(
            primary_key_value(&Hollow),
            Err(Error::PrimaryKeyFieldMissing { field: "id", .. })
        ));

        let keyless = Keyless {
            name: "x".to_string(),
        };
        assert!(matches!(
            primary_key_value(&keyless),
            Err(Error::NoPrimaryKeyFound { model: "Keyless" })
        ));
        assert_eq!(keyless.name, "x");
    }
}
