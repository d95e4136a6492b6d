//! Query builders for INSERT, UPDATE, DELETE operations.

use std::marker::PhantomData;

use adminorm_core::{Model, ModelSchema, Result, Value};

use crate::dialect::Dialect;
use crate::payload::{UpdatePayload, value_of};

/// INSERT query builder.
#[derive(Debug)]
pub struct InsertBuilder<'a, M: Model> {
    model: &'a M,
    schema: &'a ModelSchema,
    only: Option<Vec<&'static str>>,
}

impl<'a, M: Model> InsertBuilder<'a, M> {
    /// Insert every field of `model`.
    pub fn new(model: &'a M, schema: &'a ModelSchema) -> Self {
        Self {
            model,
            schema,
            only: None,
        }
    }

    /// Insert only the named fields, in request order. The primary key is
    /// not added implicitly. An empty list keeps the full insert.
    #[allow(clippy::result_large_err)]
    pub fn fields(mut self, names: &[&str]) -> Result<Self> {
        if names.is_empty() {
            self.only = None;
            return Ok(self);
        }

        let mut only: Vec<&'static str> = Vec::with_capacity(names.len());
        for name in names {
            let field = self.schema.require_field(name)?;
            if !only.contains(&field.name) {
                only.push(field.name);
            }
        }
        self.only = Some(only);
        Ok(self)
    }

    /// Build the INSERT SQL and parameters with default dialect (Postgres).
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<(String, Vec<Value>)> {
        self.build_with_dialect(Dialect::default())
    }

    /// A full insert leaves out a NULL primary key so the database assigns it.
    ///
    /// Fails with `UnknownField` when `Model::to_row` lacks a field the insert
    /// needs.
    #[allow(clippy::result_large_err)]
    pub fn build_with_dialect(&self, dialect: Dialect) -> Result<(String, Vec<Value>)> {
        let row = self.model.to_row();

        let mut columns: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        match &self.only {
            Some(only) => {
                for name in only {
                    let field = self.schema.require_field(name)?;
                    columns.push(&field.column);
                    values.push(value_of(&row, self.schema, field)?);
                }
            }
            None => {
                for field in self.schema.fields() {
                    let value = value_of(&row, self.schema, field)?;
                    if field.primary_key && value.is_null() {
                        continue;
                    }
                    columns.push(&field.column);
                    values.push(value);
                }
            }
        }

        if columns.is_empty() {
            return Ok((format!("INSERT INTO {} DEFAULT VALUES", M::TABLE_NAME), values));
        }

        let placeholders: Vec<_> = (1..=values.len()).map(|i| dialect.placeholder(i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            M::TABLE_NAME,
            columns.join(", "),
            placeholders.join(", ")
        );

        Ok((sql, values))
    }
}

/// UPDATE query builder driven by an explicit payload.
#[derive(Debug)]
pub struct UpdateBuilder<'a, M: Model> {
    payload: &'a UpdatePayload,
    _marker: PhantomData<M>,
}

impl<'a, M: Model> UpdateBuilder<'a, M> {
    pub fn new(payload: &'a UpdatePayload) -> Self {
        Self {
            payload,
            _marker: PhantomData,
        }
    }

    /// Build the UPDATE SQL and parameters with default dialect (Postgres).
    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::default())
    }

    /// `UPDATE t SET ... WHERE <pk column> = <key>`.
    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut params = Vec::with_capacity(self.payload.len() + 1);
        let mut set_clauses = Vec::with_capacity(self.payload.len());

        for entry in self.payload.entries() {
            params.push(entry.value.clone());
            set_clauses.push(format!(
                "{} = {}",
                entry.column,
                dialect.placeholder(params.len())
            ));
        }

        params.push(self.payload.key().clone());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            M::TABLE_NAME,
            set_clauses.join(", "),
            self.payload.key_column(),
            dialect.placeholder(params.len())
        );

        (sql, params)
    }
}

/// DELETE of one row by key.
#[derive(Debug)]
pub struct DeleteBuilder<M: Model> {
    column: String,
    key: Value,
    _marker: PhantomData<M>,
}

impl<M: Model> DeleteBuilder<M> {
    pub fn by_key(column: impl Into<String>, key: Value) -> Self {
        Self {
            column: column.into(),
            key,
            _marker: PhantomData,
        }
    }

    /// Build the DELETE SQL and parameters with default dialect (Postgres).
    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::default())
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            M::TABLE_NAME,
            self.column,
            dialect.placeholder(1)
        );
        (sql, vec![self.key.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_models::{Member, Partial, member};
    use adminorm_core::Error;

    fn schema() -> ModelSchema {
        ModelSchema::parse::<Member>().unwrap()
    }

    #[test]
    fn full_insert_omits_null_key() {
        let schema = schema();
        let mut m = member();
        m.id = None;
        let (sql, params) = InsertBuilder::new(&m, &schema)
            .build_with_dialect(Dialect::Sqlite)
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO members (name_col, email_col, Age) VALUES (?1, ?2, ?3)"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn full_insert_keeps_explicit_key() {
        let schema = schema();
        let m = member();
        let (sql, params) = InsertBuilder::new(&m, &schema).build().unwrap();
        assert_eq!(
            sql,
            "INSERT INTO members (id, name_col, email_col, Age) VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(params[0], Value::BigInt(5));
    }

    #[test]
    fn projected_insert_uses_only_named_fields() {
        let schema = schema();
        let m = member();
        let (sql, params) = InsertBuilder::new(&m, &schema)
            .fields(&["Email", "Name", "Email"])
            .unwrap()
            .build_with_dialect(Dialect::Mysql)
            .unwrap();
        assert_eq!(sql, "INSERT INTO members (email_col, name_col) VALUES (?, ?)");
        assert_eq!(
            params,
            vec![
                Value::Text("a@b.com".to_string()),
                Value::Text("Bob".to_string())
            ]
        );
    }

    #[test]
    fn projected_insert_rejects_unknown_field() {
        let schema = schema();
        let m = member();
        assert!(InsertBuilder::new(&m, &schema).fields(&["Nope"]).is_err());
    }

    #[test]
    fn insert_fails_when_row_lacks_a_field() {
        let schema = ModelSchema::parse::<Partial>().unwrap();
        let partial = Partial {
            id: 1,
            label: "x".to_string(),
        };

        let err = InsertBuilder::new(&partial, &schema).build().unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "Note"));

        let (sql, params) = InsertBuilder::new(&partial, &schema)
            .fields(&["Label"])
            .unwrap()
            .build_with_dialect(Dialect::Sqlite)
            .unwrap();
        assert_eq!(sql, "INSERT INTO partials (Label) VALUES (?1)");
        assert_eq!(params, vec![Value::Text("x".to_string())]);
    }

    #[test]
    fn update_from_projected_payload() {
        let schema = schema();
        let payload =
            UpdatePayload::for_fields(&member(), &schema, &["Email"], Value::BigInt(5)).unwrap();
        let (sql, params) = UpdateBuilder::<Member>::new(&payload).build_with_dialect(Dialect::Mysql);
        assert_eq!(sql, "UPDATE members SET email_col = ?, id = ? WHERE id = ?");
        assert_eq!(
            params,
            vec![
                Value::Text("a@b.com".to_string()),
                Value::BigInt(5),
                Value::BigInt(5)
            ]
        );
    }

    #[test]
    fn full_update_sets_every_column() {
        let schema = schema();
        let payload = UpdatePayload::full(&member(), &schema, Value::BigInt(5)).unwrap();
        let (sql, params) = UpdateBuilder::<Member>::new(&payload).build();
        assert_eq!(
            sql,
            "UPDATE members SET id = $1, name_col = $2, email_col = $3, Age = $4 WHERE id = $5"
        );
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn delete_by_key() {
        let (sql, params) =
            DeleteBuilder::<Member>::by_key("id", Value::BigInt(9)).build_with_dialect(Dialect::Sqlite);
        assert_eq!(sql, "DELETE FROM members WHERE id = ?1");
        assert_eq!(params, vec![Value::BigInt(9)]);
    }
}
