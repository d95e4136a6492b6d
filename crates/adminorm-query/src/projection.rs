//! Field projections: logical field names resolved to columns.

use adminorm_core::{ModelSchema, Result};

/// An ordered list of logical field names resolved 1:1 to columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<&'static str>,
    columns: Vec<String>,
}

impl Projection {
    /// Resolve `fields` against `schema`.
    ///
    /// Any unknown name fails the whole projection with `UnknownField`.
    #[allow(clippy::result_large_err)]
    pub fn resolve(schema: &ModelSchema, fields: &[&str]) -> Result<Self> {
        let mut resolved = Self {
            fields: Vec::with_capacity(fields.len()),
            columns: Vec::with_capacity(fields.len()),
        };
        for name in fields {
            let field = schema.require_field(name)?;
            resolved.fields.push(field.name);
            resolved.columns.push(field.column.clone());
        }
        Ok(resolved)
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Comma-separated column list for a SELECT.
    pub fn to_sql(&self) -> String {
        self.columns.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_models::Member;
    use adminorm_core::Error;

    fn schema() -> ModelSchema {
        ModelSchema::parse::<Member>().unwrap()
    }

    #[test]
    fn resolves_in_request_order() {
        let p = Projection::resolve(&schema(), &["Email", "ID", "Name"]).unwrap();
        assert_eq!(p.columns(), ["email_col", "id", "name_col"]);
        assert_eq!(p.fields(), ["Email", "ID", "Name"]);
        assert_eq!(p.to_sql(), "email_col, id, name_col");
    }

    #[test]
    fn untagged_field_uses_its_name() {
        let p = Projection::resolve(&schema(), &["Age"]).unwrap();
        assert_eq!(p.columns(), ["Age"]);
    }

    #[test]
    fn one_unknown_name_fails_everything() {
        let err = Projection::resolve(&schema(), &["Name", "Nope"]).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "Nope"));
    }
}
