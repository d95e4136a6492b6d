//! Free-text search predicates.

use adminorm_core::{ModelSchema, Result, Value};

use crate::dialect::Dialect;

/// A disjunction of `<column> LIKE '%<query>%'` terms.
///
/// An empty predicate (no search fields) renders to nothing and means
/// "no filtering".
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPredicate {
    columns: Vec<String>,
    pattern: String,
}

impl SearchPredicate {
    /// Resolve `fields` against `schema` and bind `query` as a substring
    /// pattern.
    #[allow(clippy::result_large_err)]
    pub fn build(schema: &ModelSchema, query: &str, fields: &[&str]) -> Result<Self> {
        let columns = fields
            .iter()
            .map(|name| schema.require_field(name).map(|f| f.column.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns,
            pattern: format!("%{query}%"),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Render the predicate with placeholders numbered after `offset`
    /// already-bound parameters.
    pub fn to_sql(&self, dialect: Dialect, offset: usize) -> (String, Vec<Value>) {
        let terms: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} LIKE {}", column, dialect.placeholder(offset + i + 1)))
            .collect();
        let params = vec![Value::Text(self.pattern.clone()); self.columns.len()];
        (terms.join(" OR "), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_models::Member;

    fn schema() -> ModelSchema {
        ModelSchema::parse::<Member>().unwrap()
    }

    #[test]
    fn or_of_like_terms() {
        let pred = SearchPredicate::build(&schema(), "bob", &["Name", "Email"]).unwrap();
        let (sql, params) = pred.to_sql(Dialect::Mysql, 0);
        assert_eq!(sql, "name_col LIKE ? OR email_col LIKE ?");
        assert_eq!(
            params,
            vec![
                Value::Text("%bob%".to_string()),
                Value::Text("%bob%".to_string())
            ]
        );
    }

    #[test]
    fn numbered_placeholders_respect_offset() {
        let pred = SearchPredicate::build(&schema(), "x", &["Name", "Email"]).unwrap();
        let (sql, _) = pred.to_sql(Dialect::Postgres, 2);
        assert_eq!(sql, "name_col LIKE $3 OR email_col LIKE $4");
    }

    #[test]
    fn empty_field_list_is_no_filter() {
        let pred = SearchPredicate::build(&schema(), "bob", &[]).unwrap();
        assert!(pred.is_empty());
        assert_eq!(pred.to_sql(Dialect::Sqlite, 0), (String::new(), Vec::new()));
    }

    #[test]
    fn unknown_search_field() {
        assert!(
            SearchPredicate::build(&schema(), "bob", &["Name", "Phone"])
                .unwrap_err()
                .is_unknown_field()
        );
    }
}
