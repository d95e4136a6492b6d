//! SELECT query builder.

use std::marker::PhantomData;

use adminorm_core::{Model, Value};

use crate::dialect::Dialect;
use crate::projection::Projection;
use crate::search::SearchPredicate;

/// SELECT over one model's table.
#[derive(Debug, Clone)]
pub struct Select<M: Model> {
    columns: Option<Projection>,
    key: Option<(String, Value)>,
    search: Option<SearchPredicate>,
    order_by: Option<String>,
    limit: Option<u64>,
    _marker: PhantomData<M>,
}

impl<M: Model> Select<M> {
    /// `SELECT * FROM <table>`.
    pub fn new() -> Self {
        Self {
            columns: None,
            key: None,
            search: None,
            order_by: None,
            limit: None,
            _marker: PhantomData,
        }
    }

    /// Restrict the column list. An empty projection selects everything.
    pub fn columns(mut self, projection: Projection) -> Self {
        self.columns = (!projection.is_empty()).then_some(projection);
        self
    }

    /// Filter on `column = value`.
    pub fn by_key(mut self, column: impl Into<String>, value: Value) -> Self {
        self.key = Some((column.into(), value));
        self
    }

    /// AND a search predicate onto the filter. An empty predicate is ignored.
    pub fn search(mut self, predicate: SearchPredicate) -> Self {
        self.search = (!predicate.is_empty()).then_some(predicate);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Build the SQL and parameters with default dialect (Postgres).
    pub fn build(&self) -> (String, Vec<Value>) {
        self.build_with_dialect(Dialect::default())
    }

    pub fn build_with_dialect(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let columns = self
            .columns
            .as_ref()
            .map_or_else(|| "*".to_string(), Projection::to_sql);
        let mut sql = format!("SELECT {} FROM {}", columns, M::TABLE_NAME);
        let mut params = Vec::new();
        let mut conditions = Vec::new();

        if let Some((column, value)) = &self.key {
            params.push(value.clone());
            conditions.push(format!("{} = {}", column, dialect.placeholder(params.len())));
        }

        if let Some(search) = &self.search {
            let (search_sql, search_params) = search.to_sql(dialect, params.len());
            params.extend(search_params);
            if conditions.is_empty() {
                conditions.push(search_sql);
            } else {
                conditions.push(format!("({})", search_sql));
            }
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        (sql, params)
    }
}

impl<M: Model> Default for Select<M> {
    fn default() -> Self {
        Self::new()
    }
}
