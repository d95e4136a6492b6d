//! The admin-panel integrator: generic CRUD over any `Model`.
//!
//! Every operation parses the model's descriptor, resolves the field names it
//! was given into columns, renders one statement and runs it on the shared
//! connection. Nothing is cached between calls.

#![allow(clippy::result_large_err)]

use std::sync::Arc;

use adminorm_core::{
    Connection, Cx, Error, Model, ModelSchema, ModelShape, NotFoundError, Outcome, Result, Row,
    Value,
};
use adminorm_query::{
    DeleteBuilder, Dialect, InsertBuilder, Projection, SearchPredicate, Select, UpdateBuilder,
    UpdatePayload,
};
use serde::{Deserialize, Serialize};

/// Return early from an `Outcome`-returning fn on a local `Err`.
macro_rules! tri {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "integrator call rejected");
                return Outcome::Err(e);
            }
        }
    };
}

/// Await a data-access call. Errors become `QueryFailed` for `$op`;
/// cancellation and panics are passed through untouched.
macro_rules! run {
    ($op:expr, $table:expr, $call:expr) => {
        match $call.await {
            Outcome::Ok(value) => value,
            Outcome::Err(e) => {
                tracing::debug!(operation = $op, error = %e, "data access failed");
                return Outcome::Err(Error::query_failed($op, $table, e));
            }
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }
    };
}

/// Settings for an [`Integrator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Placeholder style for generated SQL.
    pub dialect: Dialect,
}

impl IntegratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// CRUD adapter between an admin panel and a database connection.
///
/// Model types are supplied per call, so one integrator serves every model
/// the panel manages.
#[derive(Debug)]
pub struct Integrator<C: Connection> {
    conn: Arc<C>,
    config: IntegratorConfig,
}

impl<C: Connection> Clone for Integrator<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            config: self.config,
        }
    }
}

impl<C: Connection> Integrator<C> {
    /// Integrator with the default (Postgres) dialect.
    pub fn new(conn: Arc<C>) -> Self {
        Self::with_config(conn, IntegratorConfig::default())
    }

    pub fn with_config(conn: Arc<C>, config: IntegratorConfig) -> Self {
        Self { conn, config }
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// Freshly parsed descriptor of `M`.
    pub fn schema<M: Model>(&self) -> Result<ModelSchema> {
        ModelSchema::parse::<M>()
    }

    /// Every row of `M`'s table.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn fetch_all<M: Model>(&self, cx: &Cx) -> Outcome<Vec<M>, Error> {
        let (sql, params) = Select::<M>::new().build_with_dialect(self.dialect());
        tracing::trace!(sql = %sql, "fetch_all");

        let rows = run!("fetch_all", M::TABLE_NAME, self.conn.query(cx, &sql, &params));
        hydrate(&rows).map_or_else(Outcome::Err, Outcome::Ok)
    }

    /// Every row, selecting only the columns of `fields`. Fields left out take
    /// their `Default` values.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn fetch_all_projected<M: Model>(
        &self,
        cx: &Cx,
        fields: &[&str],
    ) -> Outcome<Vec<M>, Error> {
        let schema = tri!(ModelSchema::parse::<M>());
        let projection = tri!(Projection::resolve(&schema, fields));
        tracing::debug!(columns = ?projection.columns(), "resolved projection");

        let (sql, params) = Select::<M>::new()
            .columns(projection)
            .build_with_dialect(self.dialect());
        tracing::trace!(sql = %sql, "fetch_all_projected");

        let rows = run!(
            "fetch_all_projected",
            M::TABLE_NAME,
            self.conn.query(cx, &sql, &params)
        );
        hydrate(&rows).map_or_else(Outcome::Err, Outcome::Ok)
    }

    /// Projected rows whose `search_fields` columns contain `query`.
    ///
    /// An empty `search_fields` list applies no filter.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn fetch_all_projected_search<M: Model>(
        &self,
        cx: &Cx,
        fields: &[&str],
        query: &str,
        search_fields: &[&str],
    ) -> Outcome<Vec<M>, Error> {
        let schema = tri!(ModelSchema::parse::<M>());
        let projection = tri!(Projection::resolve(&schema, fields));
        let predicate = tri!(SearchPredicate::build(&schema, query, search_fields));
        tracing::debug!(
            columns = ?projection.columns(),
            search = ?predicate.columns(),
            "resolved projection and search"
        );

        let (sql, params) = Select::<M>::new()
            .columns(projection)
            .search(predicate)
            .build_with_dialect(self.dialect());
        tracing::trace!(sql = %sql, "fetch_all_projected_search");

        let rows = run!(
            "fetch_all_projected_search",
            M::TABLE_NAME,
            self.conn.query(cx, &sql, &params)
        );
        hydrate(&rows).map_or_else(Outcome::Err, Outcome::Ok)
    }

    /// The row whose primary key equals `id`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn fetch_one<M: Model>(&self, cx: &Cx, id: impl Into<Value>) -> Outcome<M, Error> {
        self.fetch_one_inner(cx, id.into(), &[], "fetch_one").await
    }

    /// [`fetch_one`](Self::fetch_one) selecting only the columns of `fields`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn fetch_one_projected<M: Model>(
        &self,
        cx: &Cx,
        id: impl Into<Value>,
        fields: &[&str],
    ) -> Outcome<M, Error> {
        self.fetch_one_inner(cx, id.into(), fields, "fetch_one_projected")
            .await
    }

    async fn fetch_one_inner<M: Model>(
        &self,
        cx: &Cx,
        id: Value,
        fields: &[&str],
        op: &'static str,
    ) -> Outcome<M, Error> {
        let schema = tri!(ModelSchema::parse::<M>());
        let pk = tri!(schema.primary_field()).column.clone();
        let projection = tri!(Projection::resolve(&schema, fields));

        let (sql, params) = Select::<M>::new()
            .columns(projection)
            .by_key(pk.as_str(), id.clone())
            .order_by(pk.as_str())
            .limit(1)
            .build_with_dialect(self.dialect());
        tracing::trace!(sql = %sql, "{}", op);

        let row = run!(op, M::TABLE_NAME, self.conn.query_one(cx, &sql, &params));

        match row {
            Some(row) => M::from_row(&row).map_or_else(Outcome::Err, Outcome::Ok),
            None => Outcome::Err(not_found::<M>(pk, &id)),
        }
    }

    /// Delete the row whose primary key equals `id`.
    ///
    /// A statement that affects no row is reported as `NotFound`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn delete<M: Model>(&self, cx: &Cx, id: impl Into<Value>) -> Outcome<(), Error> {
        let id = id.into();
        let pk = tri!(adminorm_core::primary_key_column::<M>());

        let (sql, params) =
            DeleteBuilder::<M>::by_key(pk.as_str(), id.clone()).build_with_dialect(self.dialect());
        tracing::trace!(sql = %sql, "delete");

        let affected = run!("delete", M::TABLE_NAME, self.conn.execute(cx, &sql, &params));
        tracing::info!(table = M::TABLE_NAME, key = %id, affected, "deleted rows");

        if affected == 0 {
            return Outcome::Err(not_found::<M>(pk, &id));
        }
        Outcome::Ok(())
    }

    /// Insert every field of `model`. Returns the driver's last insert id.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn create<M, S>(&self, cx: &Cx, model: S) -> Outcome<i64, Error>
    where
        M: Model,
        S: ModelShape<M>,
    {
        self.create_projected::<M, S>(cx, model, &[]).await
    }

    /// Insert only the named fields of `model`; an empty list inserts all.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn create_projected<M, S>(
        &self,
        cx: &Cx,
        model: S,
        fields: &[&str],
    ) -> Outcome<i64, Error>
    where
        M: Model,
        S: ModelShape<M>,
    {
        let (sql, params) = tri!(self.insert_statement::<M, S>(&model, fields));
        tracing::trace!(sql = %sql, fields = fields.len(), "create");

        let id = run!("create", M::TABLE_NAME, self.conn.insert(cx, &sql, &params));
        Outcome::Ok(id)
    }

    fn insert_statement<M, S>(&self, model: &S, fields: &[&str]) -> Result<(String, Vec<Value>)>
    where
        M: Model,
        S: ModelShape<M>,
    {
        let model = model.resolve_model()?;
        let schema = ModelSchema::parse::<M>()?;
        InsertBuilder::new(model, &schema)
            .fields(fields)?
            .build_with_dialect(self.dialect())
    }

    /// Save every field of `model` into the row keyed by `pk`.
    ///
    /// The primary key column is set to `pk` whatever `model` holds. Returns
    /// rows affected; zero is not an error.
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn update<M, S>(&self, cx: &Cx, model: S, pk: impl Into<Value>) -> Outcome<u64, Error>
    where
        M: Model,
        S: ModelShape<M>,
    {
        self.update_projected::<M, S>(cx, model, &[], pk).await
    }

    /// Save only the named fields of `model` into the row keyed by `pk`.
    ///
    /// The primary key is always part of the SET list: the instance's value
    /// when the key field is named (re-keying the row), otherwise `pk`. The
    /// statement is scoped by `pk`. An empty list is a full
    /// [`update`](Self::update).
    #[tracing::instrument(level = "debug", skip_all, fields(table = M::TABLE_NAME))]
    pub async fn update_projected<M, S>(
        &self,
        cx: &Cx,
        model: S,
        fields: &[&str],
        pk: impl Into<Value>,
    ) -> Outcome<u64, Error>
    where
        M: Model,
        S: ModelShape<M>,
    {
        let payload = tri!(update_payload::<M, S>(&model, fields, pk.into()));
        tracing::debug!(
            fields = ?payload.entries().iter().map(|e| e.field).collect::<Vec<_>>(),
            "resolved update payload"
        );

        let (sql, params) = UpdateBuilder::<M>::new(&payload).build_with_dialect(self.dialect());
        tracing::trace!(sql = %sql, "update");

        let affected = run!("update", M::TABLE_NAME, self.conn.execute(cx, &sql, &params));
        Outcome::Ok(affected)
    }
}

fn update_payload<M, S>(model: &S, fields: &[&str], key: Value) -> Result<UpdatePayload>
where
    M: Model,
    S: ModelShape<M>,
{
    let model = model.resolve_model()?;
    let schema = ModelSchema::parse::<M>()?;
    UpdatePayload::for_fields(model, &schema, fields, key)
}

fn hydrate<M: Model>(rows: &[Row]) -> Result<Vec<M>> {
    rows.iter().map(M::from_row).collect()
}

fn not_found<M: Model>(column: String, key: &Value) -> Error {
    Error::NotFound(NotFoundError {
        table: M::TABLE_NAME,
        column,
        value: key.to_string(),
    })
}
