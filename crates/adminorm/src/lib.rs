//! adminorm - generic CRUD over database models for admin panels.
//!
//! An admin panel knows its models only at the edges: a type to list, a set
//! of field names the user picked, a search box, a primary key from the URL.
//! [`Integrator`] turns those into SQL against any [`Connection`]:
//!
//! - primary keys are discovered from each model's field table and naming tags
//! - logical field names are projected onto columns (`column:` tags)
//! - free-text search becomes an OR of `LIKE` terms
//! - partial updates carry an explicit, primary-key-scoped payload
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use adminorm::prelude::*;
//!
//! #[derive(Model, Debug, Default)]
//! #[adminorm(table = "users")]
//! struct User {
//!     #[adminorm(tag = "column:id;primaryKey")]
//!     id: Option<i64>,
//!     #[adminorm(column = "name_col")]
//!     name: String,
//!     email: String,
//! }
//!
//! async fn list(cx: &Cx, conn: Arc<impl Connection>) -> Outcome<Vec<User>, Error> {
//!     let admin = Integrator::with_config(conn, IntegratorConfig::new().dialect(Dialect::Sqlite));
//!     admin
//!         .fetch_all_projected_search::<User>(cx, &["id", "name"], "bob", &["name", "email"])
//!         .await
//! }
//! ```
//!
//! # Crates
//!
//! - `adminorm-core`: values, rows, errors, model descriptors, primary keys
//! - `adminorm-macros`: `#[derive(Model)]`
//! - `adminorm-query`: projection, search and statement builders
//! - `adminorm-sqlite`: a SQLite `Connection`

pub mod integrator;

pub use integrator::{Integrator, IntegratorConfig};

// Core
pub use adminorm_core::{
    AnyModel, ColumnInfo, Connection, Cx, Error, FieldInfo, FieldTag, FromValue, Model,
    ModelSchema, ModelShape, Outcome, ResolvedPrimaryKey, Result, Row, SchemaField,
    SchemaRegistry, SqlType, TypeInfo, Value, primary_key_column, primary_key_type,
    primary_key_value, resolve_primary_key,
};
pub use adminorm_core::error::{
    ConnectionError, ConnectionErrorKind, NotFoundError, QueryError, QueryErrorKind, QueryFailure,
    SchemaError, TypeError,
};

// Query building
pub use adminorm_query::{
    DeleteBuilder, Dialect, InsertBuilder, PayloadEntry, Projection, SearchPredicate, Select,
    UpdateBuilder, UpdatePayload,
};

// Derive macro; lives in the macro namespace next to the `Model` trait.
pub use adminorm_macros::Model;

/// Everything needed to declare models and drive an [`Integrator`].
pub mod prelude {
    pub use crate::{
        AnyModel, Connection, Cx, Dialect, Error, Integrator, IntegratorConfig, Model,
        ModelSchema, ModelShape, Outcome, Result, Row, Value,
    };
}
