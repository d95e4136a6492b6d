//! Core types and traits for adminorm.
//!
//! - `Model` trait and `FieldInfo` field tables describing database-mapped structs
//! - `ModelSchema` descriptors with column naming metadata and primary key
//!   prioritization
//! - primary key resolution over any accepted model shape
//! - `Connection` trait, the data-access seam
//! - `Outcome` and `Cx` re-exported from asupersync

pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod error;
pub mod field;
pub mod model;
pub mod primary_key;
pub mod row;
pub mod schema;
pub mod shape;
pub mod types;
pub mod value;

pub use connection::Connection;
pub use error::{
    ConnectionError, ConnectionErrorKind, Error, NotFoundError, QueryError, QueryErrorKind,
    QueryFailure, Result, SchemaError, TypeError,
};
pub use field::{FieldInfo, FieldTag};
pub use model::Model;
pub use primary_key::{
    ResolvedPrimaryKey, primary_key_column, primary_key_type, primary_key_value,
    resolve_primary_key,
};
pub use row::{ColumnInfo, FromValue, Row};
pub use schema::{ModelSchema, SchemaField, SchemaRegistry};
pub use shape::{AnyModel, ModelShape};
pub use types::{SqlType, TypeInfo};
pub use value::Value;
