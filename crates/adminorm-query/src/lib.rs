//! SQL construction for adminorm.
//!
//! Turns model descriptors plus runtime field names into SQL with bound
//! parameters:
//!
//! - [`Projection`] resolves logical field names to a column list
//! - [`SearchPredicate`] builds an OR of `LIKE` terms for free-text search
//! - [`UpdatePayload`] is the explicit SET list of an update
//! - [`Select`], [`InsertBuilder`], [`UpdateBuilder`] and [`DeleteBuilder`]
//!   render statements for a [`Dialect`]
//!
//! Nothing here executes; statements run through the `Connection` trait
//! from `adminorm-core`.

pub mod builder;
pub mod dialect;
pub mod payload;
pub mod projection;
pub mod search;
pub mod select;

#[cfg(test)]
mod test_models;

pub use builder::{DeleteBuilder, InsertBuilder, UpdateBuilder};
pub use dialect::Dialect;
pub use payload::{PayloadEntry, UpdatePayload};
pub use projection::Projection;
pub use search::SearchPredicate;
pub use select::Select;
