//! The data-access seam.
//!
//! The integrator never talks to a database directly; it renders SQL with
//! bound parameters and hands it to a [`Connection`]. Every call takes the
//! caller's `Cx` so cancellation flows through to the driver.

use crate::row::Row;
use crate::value::Value;
use asupersync::{Cx, Outcome};

/// A database handle able to run single parameterized statements.
///
/// Implementations must be shareable across tasks; the integrator holds
/// them behind an `Arc`.
pub trait Connection: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, crate::Error>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_one(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, crate::Error>> + Send;

    /// Execute a statement (UPDATE, DELETE) and return rows affected.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, crate::Error>> + Send;

    /// Execute an INSERT and return the last inserted ID.
    fn insert(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<i64, crate::Error>> + Send;
}
