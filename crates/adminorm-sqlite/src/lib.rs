//! SQLite connection for adminorm.
//!
// FFI bindings require unsafe code
#![allow(unsafe_code)]
//!
//! Implements the `Connection` trait from adminorm-core over libsqlite3, so an
//! `Integrator` can be pointed at a file or in-memory database.
//!
//! # Example
//!
//! ```rust,ignore
//! use adminorm_sqlite::SqliteConnection;
//! use adminorm_core::{Connection, Cx, Outcome, Value};
//!
//! let conn = SqliteConnection::open_memory()?;
//! conn.execute_raw("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let cx = Cx::for_testing();
//! match conn.insert(&cx, "INSERT INTO users (name) VALUES (?1)", &[Value::from("Alice")]).await {
//!     Outcome::Ok(id) => println!("inserted {}", id),
//!     Outcome::Err(e) => eprintln!("error: {}", e),
//!     _ => {}
//! }
//! ```
//!
//! # Type Mapping
//!
//! | Value | SQLite storage |
//! |-------|----------------|
//! | `Bool`, integers | INTEGER |
//! | `Float`, `Double` | REAL |
//! | `Text`, `Decimal` | TEXT |
//! | `Bytes` | BLOB |
//! | `Json` | TEXT |
//! | `Null` | NULL |
//!
//! `SqliteConnection` is `Send + Sync`; the handle sits behind a mutex.

pub mod connection;
pub mod types;

pub use connection::{OpenMode, SqliteConfig, SqliteConnection};

use libsqlite3_sys as ffi;
use std::ffi::CStr;

/// Version string of the linked SQLite library.
pub fn sqlite_version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a pointer to a static string
    unsafe { CStr::from_ptr(ffi::sqlite3_libversion()) }
        .to_str()
        .unwrap_or("unknown")
}

/// Version number of the linked SQLite library, e.g. `3045001`.
pub fn sqlite_version_number() -> i32 {
    // SAFETY: no arguments, no side effects
    unsafe { ffi::sqlite3_libversion_number() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_version() {
        let version = sqlite_version();
        assert!(version.starts_with('3'), "Expected SQLite 3.x, got {}", version);
        assert!(sqlite_version_number() >= 3_000_000);
    }
}
