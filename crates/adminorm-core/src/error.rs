//! Error types for adminorm operations.

use std::fmt;

/// The primary error type for all adminorm operations.
#[derive(Debug)]
pub enum Error {
    /// The model input did not resolve to a model value (null reference,
    /// wrong concrete type behind a type-erased handle).
    InvalidModelShape(String),
    /// The model's field table or naming metadata could not be parsed.
    SchemaParseFailed(SchemaError),
    /// The model has no prioritized primary key field.
    NoPrimaryKeyFound {
        /// Model type name
        model: &'static str,
    },
    /// The descriptor named a primary key the model value does not carry.
    PrimaryKeyFieldMissing {
        /// Model type name
        model: &'static str,
        /// Logical name of the primary key field
        field: &'static str,
    },
    /// A requested logical field name does not exist on the model.
    UnknownField {
        /// Model type name
        model: &'static str,
        /// The requested name
        field: String,
    },
    /// No row matched (fetch) or was affected (delete).
    NotFound(NotFoundError),
    /// The data-access layer failed; wraps the underlying error with context.
    QueryFailed(QueryFailure),
    /// Driver-level query errors
    Query(QueryError),
    /// Driver-level connection errors
    Connection(ConnectionError),
    /// Type conversion errors while hydrating rows
    Type(TypeError),
}

#[derive(Debug)]
pub struct SchemaError {
    pub model: &'static str,
    pub field: Option<&'static str>,
    pub message: String,
}

#[derive(Debug)]
pub struct NotFoundError {
    pub table: &'static str,
    pub column: String,
    pub value: String,
}

#[derive(Debug)]
pub struct QueryFailure {
    /// Integrator operation that issued the statement (e.g. "fetch_all")
    pub operation: &'static str,
    pub table: &'static str,
    pub source: Box<Error>,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Connection lost or its handle became unusable
    Disconnected,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Permission denied
    Permission,
    /// Database busy or locked
    Busy,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Build a `SchemaParseFailed` error.
    pub fn schema(
        model: &'static str,
        field: Option<&'static str>,
        message: impl Into<String>,
    ) -> Self {
        Error::SchemaParseFailed(SchemaError {
            model,
            field,
            message: message.into(),
        })
    }

    /// Wrap a data-access error with the operation and table it came from.
    pub fn query_failed(operation: &'static str, table: &'static str, source: Error) -> Self {
        Error::QueryFailed(QueryFailure {
            operation,
            table,
            source: Box::new(source),
        })
    }

    /// Is this the "no row matched / affected" error?
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Is this an unknown-field resolution error?
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Error::UnknownField { .. })
    }

    /// Get the SQL that caused this error, if available.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            Error::QueryFailed(f) => f.source.sql(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidModelShape(msg) => write!(f, "Invalid model shape: {}", msg),
            Error::SchemaParseFailed(e) => write!(f, "Failed to parse model: {}", e),
            Error::NoPrimaryKeyFound { model } => {
                write!(f, "No primary field found for model {}", model)
            }
            Error::PrimaryKeyFieldMissing { model, field } => write!(
                f,
                "Primary key field {} not found in model {}",
                field, model
            ),
            Error::UnknownField { model, field } => {
                write!(f, "Field {} not found in model {}", field, model)
            }
            Error::NotFound(e) => write!(f, "{}", e),
            Error::QueryFailed(e) => write!(f, "{}", e),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::QueryFailed(e) => Some(e.source.as_ref()),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}.{}: {}", self.model, field, self.message),
            None => write!(f, "{}: {}", self.model, self.message),
        }
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No instance found in {} with {} = {}",
            self.table, self.column, self.value
        )
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} failed: {}",
            self.operation, self.table, self.source
        )
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::SchemaParseFailed(err)
    }
}

/// Result type alias for adminorm operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn query_failed_keeps_source_and_sql() {
        let driver = Error::Query(QueryError {
            kind: QueryErrorKind::Syntax,
            sql: Some("SELEC * FROM users".to_string()),
            message: "near \"SELEC\": syntax error".to_string(),
            source: None,
        });

        let err = Error::query_failed("fetch_all", "users", driver);
        assert_eq!(err.sql(), Some("SELEC * FROM users"));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("fetch_all on users failed"));
    }

    #[test]
    fn classification_helpers() {
        let nf = Error::NotFound(NotFoundError {
            table: "users",
            column: "id".to_string(),
            value: "7".to_string(),
        });
        assert!(nf.is_not_found());
        assert_eq!(nf.to_string(), "No instance found in users with id = 7");

        let unknown = Error::UnknownField {
            model: "User",
            field: "Nope".to_string(),
        };
        assert!(unknown.is_unknown_field());
        assert!(!unknown.is_not_found());
    }

    #[test]
    fn schema_error_display_names_field() {
        let err = Error::schema("User", Some("email"), "empty column override");
        assert_eq!(
            err.to_string(),
            "Failed to parse model: User.email: empty column override"
        );
    }
}
