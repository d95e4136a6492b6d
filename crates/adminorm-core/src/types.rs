//! Declared SQL types of model fields.

use std::fmt;

/// SQL data types a model field can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal { precision: u8, scale: u8 },
    Boolean,
    VarChar(u32),
    Text,
    Blob,
    Json,
    /// A type name passed through verbatim.
    Custom(&'static str),
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::TinyInt => f.write_str("TINYINT"),
            SqlType::SmallInt => f.write_str("SMALLINT"),
            SqlType::Integer => f.write_str("INTEGER"),
            SqlType::BigInt => f.write_str("BIGINT"),
            SqlType::Real => f.write_str("REAL"),
            SqlType::Double => f.write_str("DOUBLE PRECISION"),
            SqlType::Decimal { precision, scale } => write!(f, "DECIMAL({precision}, {scale})"),
            SqlType::Boolean => f.write_str("BOOLEAN"),
            SqlType::VarChar(len) => write!(f, "VARCHAR({len})"),
            SqlType::Text => f.write_str("TEXT"),
            SqlType::Blob => f.write_str("BLOB"),
            SqlType::Json => f.write_str("JSON"),
            SqlType::Custom(name) => f.write_str(name),
        }
    }
}

/// Rust types that map onto a [`SqlType`].
///
/// `#[derive(Model)]` reads these constants to fill each field's
/// [`FieldInfo`](crate::FieldInfo).
pub trait TypeInfo {
    const SQL_TYPE: SqlType;
    const NULLABLE: bool = false;
}

macro_rules! type_info {
    ($($ty:ty => $sql:expr),* $(,)?) => {
        $(impl TypeInfo for $ty {
            const SQL_TYPE: SqlType = $sql;
        })*
    };
}

type_info! {
    i8 => SqlType::TinyInt,
    i16 => SqlType::SmallInt,
    i32 => SqlType::Integer,
    i64 => SqlType::BigInt,
    u8 => SqlType::SmallInt,
    u16 => SqlType::Integer,
    u32 => SqlType::BigInt,
    f32 => SqlType::Real,
    f64 => SqlType::Double,
    bool => SqlType::Boolean,
    String => SqlType::Text,
    Vec<u8> => SqlType::Blob,
    serde_json::Value => SqlType::Json,
}

impl<T: TypeInfo> TypeInfo for Option<T> {
    const SQL_TYPE: SqlType = T::SQL_TYPE;
    const NULLABLE: bool = true;
}
