//! Hand-written models shared by the builder tests.

use adminorm_core::{FieldInfo, Model, Result, Row, SqlType, Value};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Member {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl Model for Member {
    const TABLE_NAME: &'static str = "members";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("ID", SqlType::BigInt)
                .tag("column:id;primaryKey")
                .nullable(true),
            FieldInfo::new("Name", SqlType::Text).tag("column:name_col"),
            FieldInfo::new("Email", SqlType::Text).tag("column:email_col;size:255"),
            FieldInfo::new("Age", SqlType::BigInt),
        ];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("ID", Value::from(self.id)),
            ("Name", Value::from(self.name.clone())),
            ("Email", Value::from(self.email.clone())),
            ("Age", Value::from(self.age)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_or_default("id")?,
            name: row.get_or_default("name_col")?,
            email: row.get_or_default("email_col")?,
            age: row.get_or_default("Age")?,
        })
    }
}

pub fn member() -> Member {
    Member {
        id: Some(5),
        name: "Bob".to_string(),
        email: "a@b.com".to_string(),
        age: 41,
    }
}

/// `to_row` leaves out `Note`, which the field table declares.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partial {
    pub id: i64,
    pub label: String,
}

impl Model for Partial {
    const TABLE_NAME: &'static str = "partials";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("ID", SqlType::BigInt).tag("primaryKey"),
            FieldInfo::new("Label", SqlType::Text),
            FieldInfo::new("Note", SqlType::Text),
        ];
        FIELDS
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![("ID", Value::from(self.id)), ("Label", Value::from(self.label.clone()))]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get_or_default("ID")?,
            label: row.get_or_default("Label")?,
        })
    }
}
