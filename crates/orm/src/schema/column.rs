//! Column definitions - name, semantic type, nullability, key and reference
//! information for a single table column.

use serde::{Deserialize, Serialize};

/// Semantic column types supported by the schema layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Auto-incrementing integer, assigned by the database
    Serial,
    /// 32-bit integer
    Integer,
    /// Unbounded text
    Text,
    /// Text with a maximum length
    Varchar(u32),
    /// Timestamp without time zone
    Timestamp,
}

impl ColumnType {
    /// SQL type name as used in `CREATE TABLE`
    pub fn sql_type(self) -> String {
        match self {
            ColumnType::Serial => "SERIAL".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Varchar(len) => format!("VARCHAR({})", len),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// The type values are stored as. `SERIAL` is an `INTEGER` with a sequence default.
    pub fn storage_type(self) -> ColumnType {
        match self {
            ColumnType::Serial => ColumnType::Integer,
            other => other,
        }
    }

    /// Whether a column of type `self` may reference a column of type `target`
    pub fn can_reference(self, target: ColumnType) -> bool {
        self.storage_type() == target.storage_type()
    }
}

/// Target of a foreign key column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

/// A single column of a table declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
    /// Default value as a raw SQL expression
    pub default: Option<String>,
    pub references: Option<ForeignKeyRef>,
}

impl ColumnDef {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            not_null: false,
            primary_key: false,
            default: None,
            references: None,
        }
    }

    pub fn serial(name: &str) -> Self {
        Self::new(name, ColumnType::Serial)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn varchar(name: &str, length: u32) -> Self {
        Self::new(name, ColumnType::Varchar(length))
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub fn default(mut self, expression: &str) -> Self {
        self.default = Some(expression.to_string());
        self
    }

    /// Mark this column as a foreign key to `table.column`
    #[must_use]
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some(ForeignKeyRef {
            table: table.to_string(),
            column: column.to_string(),
        });
        self
    }

    /// Primary key columns are implicitly `NOT NULL`
    pub fn is_nullable(&self) -> bool {
        !(self.not_null || self.primary_key)
    }
}
