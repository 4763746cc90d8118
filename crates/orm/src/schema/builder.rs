//! Schema Builder - renders table declarations into DDL statements
//!
//! Used by the migration generator to turn the declared schema into the SQL
//! body of a migration file.

use super::table::TableDef;

/// Collects `CREATE TABLE` statements for a sequence of tables
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Add a `CREATE TABLE` statement for a declared table
    pub fn create_table(&mut self, table: &TableDef) -> &mut Self {
        self.statements.push(TableBuilder::from_table(table).to_sql());
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements joined into one SQL script
    pub fn build(&self) -> String {
        self.statements.join("\n\n")
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Table builder for CREATE TABLE statements
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
}

impl TableBuilder {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Build the statement for a declared table: columns first, then the
    /// composite key, then one named constraint per foreign key.
    pub fn from_table(table: &TableDef) -> Self {
        let mut builder = Self::new(&table.name);

        for column in &table.columns {
            let mut definition = format!("{} {}", column.name, column.column_type.sql_type());
            if column.primary_key {
                definition.push_str(" PRIMARY KEY");
            } else if column.not_null {
                definition.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                definition.push_str(&format!(" DEFAULT {}", default));
            }
            builder.column(&definition);
        }

        if let Some(key) = &table.composite_key {
            let columns: Vec<&str> = key.iter().map(String::as_str).collect();
            builder.primary_key(&columns);
        }

        for (column, target) in table.foreign_keys() {
            builder.foreign_key(&column.name, &target.table, &target.column);
        }

        builder
    }

    /// Add a raw column definition
    pub fn column(&mut self, definition: &str) -> &mut Self {
        self.columns.push(definition.to_string());
        self
    }

    /// Add a primary key constraint
    pub fn primary_key(&mut self, columns: &[&str]) -> &mut Self {
        self.constraints.push(format!(
            "CONSTRAINT {}_{}_pk PRIMARY KEY ({})",
            self.table_name,
            columns.join("_"),
            columns.join(", ")
        ));
        self
    }

    /// Add a foreign key constraint
    pub fn foreign_key(
        &mut self,
        column: &str,
        references_table: &str,
        references_column: &str,
    ) -> &mut Self {
        self.constraints.push(format!(
            "CONSTRAINT {}_{}_{}_{}_fk FOREIGN KEY ({}) REFERENCES {} ({})",
            self.table_name,
            column,
            references_table,
            references_column,
            column,
            references_table,
            references_column
        ));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.clone());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.table_name,
            parts.join(",\n    ")
        )
    }
}
