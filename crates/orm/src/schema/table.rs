//! Table definitions - an ordered set of columns plus key constraints.

use serde::{Deserialize, Serialize};

use super::column::{ColumnDef, ForeignKeyRef};

/// Structural declaration of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Multi-column primary key, used by join tables
    pub composite_key: Option<Vec<String>>,
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            composite_key: None,
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn with_composite_key(mut self, columns: &[&str]) -> Self {
        self.composite_key = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the columns forming this table's identity.
    ///
    /// Returns the composite key when one is declared, otherwise every
    /// column flagged as primary key.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        match &self.composite_key {
            Some(columns) => columns.iter().map(String::as_str).collect(),
            None => self
                .columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name.as_str())
                .collect(),
        }
    }

    /// The primary key column, if the table is keyed by exactly one column
    pub fn single_primary_key(&self) -> Option<&ColumnDef> {
        let keys = self.primary_key_columns();
        match keys.as_slice() {
            [name] => self.column(name),
            _ => None,
        }
    }

    /// Foreign key columns with their targets, in declaration order
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnDef, &ForeignKeyRef)> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref().map(|r| (c, r)))
    }

    /// Other tables this table references, without duplicates
    pub fn depends_on(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for (_, target) in self.foreign_keys() {
            if target.table != self.name && !tables.contains(&target.table.as_str()) {
                tables.push(&target.table);
            }
        }
        tables
    }
}
