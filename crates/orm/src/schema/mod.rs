//! Schema Definition
//!
//! Tables, columns and relationships are declared as plain data. Nothing here
//! talks to a database: the structure is validated, ordered by foreign key
//! dependencies and rendered to DDL for the migration generator.

pub mod blog;
pub mod builder;
pub mod column;
pub mod relationships;
pub mod table;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use builder::{SchemaBuilder, TableBuilder};
pub use column::{ColumnDef, ColumnType, ForeignKeyRef};
pub use relationships::{PivotConfig, RelationshipMetadata, RelationshipType};
pub use table::TableDef;

use crate::error::{SchemaError, SchemaResult};

/// A complete schema: ordered tables plus relationship descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<TableDef>,
    pub relationships: Vec<RelationshipMetadata>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipMetadata) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Relationships declared on `table`
    pub fn relationships_of<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a RelationshipMetadata> + 'a {
        self.relationships.iter().filter(move |r| r.table == table)
    }

    /// Check structural well-formedness
    pub fn validate(&self) -> SchemaResult<()> {
        let violations = validation::validate_schema(self);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Invalid(violations))
        }
    }

    /// Tables ordered so that every referenced table comes before the
    /// tables referencing it. Ties keep declaration order.
    pub fn creation_order(&self) -> SchemaResult<Vec<&TableDef>> {
        let mut ordered: Vec<&TableDef> = Vec::with_capacity(self.tables.len());
        let mut remaining: Vec<&TableDef> = self.tables.iter().collect();

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|table| {
                table.depends_on().iter().all(|dependency| {
                    ordered.iter().any(|t| t.name == *dependency) || self.table(dependency).is_none()
                })
            });

            match ready {
                Some(index) => ordered.push(remaining.remove(index)),
                None => {
                    return Err(SchemaError::CircularDependency {
                        tables: remaining.iter().map(|t| t.name.clone()).collect(),
                    })
                }
            }
        }

        Ok(ordered)
    }

    /// DDL for every table, in creation order
    pub fn to_sql(&self) -> SchemaResult<String> {
        let mut builder = SchemaBuilder::new();
        for table in self.creation_order()? {
            builder.create_table(table);
        }
        Ok(builder.build())
    }
}
