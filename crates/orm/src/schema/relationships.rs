//! Relationship descriptors - navigable associations between tables
//!
//! Relationships are a descriptive layer on top of table declarations: they
//! never change storage layout, they only record how a downstream query layer
//! can walk from one table to another.

use serde::{Deserialize, Serialize};

/// Defines the type of relationship between tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// One-to-one, the foreign key lives on the related table
    HasOne,
    /// One-to-many, the foreign key lives on the related table
    HasMany,
    /// Many-to-one, the foreign key lives on this table
    BelongsTo,
    /// Many-to-many through a pivot table
    ManyToMany,
}

impl RelationshipType {
    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }

    /// Returns true if this relationship requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

/// Pivot table configuration for many-to-many relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// The pivot table name
    pub table: String,
    /// Pivot column referencing the owning table
    pub local_key: String,
    /// Pivot column referencing the related table
    pub related_key: String,
}

impl PivotConfig {
    pub fn new(table: &str, local_key: &str, related_key: &str) -> Self {
        Self {
            table: table.to_string(),
            local_key: local_key.to_string(),
            related_key: related_key.to_string(),
        }
    }
}

/// One named relationship declared on a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    pub relationship_type: RelationshipType,

    /// Name of the relationship as seen from `table` (e.g. `profile`)
    pub name: String,

    /// The owning table
    pub table: String,

    /// The table on the other side
    pub related_table: String,

    /// Columns on `table` that take part in the join
    pub fields: Vec<String>,

    /// Columns on `related_table` matched against `fields`
    pub references: Vec<String>,

    /// Pivot table configuration for many-to-many relationships
    pub pivot: Option<PivotConfig>,
}

impl RelationshipMetadata {
    fn new(
        relationship_type: RelationshipType,
        table: &str,
        name: &str,
        related_table: &str,
        field: &str,
        reference: &str,
    ) -> Self {
        Self {
            relationship_type,
            name: name.to_string(),
            table: table.to_string(),
            related_table: related_table.to_string(),
            fields: vec![field.to_string()],
            references: vec![reference.to_string()],
            pivot: None,
        }
    }

    /// `table.field` is referenced by exactly one row of `related_table.reference`
    pub fn has_one(table: &str, name: &str, related_table: &str, field: &str, reference: &str) -> Self {
        Self::new(RelationshipType::HasOne, table, name, related_table, field, reference)
    }

    /// `table.field` is referenced by many rows of `related_table.reference`
    pub fn has_many(table: &str, name: &str, related_table: &str, field: &str, reference: &str) -> Self {
        Self::new(RelationshipType::HasMany, table, name, related_table, field, reference)
    }

    /// `table.field` is a foreign key to `related_table.reference`
    pub fn belongs_to(table: &str, name: &str, related_table: &str, field: &str, reference: &str) -> Self {
        Self::new(RelationshipType::BelongsTo, table, name, related_table, field, reference)
    }

    /// Rows of `table` and `related_table` are paired through `pivot`.
    ///
    /// Both sides join on their `id` primary key.
    pub fn many_to_many(table: &str, name: &str, related_table: &str, pivot: PivotConfig) -> Self {
        Self::new(RelationshipType::ManyToMany, table, name, related_table, "id", "id").with_pivot(pivot)
    }

    #[must_use]
    pub fn with_pivot(mut self, pivot: PivotConfig) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Fully qualified name, e.g. `users.profile`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }
}
