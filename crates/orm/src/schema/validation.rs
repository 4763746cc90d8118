//! Structural well-formedness checks for schema declarations
//!
//! Validation collects every violation instead of stopping at the first one,
//! so a broken declaration can be fixed in a single pass.

use std::collections::HashSet;

use super::relationships::{RelationshipMetadata, RelationshipType};
use super::table::TableDef;
use super::Schema;
use crate::error::SchemaViolation;

/// Check a schema and return every violation found
pub fn validate_schema(schema: &Schema) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    let mut seen_tables = HashSet::new();
    for table in &schema.tables {
        if !seen_tables.insert(table.name.as_str()) {
            violations.push(SchemaViolation::DuplicateTable {
                table: table.name.clone(),
            });
        }
        validate_table(table, &mut violations);
        validate_foreign_keys(schema, table, &mut violations);
    }

    for relationship in &schema.relationships {
        validate_relationship(schema, relationship, &mut violations);
    }

    violations
}

fn validate_table(table: &TableDef, violations: &mut Vec<SchemaViolation>) {
    let mut seen_columns = HashSet::new();
    for column in &table.columns {
        if !seen_columns.insert(column.name.as_str()) {
            violations.push(SchemaViolation::DuplicateColumn {
                table: table.name.clone(),
                column: column.name.clone(),
            });
        }
    }

    let column_keys = table.columns.iter().filter(|c| c.primary_key).count();
    match &table.composite_key {
        Some(_) if column_keys > 0 => {
            violations.push(SchemaViolation::ConflictingPrimaryKey {
                table: table.name.clone(),
            });
        }
        Some(key) if key.is_empty() => {
            violations.push(SchemaViolation::MissingPrimaryKey {
                table: table.name.clone(),
            });
        }
        Some(key) => {
            let mut seen_key = HashSet::new();
            for column in key {
                if table.column(column).is_none() {
                    violations.push(SchemaViolation::UnknownKeyColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                    });
                }
                if !seen_key.insert(column.as_str()) {
                    violations.push(SchemaViolation::RepeatedKeyColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
        None if column_keys == 0 => {
            violations.push(SchemaViolation::MissingPrimaryKey {
                table: table.name.clone(),
            });
        }
        None => {}
    }
}

fn validate_foreign_keys(schema: &Schema, table: &TableDef, violations: &mut Vec<SchemaViolation>) {
    for (column, target) in table.foreign_keys() {
        let Some(target_table) = schema.table(&target.table) else {
            violations.push(SchemaViolation::UnknownReferencedTable {
                table: table.name.clone(),
                column: column.name.clone(),
                target_table: target.table.clone(),
            });
            continue;
        };

        let target_key = target_table
            .single_primary_key()
            .filter(|key| key.name == target.column);

        match target_key {
            None => violations.push(SchemaViolation::ForeignKeyNotPrimary {
                table: table.name.clone(),
                column: column.name.clone(),
                target_table: target.table.clone(),
                target_column: target.column.clone(),
            }),
            Some(key) if !column.column_type.can_reference(key.column_type) => {
                violations.push(SchemaViolation::IncompatibleForeignKeyType {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    target_table: target.table.clone(),
                    target_column: target.column.clone(),
                })
            }
            Some(_) => {}
        }
    }
}

/// True when `table.column` is declared as a foreign key to `target_table.target_column`
fn is_foreign_key_to(
    schema: &Schema,
    table: &str,
    column: &str,
    target_table: &str,
    target_column: &str,
) -> bool {
    schema
        .table(table)
        .and_then(|t| t.column(column))
        .and_then(|c| c.references.as_ref())
        .map_or(false, |r| r.table == target_table && r.column == target_column)
}

fn validate_relationship(
    schema: &Schema,
    relationship: &RelationshipMetadata,
    violations: &mut Vec<SchemaViolation>,
) {
    let mut invalid = |reason: String| {
        violations.push(SchemaViolation::InvalidRelationship {
            table: relationship.table.clone(),
            relationship: relationship.name.clone(),
            reason,
        });
    };

    let Some(table) = schema.table(&relationship.table) else {
        invalid(format!("unknown table '{}'", relationship.table));
        return;
    };
    let Some(related) = schema.table(&relationship.related_table) else {
        invalid(format!("unknown related table '{}'", relationship.related_table));
        return;
    };

    if relationship.fields.is_empty() || relationship.fields.len() != relationship.references.len() {
        invalid("fields and references must be non-empty and of equal length".to_string());
        return;
    }

    for field in &relationship.fields {
        if table.column(field).is_none() {
            invalid(format!("unknown column '{}.{}'", table.name, field));
        }
    }
    for reference in &relationship.references {
        if related.column(reference).is_none() {
            invalid(format!("unknown column '{}.{}'", related.name, reference));
        }
    }

    if relationship.relationship_type.requires_pivot() != relationship.pivot.is_some() {
        invalid(format!(
            "{:?} relationships {} a pivot table",
            relationship.relationship_type,
            if relationship.relationship_type.requires_pivot() { "require" } else { "must not declare" }
        ));
        return;
    }

    let pairs = relationship.fields.iter().zip(&relationship.references);
    match relationship.relationship_type {
        RelationshipType::BelongsTo => {
            for (field, reference) in pairs {
                if !is_foreign_key_to(schema, &table.name, field, &related.name, reference) {
                    invalid(format!(
                        "{}.{} is not a foreign key to {}.{}",
                        table.name, field, related.name, reference
                    ));
                }
            }
        }
        RelationshipType::HasOne | RelationshipType::HasMany => {
            for (field, reference) in pairs {
                if !is_foreign_key_to(schema, &related.name, reference, &table.name, field) {
                    invalid(format!(
                        "{}.{} is not a foreign key to {}.{}",
                        related.name, reference, table.name, field
                    ));
                }
            }
        }
        RelationshipType::ManyToMany => {
            let Some(pivot) = &relationship.pivot else {
                return;
            };
            if schema.table(&pivot.table).is_none() {
                invalid(format!("unknown pivot table '{}'", pivot.table));
                return;
            }
            if !is_foreign_key_to(schema, &pivot.table, &pivot.local_key, &table.name, &relationship.fields[0]) {
                invalid(format!(
                    "{}.{} is not a foreign key to {}.{}",
                    pivot.table, pivot.local_key, table.name, relationship.fields[0]
                ));
            }
            if !is_foreign_key_to(
                schema,
                &pivot.table,
                &pivot.related_key,
                &related.name,
                &relationship.references[0],
            ) {
                invalid(format!(
                    "{}.{} is not a foreign key to {}.{}",
                    pivot.table, pivot.related_key, related.name, relationship.references[0]
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::ColumnDef;
    use crate::schema::relationships::PivotConfig;

    fn users() -> TableDef {
        TableDef::new("users")
            .with_column(ColumnDef::serial("id").primary_key())
            .with_column(ColumnDef::text("full_name"))
    }

    fn posts() -> TableDef {
        TableDef::new("posts")
            .with_column(ColumnDef::serial("id").primary_key())
            .with_column(ColumnDef::integer("author_id").not_null().references("users", "id"))
    }

    #[test]
    fn test_valid_schema_has_no_violations() {
        let schema = Schema::new()
            .with_table(users())
            .with_table(posts())
            .with_relationship(RelationshipMetadata::belongs_to("posts", "author", "users", "author_id", "id"))
            .with_relationship(RelationshipMetadata::has_many("users", "posts", "posts", "id", "author_id"));

        assert!(validate_schema(&schema).is_empty());
    }

    #[test]
    fn test_composite_key_must_name_existing_columns() {
        let pivot = TableDef::new("post_tags")
            .with_column(ColumnDef::integer("post_id").not_null())
            .with_composite_key(&["post_id", "tag_id", "post_id"]);

        let violations = validate_schema(&Schema::new().with_table(pivot));
        assert!(violations.contains(&SchemaViolation::UnknownKeyColumn {
            table: "post_tags".to_string(),
            column: "tag_id".to_string(),
        }));
        assert!(violations.contains(&SchemaViolation::RepeatedKeyColumn {
            table: "post_tags".to_string(),
            column: "post_id".to_string(),
        }));
    }

    #[test]
    fn test_missing_and_conflicting_primary_keys() {
        let keyless = TableDef::new("logs").with_column(ColumnDef::text("line"));
        let both = TableDef::new("pairs")
            .with_column(ColumnDef::serial("id").primary_key())
            .with_column(ColumnDef::integer("other"))
            .with_composite_key(&["id", "other"]);

        let violations = validate_schema(&Schema::new().with_table(keyless).with_table(both));
        assert_eq!(
            violations,
            vec![
                SchemaViolation::MissingPrimaryKey { table: "logs".to_string() },
                SchemaViolation::ConflictingPrimaryKey { table: "pairs".to_string() },
            ]
        );
    }

    #[test]
    fn test_foreign_key_must_target_primary_key() {
        let profiles = TableDef::new("profiles")
            .with_column(ColumnDef::serial("id").primary_key())
            .with_column(ColumnDef::text("owner").references("users", "full_name"));

        let violations = validate_schema(&Schema::new().with_table(users()).with_table(profiles));
        assert_eq!(
            violations,
            vec![SchemaViolation::ForeignKeyNotPrimary {
                table: "profiles".to_string(),
                column: "owner".to_string(),
                target_table: "users".to_string(),
                target_column: "full_name".to_string(),
            }]
        );
    }

    #[test]
    fn test_foreign_key_to_unknown_table() {
        let violations = validate_schema(&Schema::new().with_table(posts()));
        assert_eq!(
            violations,
            vec![SchemaViolation::UnknownReferencedTable {
                table: "posts".to_string(),
                column: "author_id".to_string(),
                target_table: "users".to_string(),
            }]
        );
    }

    #[test]
    fn test_foreign_key_type_mismatch() {
        let notes = TableDef::new("notes")
            .with_column(ColumnDef::serial("id").primary_key())
            .with_column(ColumnDef::varchar("user_id", 32).references("users", "id"));

        let violations = validate_schema(&Schema::new().with_table(users()).with_table(notes));
        assert!(matches!(
            violations.as_slice(),
            [SchemaViolation::IncompatibleForeignKeyType { column, .. }] if column == "user_id"
        ));
    }

    #[test]
    fn test_relationship_direction_is_checked() {
        // has_one with the key on the wrong side
        let schema = Schema::new()
            .with_table(users())
            .with_table(posts())
            .with_relationship(RelationshipMetadata::has_one("posts", "author", "users", "author_id", "id"));

        let violations = validate_schema(&schema);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("users.id is not a foreign key to posts.author_id"));
    }

    #[test]
    fn test_many_to_many_requires_pivot_keys() {
        let tags = TableDef::new("tags").with_column(ColumnDef::serial("id").primary_key());
        let post_tags = TableDef::new("post_tags")
            .with_column(ColumnDef::integer("post_id").not_null().references("posts", "id"))
            .with_column(ColumnDef::integer("tag_id").not_null())
            .with_composite_key(&["post_id", "tag_id"]);

        let schema = Schema::new()
            .with_table(users())
            .with_table(posts())
            .with_table(tags)
            .with_table(post_tags)
            .with_relationship(RelationshipMetadata::many_to_many(
                "posts",
                "tags",
                "tags",
                PivotConfig::new("post_tags", "post_id", "tag_id"),
            ));

        let violations = validate_schema(&schema);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("post_tags.tag_id is not a foreign key to tags.id"));
    }

    #[test]
    fn test_pivot_on_plain_relationship_is_rejected() {
        let rel = RelationshipMetadata::has_many("users", "posts", "posts", "id", "author_id")
            .with_pivot(PivotConfig::new("posts", "author_id", "id"));
        let schema = Schema::new().with_table(users()).with_table(posts()).with_relationship(rel);

        let violations = validate_schema(&schema);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].to_string().contains("must not declare a pivot table"));
    }
}
