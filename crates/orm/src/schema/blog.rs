//! The postboard schema: users, profiles, posts, categories and the
//! post/category join table.

use super::column::ColumnDef;
use super::relationships::{PivotConfig, RelationshipMetadata};
use super::table::TableDef;
use super::Schema;

pub const USERS: &str = "users";
pub const PROFILES: &str = "profiles";
pub const POSTS: &str = "posts";
pub const CATEGORIES: &str = "categories";
pub const POST_CATEGORIES: &str = "post_categories";

pub fn users() -> TableDef {
    TableDef::new(USERS)
        .with_column(ColumnDef::serial("id").primary_key())
        .with_column(ColumnDef::text("full_name"))
        .with_column(ColumnDef::varchar("phone_number", 256))
        .with_column(ColumnDef::varchar("address", 256))
        .with_column(ColumnDef::integer("score"))
}

/// One-to-one with users
pub fn profiles() -> TableDef {
    TableDef::new(PROFILES)
        .with_column(ColumnDef::serial("id").primary_key())
        .with_column(ColumnDef::integer("user_id").not_null().references(USERS, "id"))
        .with_column(ColumnDef::text("bio"))
        .with_column(ColumnDef::timestamp("created_at"))
        .with_column(ColumnDef::timestamp("updated_at"))
}

/// Many posts per user
pub fn posts() -> TableDef {
    TableDef::new(POSTS)
        .with_column(ColumnDef::serial("id").primary_key())
        .with_column(ColumnDef::integer("author_id").not_null().references(USERS, "id"))
        .with_column(ColumnDef::varchar("text", 256))
        .with_column(ColumnDef::timestamp("created_at"))
        .with_column(ColumnDef::timestamp("updated_at"))
}

pub fn categories() -> TableDef {
    TableDef::new(CATEGORIES)
        .with_column(ColumnDef::serial("id").primary_key())
        .with_column(ColumnDef::varchar("name", 256))
}

/// Join table for the posts/categories many-to-many
pub fn post_categories() -> TableDef {
    TableDef::new(POST_CATEGORIES)
        .with_column(ColumnDef::integer("post_id").not_null().references(POSTS, "id"))
        .with_column(ColumnDef::integer("category_id").not_null().references(CATEGORIES, "id"))
        .with_composite_key(&["post_id", "category_id"])
}

fn post_categories_pivot() -> PivotConfig {
    PivotConfig::new(POST_CATEGORIES, "post_id", "category_id")
}

fn category_posts_pivot() -> PivotConfig {
    PivotConfig::new(POST_CATEGORIES, "category_id", "post_id")
}

pub fn relationships() -> Vec<RelationshipMetadata> {
    vec![
        RelationshipMetadata::has_one(USERS, "profile", PROFILES, "id", "user_id"),
        RelationshipMetadata::has_many(USERS, "posts", POSTS, "id", "author_id"),
        RelationshipMetadata::belongs_to(PROFILES, "user", USERS, "user_id", "id"),
        RelationshipMetadata::belongs_to(POSTS, "author", USERS, "author_id", "id"),
        RelationshipMetadata::many_to_many(POSTS, "categories", CATEGORIES, post_categories_pivot()),
        RelationshipMetadata::many_to_many(CATEGORIES, "posts", POSTS, category_posts_pivot()),
        RelationshipMetadata::belongs_to(POST_CATEGORIES, "post", POSTS, "post_id", "id"),
        RelationshipMetadata::belongs_to(POST_CATEGORIES, "category", CATEGORIES, "category_id", "id"),
    ]
}

/// The full declared schema
pub fn schema() -> Schema {
    let tables = vec![users(), profiles(), posts(), categories(), post_categories()];
    Schema {
        tables,
        relationships: relationships(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RelationshipType;

    #[test]
    fn test_schema_is_well_formed() {
        schema().validate().unwrap();
    }

    #[test]
    fn test_every_foreign_key_targets_a_primary_key() {
        let schema = schema();
        for table in &schema.tables {
            for (column, target) in table.foreign_keys() {
                let target_table = schema.table(&target.table).unwrap();
                let key = target_table.single_primary_key().unwrap();
                assert_eq!(key.name, target.column, "{}.{}", table.name, column.name);
                assert!(!column.is_nullable(), "{}.{} must be required", table.name, column.name);
            }
        }
    }

    #[test]
    fn test_join_table_identity() {
        let table = post_categories();
        assert_eq!(table.primary_key_columns(), vec!["post_id", "category_id"]);
        assert!(table.columns.iter().all(|c| !c.primary_key));
        assert_eq!(table.depends_on(), vec![POSTS, CATEGORIES]);
    }

    #[test]
    fn test_creation_order() {
        let schema = schema();
        let order: Vec<&str> = schema
            .creation_order()
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(order, vec![USERS, PROFILES, POSTS, CATEGORIES, POST_CATEGORIES]);
    }

    #[test]
    fn test_user_relationships() {
        let schema = schema();
        let rels: Vec<_> = schema.relationships_of(USERS).collect();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].relationship_type, RelationshipType::HasOne);
        assert_eq!(rels[0].related_table, PROFILES);
        assert_eq!(rels[1].relationship_type, RelationshipType::HasMany);
        assert_eq!(rels[1].related_table, POSTS);
    }

    #[test]
    fn test_user_columns() {
        let users = users();
        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "full_name", "phone_number", "address", "score"]);
        assert!(users.columns.iter().skip(1).all(|c| c.is_nullable()));
    }
}
