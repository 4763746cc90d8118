//! Typed rows for the postboard tables
//!
//! These structs are the typed surface a data-access layer builds queries
//! against. Each implements [`Entity`], tying the Rust type to its declared
//! table so the two cannot drift apart silently.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::schema::{blog, TableDef};

/// A row type backed by a declared table
pub trait Entity: Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> {
    /// Table name for this entity
    fn table_name() -> &'static str;

    /// The table declaration this entity maps to
    fn definition() -> TableDef;

    /// Column names in the order the struct declares its fields
    fn columns() -> &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i32,
    pub user_id: i32,
    pub bio: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub text: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostCategory {
    pub post_id: i32,
    pub category_id: i32,
}

impl Entity for User {
    fn table_name() -> &'static str {
        blog::USERS
    }

    fn definition() -> TableDef {
        blog::users()
    }

    fn columns() -> &'static [&'static str] {
        &["id", "full_name", "phone_number", "address", "score"]
    }
}

impl Entity for Profile {
    fn table_name() -> &'static str {
        blog::PROFILES
    }

    fn definition() -> TableDef {
        blog::profiles()
    }

    fn columns() -> &'static [&'static str] {
        &["id", "user_id", "bio", "created_at", "updated_at"]
    }
}

impl Entity for Post {
    fn table_name() -> &'static str {
        blog::POSTS
    }

    fn definition() -> TableDef {
        blog::posts()
    }

    fn columns() -> &'static [&'static str] {
        &["id", "author_id", "text", "created_at", "updated_at"]
    }
}

impl Entity for Category {
    fn table_name() -> &'static str {
        blog::CATEGORIES
    }

    fn definition() -> TableDef {
        blog::categories()
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name"]
    }
}

impl Entity for PostCategory {
    fn table_name() -> &'static str {
        blog::POST_CATEGORIES
    }

    fn definition() -> TableDef {
        blog::post_categories()
    }

    fn columns() -> &'static [&'static str] {
        &["post_id", "category_id"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matches_definition<E: Entity>() {
        let definition = E::definition();
        assert_eq!(definition.name, E::table_name());

        let declared: Vec<&str> = definition.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(declared, E::columns(), "columns of {}", E::table_name());
    }

    #[test]
    fn test_entities_match_declared_tables() {
        assert_matches_definition::<User>();
        assert_matches_definition::<Profile>();
        assert_matches_definition::<Post>();
        assert_matches_definition::<Category>();
        assert_matches_definition::<PostCategory>();
    }

    #[test]
    fn test_entity_serialization() {
        let user = User {
            id: 1,
            full_name: Some("Ada Lovelace".to_string()),
            phone_number: None,
            address: None,
            score: Some(42),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["full_name"], "Ada Lovelace");
        assert_eq!(json["score"], 42);
        assert!(json["phone_number"].is_null());
    }
}
