/// Category model and database operations
///
/// Categories are simple named, slugged reference entities ("Films",
/// "Books", ...). The slug is the public identifier; there is no update
/// operation. Deleting a category leaves its titles in place with a null
/// category (SET NULL on the foreign key).
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Category of catalogued works
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Internal numeric ID (not exposed in API representations)
    #[serde(skip_serializing)]
    pub id: i64,

    /// Display name
    pub name: String,

    /// Unique URL-safe identifier
    pub slug: String,
}

/// Input for creating a new category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    /// Display name
    pub name: String,

    /// Unique URL-safe identifier
    pub slug: String,
}

impl Category {
    /// Creates a new category
    ///
    /// # Errors
    ///
    /// Returns an error if the slug already exists or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(pool)
        .await
    }

    /// Finds a category by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Lists categories ordered by name, optionally filtered by a
    /// case-insensitive name substring
    pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        match search {
            Some(needle) => {
                sqlx::query_as::<_, Category>(
                    "SELECT id, name, slug FROM categories WHERE name ILIKE '%' || $1 || '%' ORDER BY name",
                )
                .bind(super::escape_like(needle))
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name")
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Deletes a category by slug
    ///
    /// Titles referencing it keep existing with a null category.
    pub async fn delete_by_slug(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
