/// Genre model and database operations
///
/// Genres mirror categories structurally, but a title can carry any number
/// of them through the `title_genres` join table. Deleting a genre removes
/// its join rows (CASCADE), never the titles.
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Genre of catalogued works
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    /// Internal numeric ID (not exposed in API representations)
    #[serde(skip_serializing)]
    pub id: i64,

    /// Display name
    pub name: String,

    /// Unique URL-safe identifier
    pub slug: String,
}

/// Input for creating a new genre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGenre {
    /// Display name
    pub name: String,

    /// Unique URL-safe identifier
    pub slug: String,
}

/// A genre row paired with the title it is attached to
///
/// Used to batch-load the genres for a page of titles in one query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TitleGenre {
    /// The owning title
    pub title_id: i64,

    /// The attached genre
    #[sqlx(flatten)]
    pub genre: Genre,
}

impl Genre {
    /// Creates a new genre
    ///
    /// # Errors
    ///
    /// Returns an error if the slug already exists or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, data: CreateGenre) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
        )
        .bind(data.name)
        .bind(data.slug)
        .fetch_one(pool)
        .await
    }

    /// Finds a genre by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Lists genres ordered by name, optionally filtered by a
    /// case-insensitive name substring
    pub async fn list(pool: &PgPool, search: Option<&str>) -> Result<Vec<Self>, sqlx::Error> {
        match search {
            Some(needle) => {
                sqlx::query_as::<_, Genre>(
                    "SELECT id, name, slug FROM genres WHERE name ILIKE '%' || $1 || '%' ORDER BY name",
                )
                .bind(super::escape_like(needle))
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres ORDER BY name")
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Loads the genres attached to each of the given titles
    pub async fn for_titles(
        pool: &PgPool,
        title_ids: &[i64],
    ) -> Result<Vec<TitleGenre>, sqlx::Error> {
        sqlx::query_as::<_, TitleGenre>(
            r#"
            SELECT tg.title_id, g.id, g.name, g.slug
            FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = ANY($1)
            ORDER BY g.name
            "#,
        )
        .bind(title_ids)
        .fetch_all(pool)
        .await
    }

    /// Deletes a genre by slug
    ///
    /// Join rows pointing at it are removed by the cascade.
    pub async fn delete_by_slug(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
