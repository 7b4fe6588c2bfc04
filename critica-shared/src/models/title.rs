/// Title model and database operations
///
/// A title is a catalogued work: a name, an optional release year, an
/// optional category and any number of genres. The `rating` field is never
/// stored; every SELECT recomputes it as the mean of the title's review
/// scores, so it reflects whatever review rows are visible at query time.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE titles (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     year INTEGER,
///     description TEXT NOT NULL DEFAULT '',
///     category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL
/// );
///
/// CREATE TABLE title_genres (
///     title_id BIGINT NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
///     genre_id BIGINT NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
///     PRIMARY KEY (title_id, genre_id)
/// );
/// ```
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Title model representing a catalogued work
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Title {
    /// Unique title ID
    pub id: i64,

    /// Name of the work
    pub name: String,

    /// Optional release year
    pub year: Option<i32>,

    /// Free-text description (empty by default)
    pub description: String,

    /// Optional category reference
    pub category_id: Option<i64>,

    /// Mean review score, computed at read time; None when no reviews exist
    pub rating: Option<f64>,
}

/// Input for creating a new title
///
/// Category and genres are referenced by internal ID; the handler resolves
/// slugs before calling in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTitle {
    /// Name of the work
    pub name: String,

    /// Optional release year
    pub year: Option<i32>,

    /// Free-text description
    pub description: String,

    /// Optional category reference
    pub category_id: Option<i64>,

    /// Genres to attach
    pub genre_ids: Vec<i64>,
}

/// Input for updating an existing title
///
/// All fields are optional. `category_id: Some(None)` clears the category;
/// `genre_ids: Some(...)` replaces the attached genre set wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTitle {
    /// New name
    pub name: Option<String>,

    /// New release year (use Some(None) to clear)
    pub year: Option<Option<i32>>,

    /// New description
    pub description: Option<String>,

    /// New category (use Some(None) to clear)
    pub category_id: Option<Option<i64>>,

    /// Replacement genre set
    pub genre_ids: Option<Vec<i64>>,
}

/// Query filters for listing titles
///
/// All filters combine with AND; absent filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleFilter {
    /// Category slug, exact match
    pub category: Option<String>,

    /// Genre slug, exact match (title must carry the genre)
    pub genre: Option<String>,

    /// Case-insensitive name substring
    pub name: Option<String>,

    /// Release year, exact match
    pub year: Option<i32>,
}

/// Columns selected for every title read, including the derived rating.
const TITLE_SELECT: &str = "SELECT t.id, t.name, t.year, t.description, t.category_id, \
     (SELECT AVG(r.score)::float8 FROM reviews r WHERE r.title_id = t.id) AS rating \
     FROM titles t";

impl Title {
    /// Creates a new title together with its genre attachments
    ///
    /// The title row and its join rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced category or genre ID does not exist
    /// (foreign key violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateTitle) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO titles (name, year, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&data.name)
        .bind(data.year)
        .bind(&data.description)
        .bind(data.category_id)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in &data.genre_ids {
            sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a title by ID, with its current rating
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Title>(&format!("{TITLE_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists titles matching the filter, ordered by name
    pub async fn list(
        pool: &PgPool,
        filter: &TitleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        // Build the WHERE clause from the present filters; binds are applied
        // below in the same order the clauses are appended.
        let mut query = format!("{TITLE_SELECT} WHERE TRUE");
        let mut bind_count = 0;

        if filter.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM categories c \
                 WHERE c.id = t.category_id AND c.slug = ${bind_count})"
            ));
        }
        if filter.genre.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM title_genres tg \
                 JOIN genres g ON g.id = tg.genre_id \
                 WHERE tg.title_id = t.id AND g.slug = ${bind_count})"
            ));
        }
        if filter.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.name ILIKE '%' || ${bind_count} || '%'"));
        }
        if filter.year.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.year = ${bind_count}"));
        }

        query.push_str(&format!(
            " ORDER BY t.name LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, Title>(&query);

        if let Some(ref category) = filter.category {
            q = q.bind(category);
        }
        if let Some(ref genre) = filter.genre {
            q = q.bind(genre);
        }
        if let Some(ref name) = filter.name {
            q = q.bind(super::escape_like(name));
        }
        if let Some(year) = filter.year {
            q = q.bind(year);
        }

        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Updates an existing title
    ///
    /// Field updates and the genre-set replacement happen in one
    /// transaction. Returns the updated title, or None if it doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTitle,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut query = String::from("UPDATE titles SET id = id");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.year.is_some() {
            bind_count += 1;
            query.push_str(&format!(", year = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.category_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category_id = ${bind_count}"));
        }

        query.push_str(" WHERE id = $1 RETURNING id");

        let mut q = sqlx::query_as::<_, (i64,)>(&query).bind(id);

        if let Some(ref name) = data.name {
            q = q.bind(name);
        }
        if let Some(year) = data.year {
            q = q.bind(year);
        }
        if let Some(ref description) = data.description {
            q = q.bind(description);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }

        let updated = q.fetch_optional(&mut *tx).await?;
        if updated.is_none() {
            return Ok(None);
        }

        if let Some(genre_ids) = data.genre_ids {
            sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for genre_id in genre_ids {
                sqlx::query("INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(genre_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Self::find_by_id(pool, id).await
    }

    /// Deletes a title by ID
    ///
    /// Its reviews, their comments and its genre attachments are removed by
    /// the cascades.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_filter_default_matches_everything() {
        let filter = TitleFilter::default();
        assert!(filter.category.is_none());
        assert!(filter.genre.is_none());
        assert!(filter.name.is_none());
        assert!(filter.year.is_none());
    }

    #[test]
    fn test_update_title_clear_category() {
        let update = UpdateTitle {
            category_id: Some(None),
            ..Default::default()
        };
        assert_eq!(update.category_id, Some(None));
        assert!(update.name.is_none());
    }
}
