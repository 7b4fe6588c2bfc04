/// Review model and database operations
///
/// A review belongs to exactly one title and one author and carries an
/// integer score in [1, 10]. The `unique_review` constraint on
/// (title_id, author_id) is what enforces one-review-per-user-per-title;
/// concurrent creates race against the index, not an application pre-check.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE reviews (
///     id BIGSERIAL PRIMARY KEY,
///     title_id BIGINT NOT NULL REFERENCES titles(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 10),
///     pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT unique_review UNIQUE (title_id, author_id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Lowest accepted review score
pub const MIN_SCORE: i32 = 1;

/// Highest accepted review score
pub const MAX_SCORE: i32 = 10;

/// Validates a review score
///
/// # Errors
///
/// Returns a message naming the offending value when it falls outside
/// [1, 10].
///
/// # Example
///
/// ```
/// use critica_shared::models::review::validate_score;
///
/// assert!(validate_score(7).is_ok());
/// assert_eq!(
///     validate_score(11).unwrap_err(),
///     "11 is not in range 1..10",
/// );
/// ```
pub fn validate_score(value: i32) -> Result<(), String> {
    if (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(())
    } else {
        Err(format!("{value} is not in range 1..10"))
    }
}

/// Review model, joined with the author's username
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    /// Unique review ID
    pub id: i64,

    /// Reviewed title
    pub title_id: i64,

    /// Review author
    pub author_id: Uuid,

    /// Review body
    pub text: String,

    /// Score in [1, 10]
    pub score: i32,

    /// Publication timestamp
    pub pub_date: DateTime<Utc>,

    /// Author's username (loaded via JOIN on every read)
    pub author: String,
}

/// Input for creating a new review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    /// Reviewed title
    pub title_id: i64,

    /// Review author
    pub author_id: Uuid,

    /// Review body
    pub text: String,

    /// Score in [1, 10]; callers validate with [`validate_score`] first
    pub score: i32,
}

/// Input for updating an existing review
///
/// The duplicate-review constraint is not involved here; title and author
/// never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReview {
    /// New review body
    pub text: Option<String>,

    /// New score in [1, 10]
    pub score: Option<i32>,
}

const REVIEW_COLUMNS: &str =
    "r.id, r.title_id, r.author_id, r.text, r.score, r.pub_date, u.username AS author";

impl Review {
    /// Creates a new review
    ///
    /// # Errors
    ///
    /// Returns a database error carrying the `unique_review` constraint name
    /// when the (title, author) pair already has a review; callers map that
    /// to a conflict response.
    pub async fn create(pool: &PgPool, data: CreateReview) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {}
            FROM inserted r
            JOIN users u ON u.id = r.author_id
            "#,
            REVIEW_COLUMNS
        ))
        .bind(data.title_id)
        .bind(data.author_id)
        .bind(&data.text)
        .bind(data.score)
        .fetch_one(pool)
        .await
    }

    /// Finds a review by ID within the given title
    ///
    /// The title scoping makes `/titles/X/reviews/Y` 404 when review Y
    /// exists but hangs off a different title.
    pub async fn find_scoped(
        pool: &PgPool,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.id = $1 AND r.title_id = $2
            "#,
        ))
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a title's reviews, newest first
    pub async fn list_for_title(
        pool: &PgPool,
        title_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.title_id = $1
            ORDER BY r.pub_date DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(title_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Updates a review's text and/or score
    ///
    /// Returns the updated review, or None if it doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateReview,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            WITH updated AS (
                UPDATE reviews
                SET text = COALESCE($2, text), score = COALESCE($3, score)
                WHERE id = $1
                RETURNING *
            )
            SELECT {}
            FROM updated r
            JOIN users u ON u.id = r.author_id
            "#,
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(data.text)
        .bind(data.score)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a review by ID
    ///
    /// Its comments are removed by the cascade.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
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
    fn test_validate_score_in_range() {
        for score in 1..=10 {
            assert!(validate_score(score).is_ok(), "score {score} should pass");
        }
    }

    #[test]
    fn test_validate_score_out_of_range() {
        assert_eq!(validate_score(0).unwrap_err(), "0 is not in range 1..10");
        assert_eq!(validate_score(11).unwrap_err(), "11 is not in range 1..10");
        assert_eq!(validate_score(-3).unwrap_err(), "-3 is not in range 1..10");
    }

    #[test]
    fn test_update_review_default_is_empty() {
        let update = UpdateReview::default();
        assert!(update.text.is_none());
        assert!(update.score.is_none());
    }
}
