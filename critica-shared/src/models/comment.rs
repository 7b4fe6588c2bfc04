/// Comment model and database operations
///
/// Comments are free text attached to a review. They disappear with their
/// review (CASCADE) and with their author.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment model, joined with the author's username
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: i64,

    /// Commented review
    pub review_id: i64,

    /// Comment author
    pub author_id: Uuid,

    /// Comment body
    pub text: String,

    /// Publication timestamp
    pub pub_date: DateTime<Utc>,

    /// Author's username (loaded via JOIN on every read)
    pub author: String,
}

/// Input for creating a new comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    /// Commented review
    pub review_id: i64,

    /// Comment author
    pub author_id: Uuid,

    /// Comment body
    pub text: String,
}

const COMMENT_COLUMNS: &str =
    "c.id, c.review_id, c.author_id, c.text, c.pub_date, u.username AS author";

impl Comment {
    /// Creates a new comment
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH inserted AS (
                INSERT INTO comments (review_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {}
            FROM inserted c
            JOIN users u ON u.id = c.author_id
            "#,
            COMMENT_COLUMNS
        ))
        .bind(data.review_id)
        .bind(data.author_id)
        .bind(&data.text)
        .fetch_one(pool)
        .await
    }

    /// Finds a comment by ID within the given review
    pub async fn find_scoped(
        pool: &PgPool,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.id = $1 AND c.review_id = $2
            "#,
        ))
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a review's comments, newest first
    pub async fn list_for_review(
        pool: &PgPool,
        review_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.review_id = $1
            ORDER BY c.pub_date DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(review_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Updates a comment's text
    ///
    /// Returns the updated comment, or None if it doesn't exist.
    pub async fn update(pool: &PgPool, id: i64, text: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $2 WHERE id = $1 RETURNING *
            )
            SELECT {}
            FROM updated c
            JOIN users u ON u.id = c.author_id
            "#,
            COMMENT_COLUMNS
        ))
        .bind(id)
        .bind(text)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a comment by ID
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
