/// Comment endpoints
///
/// Comments hang off a review, which itself hangs off a title. Every
/// operation verifies the review belongs to the given title before touching
/// anything; a mismatch is a structural 404, never an authorization error.
///
/// # Endpoints
///
/// - `GET .../reviews/:review_id/comments` - List, newest first (public)
/// - `POST .../reviews/:review_id/comments` - Create (authenticated)
/// - `GET .../comments/:comment_id` - Retrieve (public)
/// - `PATCH .../comments/:comment_id` - Update (owner/staff)
/// - `DELETE .../comments/:comment_id` - Delete (owner/staff)
use crate::{
    app::{AppState, Subject},
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use critica_shared::{
    auth::policy::{authenticated, owner_or_staff_or_read_only, Action},
    models::{
        comment::{Comment, CreateComment},
        review::Review,
    },
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Comment body
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,
}

/// Update comment request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    /// New comment body
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,
}

/// 404 unless the review exists under this title
async fn require_review(pool: &PgPool, title_id: i64, review_id: i64) -> Result<Review, ApiError> {
    Review::find_scoped(pool, title_id, review_id)
        .await?
        .ok_or_else(ApiError::not_found)
}

/// 404 unless the comment exists under this review
async fn require_comment(
    pool: &PgPool,
    review_id: i64,
    comment_id: i64,
) -> Result<Comment, ApiError> {
    Comment::find_scoped(pool, review_id, comment_id)
        .await?
        .ok_or_else(ApiError::not_found)
}

/// Lists a review's comments, newest first
pub async fn list(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Comment>>> {
    require_review(&state.db, title_id, review_id).await?;

    let comments =
        Comment::list_for_review(&state.db, review_id, page.limit(), page.offset()).await?;
    Ok(Json(comments))
}

/// Creates a comment
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    authenticated(subject.user()).require()?;
    let author = subject
        .user()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    req.validate()?;

    require_review(&state.db, title_id, review_id).await?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            review_id,
            author_id: author.id,
            text: req.text,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Retrieves a comment
pub async fn retrieve(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<Json<Comment>> {
    require_review(&state.db, title_id, review_id).await?;
    let comment = require_comment(&state.db, review_id, comment_id).await?;
    Ok(Json(comment))
}

/// Updates a comment's text
pub async fn update(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    require_review(&state.db, title_id, review_id).await?;
    let comment = require_comment(&state.db, review_id, comment_id).await?;

    owner_or_staff_or_read_only(subject.user(), Action::Unsafe, comment.author_id).require()?;

    req.validate()?;

    let comment = Comment::update(&state.db, comment.id, &req.text)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(comment))
}

/// Deletes a comment
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<StatusCode> {
    require_review(&state.db, title_id, review_id).await?;
    let comment = require_comment(&state.db, review_id, comment_id).await?;

    owner_or_staff_or_read_only(subject.user(), Action::Unsafe, comment.author_id).require()?;

    Comment::delete(&state.db, comment.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
