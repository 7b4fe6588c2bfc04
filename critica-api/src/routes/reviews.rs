/// Review endpoints
///
/// Reviews live under a title; every operation first checks that the title
/// exists (404 otherwise) and single-review operations additionally check
/// that the review belongs to that title. The one-review-per-user invariant
/// is not pre-checked here: the insert races against the `unique_review`
/// constraint and the violation surfaces as a 409.
///
/// # Endpoints
///
/// - `GET /v1/titles/:title_id/reviews` - List, newest first (public)
/// - `POST /v1/titles/:title_id/reviews` - Create (authenticated)
/// - `GET /v1/titles/:title_id/reviews/:review_id` - Retrieve (public)
/// - `PATCH /v1/titles/:title_id/reviews/:review_id` - Update (owner/staff)
/// - `DELETE /v1/titles/:title_id/reviews/:review_id` - Delete (owner/staff)
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
        review::{validate_score, CreateReview, Review, UpdateReview},
        title::Title,
    },
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

/// Create review request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    /// Review body
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: String,

    /// Score in [1, 10]
    pub score: i32,
}

/// Update review request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    /// New review body
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: Option<String>,

    /// New score in [1, 10]
    pub score: Option<i32>,
}

/// 404 unless the title exists
async fn require_title(pool: &PgPool, title_id: i64) -> Result<Title, ApiError> {
    Title::find_by_id(pool, title_id)
        .await?
        .ok_or_else(ApiError::not_found)
}

/// 404 unless the review exists under this title
async fn require_review(pool: &PgPool, title_id: i64, review_id: i64) -> Result<Review, ApiError> {
    Review::find_scoped(pool, title_id, review_id)
        .await?
        .ok_or_else(ApiError::not_found)
}

/// Lists a title's reviews, newest first
pub async fn list(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Review>>> {
    require_title(&state.db, title_id).await?;

    let reviews = Review::list_for_title(&state.db, title_id, page.limit(), page.offset()).await?;
    Ok(Json(reviews))
}

/// Creates a review
///
/// # Errors
///
/// - `400 Bad Request`: Score outside [1, 10]
/// - `401 Unauthorized`: Anonymous caller
/// - `404 Not Found`: Unknown title
/// - `409 Conflict`: Caller already reviewed this title
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(title_id): Path<i64>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    authenticated(subject.user()).require()?;
    let author = subject
        .user()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    req.validate()?;
    validate_score(req.score).map_err(|msg| ApiError::field("score", msg))?;

    require_title(&state.db, title_id).await?;

    let review = Review::create(
        &state.db,
        CreateReview {
            title_id,
            author_id: author.id,
            text: req.text,
            score: req.score,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Retrieves a review
pub async fn retrieve(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Review>> {
    let review = require_review(&state.db, title_id, review_id).await?;
    Ok(Json(review))
}

/// Updates a review's text and/or score
pub async fn update(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    let review = require_review(&state.db, title_id, review_id).await?;

    owner_or_staff_or_read_only(subject.user(), Action::Unsafe, review.author_id).require()?;

    req.validate()?;
    if let Some(score) = req.score {
        validate_score(score).map_err(|msg| ApiError::field("score", msg))?;
    }

    let review = Review::update(
        &state.db,
        review.id,
        UpdateReview {
            text: req.text,
            score: req.score,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(review))
}

/// Deletes a review and, through the cascade, its comments
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let review = require_review(&state.db, title_id, review_id).await?;

    owner_or_staff_or_read_only(subject.user(), Action::Unsafe, review.author_id).require()?;

    Review::delete(&state.db, review.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
