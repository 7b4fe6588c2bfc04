/// Genre endpoints
///
/// Structurally identical to categories: admin-managed, slug-keyed, no
/// retrieve or update.
///
/// # Endpoints
///
/// - `GET /v1/genres?search=` - List (public)
/// - `POST /v1/genres` - Create (admin)
/// - `DELETE /v1/genres/:slug` - Delete (admin)
use crate::{
    app::{AppState, Subject},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use critica_shared::{
    auth::policy::{admin_or_read_only, Action},
    models::genre::{CreateGenre, Genre},
};
use serde::Deserialize;
use validator::Validate;

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive name substring
    pub search: Option<String>,
}

/// Create genre request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenreRequest {
    /// Display name
    #[validate(length(min = 1, max = 256, message = "Name must be 1 to 256 characters"))]
    pub name: String,

    /// Unique URL-safe identifier
    #[validate(length(min = 1, max = 50, message = "Slug must be 1 to 50 characters"))]
    pub slug: String,
}

/// Lists genres ordered by name
pub async fn list(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Genre>>> {
    admin_or_read_only(subject.user(), Action::Safe).require()?;

    let genres = Genre::list(&state.db, query.search.as_deref()).await?;
    Ok(Json(genres))
}

/// Creates a genre
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<CreateGenreRequest>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;
    req.validate()?;

    let genre = Genre::create(
        &state.db,
        CreateGenre {
            name: req.name,
            slug: req.slug,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(genre)))
}

/// Deletes a genre by slug
///
/// Titles lose the genre attachment but keep existing.
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;

    if !Genre::delete_by_slug(&state.db, &slug).await? {
        return Err(ApiError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
