/// Category endpoints
///
/// Categories are admin-managed reference data keyed by slug. There is no
/// retrieve or update operation.
///
/// # Endpoints
///
/// - `GET /v1/categories?search=` - List (public)
/// - `POST /v1/categories` - Create (admin)
/// - `DELETE /v1/categories/:slug` - Delete (admin)
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
    models::category::{Category, CreateCategory},
};
use serde::Deserialize;
use validator::Validate;

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive name substring
    pub search: Option<String>,
}

/// Create category request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    /// Display name
    #[validate(length(min = 1, max = 256, message = "Name must be 1 to 256 characters"))]
    pub name: String,

    /// Unique URL-safe identifier
    #[validate(length(min = 1, max = 50, message = "Slug must be 1 to 50 characters"))]
    pub slug: String,
}

/// Lists categories ordered by name
pub async fn list(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Category>>> {
    admin_or_read_only(subject.user(), Action::Safe).require()?;

    let categories = Category::list(&state.db, query.search.as_deref()).await?;
    Ok(Json(categories))
}

/// Creates a category
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;
    req.validate()?;

    let category = Category::create(
        &state.db,
        CreateCategory {
            name: req.name,
            slug: req.slug,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Deletes a category by slug
///
/// Titles keep existing with a null category.
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;

    if !Category::delete_by_slug(&state.db, &slug).await? {
        return Err(ApiError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
