/// Title endpoints
///
/// Reads return a nested representation: the category and genre objects and
/// the derived mean rating. Writes accept category and genre slugs, which
/// are resolved to internal IDs before hitting the models; an unknown slug
/// is a field-level validation error, not a 404.
///
/// # Endpoints
///
/// - `GET /v1/titles?category=&genre=&name=&year=` - Filtered list (public)
/// - `POST /v1/titles` - Create (admin)
/// - `GET /v1/titles/:title_id` - Retrieve (public)
/// - `PATCH /v1/titles/:title_id` - Update (admin)
/// - `DELETE /v1/titles/:title_id` - Delete (admin)
use crate::{
    app::{AppState, Subject},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Datelike;
use critica_shared::{
    auth::policy::{admin_or_read_only, Action},
    models::{
        category::Category,
        genre::Genre,
        title::{CreateTitle, Title, TitleFilter, UpdateTitle},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use validator::Validate;

/// List query parameters: filters plus pagination
#[derive(Debug, Deserialize)]
pub struct TitleListQuery {
    /// Category slug, exact match
    pub category: Option<String>,

    /// Genre slug, exact match
    pub genre: Option<String>,

    /// Case-insensitive name substring
    pub name: Option<String>,

    /// Release year, exact match
    pub year: Option<i32>,

    /// Page size
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: Option<i64>,
}

/// Create title request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTitleRequest {
    /// Name of the work
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Release year, between 1 and the current year
    pub year: Option<i32>,

    /// Free-text description
    pub description: Option<String>,

    /// Category slug
    pub category: Option<String>,

    /// Genre slugs
    #[serde(default)]
    pub genre: Vec<String>,
}

/// Update title request; absent fields are left untouched
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    /// New name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    /// New release year
    pub year: Option<i32>,

    /// New description
    pub description: Option<String>,

    /// New category slug
    pub category: Option<String>,

    /// Replacement genre slug set
    pub genre: Option<Vec<String>>,
}

/// Title read representation with nested category and genres
#[derive(Debug, Serialize)]
pub struct TitleResponse {
    /// Title ID
    pub id: i64,

    /// Name of the work
    pub name: String,

    /// Release year
    pub year: Option<i32>,

    /// Mean review score; null when no reviews exist
    pub rating: Option<f64>,

    /// Free-text description
    pub description: String,

    /// Nested category object
    pub category: Option<Category>,

    /// Nested genre objects
    pub genre: Vec<Genre>,
}

fn validate_year(year: i32) -> Result<(), ApiError> {
    let current = chrono::Utc::now().year();
    if year < 1 || year > current {
        return Err(ApiError::field(
            "year",
            format!("{year} is not in range 1..{current}"),
        ));
    }
    Ok(())
}

async fn resolve_category(pool: &PgPool, slug: &str) -> Result<i64, ApiError> {
    Category::find_by_slug(pool, slug)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| ApiError::field("category", format!("Unknown category slug: {slug}")))
}

async fn resolve_genres(pool: &PgPool, slugs: &[String]) -> Result<Vec<i64>, ApiError> {
    let mut ids = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let genre = Genre::find_by_slug(pool, slug)
            .await?
            .ok_or_else(|| ApiError::field("genre", format!("Unknown genre slug: {slug}")))?;
        ids.push(genre.id);
    }
    Ok(ids)
}

/// Builds the nested representation for a page of titles
///
/// Genres are batch-loaded in one query; categories come from the small
/// reference table in another.
async fn to_responses(pool: &PgPool, titles: Vec<Title>) -> Result<Vec<TitleResponse>, ApiError> {
    let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();

    let mut genres_by_title: HashMap<i64, Vec<Genre>> = HashMap::new();
    for attachment in Genre::for_titles(pool, &ids).await? {
        genres_by_title
            .entry(attachment.title_id)
            .or_default()
            .push(attachment.genre);
    }

    let categories_by_id: HashMap<i64, Category> = Category::list(pool, None)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(titles
        .into_iter()
        .map(|title| TitleResponse {
            category: title
                .category_id
                .and_then(|id| categories_by_id.get(&id).cloned()),
            genre: genres_by_title.remove(&title.id).unwrap_or_default(),
            id: title.id,
            name: title.name,
            year: title.year,
            rating: title.rating,
            description: title.description,
        })
        .collect())
}

async fn to_response(pool: &PgPool, title: Title) -> Result<TitleResponse, ApiError> {
    let mut responses = to_responses(pool, vec![title]).await?;
    responses
        .pop()
        .ok_or_else(|| ApiError::InternalError("Title representation vanished".to_string()))
}

/// Lists titles matching the filters, ordered by name
pub async fn list(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Query(query): Query<TitleListQuery>,
) -> ApiResult<Json<Vec<TitleResponse>>> {
    admin_or_read_only(subject.user(), Action::Safe).require()?;

    let page = super::Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    let filter = TitleFilter {
        category: query.category,
        genre: query.genre,
        name: query.name,
        year: query.year,
    };

    let titles = Title::list(&state.db, &filter, page.limit(), page.offset()).await?;
    Ok(Json(to_responses(&state.db, titles).await?))
}

/// Creates a title
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<CreateTitleRequest>,
) -> ApiResult<(StatusCode, Json<TitleResponse>)> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;
    req.validate()?;
    if let Some(year) = req.year {
        validate_year(year)?;
    }

    let category_id = match &req.category {
        Some(slug) => Some(resolve_category(&state.db, slug).await?),
        None => None,
    };
    let genre_ids = resolve_genres(&state.db, &req.genre).await?;

    let title = Title::create(
        &state.db,
        CreateTitle {
            name: req.name,
            year: req.year,
            description: req.description.unwrap_or_default(),
            category_id,
            genre_ids,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(to_response(&state.db, title).await?),
    ))
}

/// Retrieves a title with its current rating
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(title_id): Path<i64>,
) -> ApiResult<Json<TitleResponse>> {
    admin_or_read_only(subject.user(), Action::Safe).require()?;

    let title = Title::find_by_id(&state.db, title_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(to_response(&state.db, title).await?))
}

/// Updates a title
pub async fn update(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(title_id): Path<i64>,
    Json(req): Json<UpdateTitleRequest>,
) -> ApiResult<Json<TitleResponse>> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;
    req.validate()?;
    if let Some(year) = req.year {
        validate_year(year)?;
    }

    let category_id = match &req.category {
        Some(slug) => Some(Some(resolve_category(&state.db, slug).await?)),
        None => None,
    };
    let genre_ids = match &req.genre {
        Some(slugs) => Some(resolve_genres(&state.db, slugs).await?),
        None => None,
    };

    let title = Title::update(
        &state.db,
        title_id,
        UpdateTitle {
            name: req.name,
            year: req.year.map(Some),
            description: req.description,
            category_id,
            genre_ids,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(to_response(&state.db, title).await?))
}

/// Deletes a title and, through the cascades, its reviews and comments
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(title_id): Path<i64>,
) -> ApiResult<StatusCode> {
    admin_or_read_only(subject.user(), Action::Unsafe).require()?;

    if !Title::delete(&state.db, title_id).await? {
        return Err(ApiError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_year_bounds() {
        let current = chrono::Utc::now().year();

        assert!(validate_year(1).is_ok());
        assert!(validate_year(current).is_ok());
        assert!(validate_year(0).is_err());
        assert!(validate_year(current + 1).is_err());
    }
}
