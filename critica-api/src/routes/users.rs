/// User management endpoints
///
/// The `/v1/users` collection is admin-only and keyed by username; it is the
/// only place roles and identity fields (email, username) can change. `/v1/users/me` is every authenticated user's
/// own profile; its PATCH accepts profile fields only, so email and username
/// can never change through it.
///
/// # Endpoints
///
/// - `GET /v1/users` - List (admin)
/// - `POST /v1/users` - Create (admin)
/// - `GET/PATCH/DELETE /v1/users/:username` - Manage (admin)
/// - `GET/PATCH /v1/users/me` - Own profile (authenticated)
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
    auth::{
        password,
        policy::{admin_only, authenticated},
    },
    models::user::{CreateUser, UpdateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User read representation; the password hash never leaves the server
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// First name
    pub first_name: Option<String>,

    /// Last name
    pub last_name: Option<String>,

    /// Biography
    pub bio: String,

    /// Platform role
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

/// Admin create request
///
/// Accounts created here skip the email confirmation flow and start active.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    /// Email address; the username is derived from it
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Initial role (defaults to regular user)
    pub role: Option<UserRole>,
}

/// Admin update request
///
/// Unlike [`ProfileUpdateRequest`], admins can rewrite the identity fields;
/// a collision with another account surfaces as a 409 through the unique
/// constraints.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New username
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters"))]
    pub username: Option<String>,

    /// New first name
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: Option<String>,

    /// New last name
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: Option<String>,

    /// New biography
    #[validate(length(max = 150, message = "Bio must be at most 150 characters"))]
    pub bio: Option<String>,

    /// New role
    pub role: Option<UserRole>,
}

/// Own-profile update request
///
/// Deliberately has no email, username or role fields; unknown fields in
/// the payload are dropped during deserialization, so sending them is a
/// no-op rather than an error.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    /// New first name
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: Option<String>,

    /// New last name
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: Option<String>,

    /// New biography
    #[validate(length(max = 150, message = "Bio must be at most 150 characters"))]
    pub bio: Option<String>,
}

/// Lists users ordered by email
pub async fn list(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    admin_only(subject.user()).require()?;

    let users = User::list(&state.db, page.limit(), page.offset()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Creates a user account without the confirmation flow
pub async fn create(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<AdminCreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    admin_only(subject.user()).require()?;
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let username = super::auth::derive_username(&email);
    let password_hash = password::hash_password(&password::generate_one_time_password())?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            username,
            password_hash,
        },
    )
    .await?;

    // Admin-created accounts are usable immediately
    let new_hash = password::hash_password(&password::generate_one_time_password())?;
    let mut user = User::activate(&state.db, user.id, &new_hash)
        .await?
        .ok_or_else(|| ApiError::InternalError("Fresh account already active".to_string()))?;

    if let Some(role) = req.role {
        user = User::update(
            &state.db,
            user.id,
            UpdateUser {
                role: Some(role),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(ApiError::not_found)?;
    }

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Retrieves a user by username
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    admin_only(subject.user()).require()?;

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}

/// Updates a user's identity, profile fields and role
pub async fn update(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(username): Path<String>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    admin_only(subject.user()).require()?;
    req.validate()?;

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let user = User::update(
        &state.db,
        user.id,
        UpdateUser {
            email: req.email.map(|e| e.trim().to_lowercase()),
            username: req.username,
            first_name: req.first_name.map(Some),
            last_name: req.last_name.map(Some),
            bio: req.bio,
            role: req.role,
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}

/// Deletes a user and, through the cascades, their reviews and comments
pub async fn remove(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    admin_only(subject.user()).require()?;

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(ApiError::not_found)?;

    User::delete(&state.db, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the caller's own profile
pub async fn me(Extension(subject): Extension<Subject>) -> ApiResult<Json<UserResponse>> {
    authenticated(subject.user()).require()?;
    let user = subject
        .user()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    Ok(Json(user.into()))
}

/// Updates the caller's own profile
///
/// Identity fields (email, username) and the role are not part of the
/// request type and therefore keep their stored values.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<UserResponse>> {
    authenticated(subject.user()).require()?;
    let user = subject
        .user()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    req.validate()?;

    let user = User::update(
        &state.db,
        user.id,
        UpdateUser {
            first_name: req.first_name.map(Some),
            last_name: req.last_name.map(Some),
            bio: req.bio,
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_update_accepts_identity_fields() {
        let req: AdminUpdateUserRequest = serde_json::from_value(json!({
            "email": "New@Example.com",
            "username": "new_name",
            "role": "moderator"
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.email.as_deref(), Some("New@Example.com"));
        assert_eq!(req.username.as_deref(), Some("new_name"));
        assert_eq!(req.role, Some(UserRole::Moderator));
    }

    #[test]
    fn test_admin_update_rejects_malformed_email() {
        let req: AdminUpdateUserRequest = serde_json::from_value(json!({
            "email": "not-an-email"
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_profile_update_drops_identity_fields() {
        // email, username and role are not part of the type, so a payload
        // carrying them deserializes to a plain profile update
        let req: ProfileUpdateRequest = serde_json::from_value(json!({
            "email": "sneaky@example.com",
            "username": "sneaky",
            "role": "admin",
            "bio": "hello"
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.bio.as_deref(), Some("hello"));
    }
}
