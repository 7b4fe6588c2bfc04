/// Authentication endpoints
///
/// The registration flow is email-only: the username is derived from the
/// address, the account starts inactive, and the caller proves control of
/// the mailbox by echoing back a one-time confirmation code. Activation is
/// the only way to obtain a first token pair.
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new account, mail a code
/// - `POST /v1/auth/activate` - Exchange the code for a JWT pair
/// - `POST /v1/auth/refresh` - Refresh an access token
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use critica_shared::{
    auth::{confirmation, jwt, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address; the username is derived from it
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Register response
///
/// The confirmation code is never part of the response body; it only
/// travels by email.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Registered email address
    pub email: String,

    /// Human-readable confirmation
    pub message: String,
}

/// Activate request
#[derive(Debug, Deserialize, Validate)]
pub struct ActivateRequest {
    /// Email address used at registration
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Code received by email
    pub confirmation_code: String,
}

/// Activate response
#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Derives the username from an email address
///
/// `@` and `.` become `_`, so `reader@example.com` registers as
/// `reader_example_com`.
pub fn derive_username(email: &str) -> String {
    email.replace(['@', '.'], "_")
}

/// Removes a just-created account after a failed registration step
///
/// Without a delivered code the account would be stuck inactive forever and
/// its email locked behind the unique constraint; deleting it lets the same
/// address retry cleanly.
async fn discard_registration(pool: &PgPool, user_id: Uuid) {
    if let Err(delete_err) = User::delete(pool, user_id).await {
        tracing::error!(
            user_id = %user_id,
            error = %delete_err,
            "Failed to roll back account after registration failure"
        );
    }
}

/// Register a new account
///
/// Creates an inactive user with a random unguessable password and mails a
/// one-time confirmation code. If the mail cannot be delivered the new row
/// is removed again, so a retry with the same email starts clean instead of
/// hitting the unique constraint on an orphaned account.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// { "email": "reader@example.com" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed email
/// - `409 Conflict`: Email already registered
/// - `502 Bad Gateway`: Mail delivery failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let username = derive_username(&email);

    // The account never has a usable password; the hash only anchors the
    // confirmation code fingerprint
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

    let code = match confirmation::make_code(
        state.jwt_secret(),
        user.id,
        &user.password_hash,
        user.is_active,
    ) {
        Ok(code) => code,
        Err(code_err) => {
            discard_registration(&state.db, user.id).await;
            return Err(code_err.into());
        }
    };

    if let Err(send_err) = state.mailer.send_confirmation(&user.email, &code).await {
        discard_registration(&state.db, user.id).await;
        return Err(send_err.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            message: "A confirmation code has been sent to your email address".to_string(),
        }),
    ))
}

/// Activate an account and issue the first token pair
///
/// The failure mode is deliberately opaque: an unknown email, an already
/// active account and a wrong code all return the same generic 404, so the
/// endpoint cannot be used to probe which addresses are registered. A failed
/// attempt changes nothing, which keeps the outstanding correct code valid.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/activate
/// Content-Type: application/json
///
/// { "email": "reader@example.com", "confirmation_code": "1a2b3c-..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed email
/// - `404 Not Found`: Unknown email, already active, or wrong code
pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> ApiResult<Json<ActivateResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(ApiError::not_found)?;

    if user.is_active
        || !confirmation::verify_code(
            state.jwt_secret(),
            user.id,
            &user.password_hash,
            user.is_active,
            &req.confirmation_code,
        )
    {
        return Err(ApiError::not_found());
    }

    // Rotating the hash changes the fingerprint the code was bound to, so
    // the consumed code stops verifying
    let new_hash = password::hash_password(&password::generate_one_time_password())?;

    let user = User::activate(&state.db, user.id, &new_hash)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let pair = jwt::create_token_pair(user.id, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "Account activated");

    Ok(Json(ActivateResponse {
        access_token: pair.access,
        refresh_token: pair.refresh,
    }))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/refresh
/// Content-Type: application/json
///
/// { "refresh_token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_username() {
        assert_eq!(derive_username("reader@example.com"), "reader_example_com");
        assert_eq!(
            derive_username("first.last@mail.example.org"),
            "first_last_mail_example_org"
        );
    }
}
