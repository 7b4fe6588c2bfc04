/// User model and database operations
///
/// Users carry a platform-wide role (`admin`, `moderator` or `user`) plus an
/// `is_superuser` escape hatch; both feed the derived capabilities used by
/// the authorization policies. Accounts are created inactive by the
/// registration flow and flipped to active exactly once by activation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'moderator', 'user');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     username VARCHAR(150) NOT NULL UNIQUE,
///     first_name VARCHAR(150),
///     last_name VARCHAR(150),
///     bio VARCHAR(150) NOT NULL DEFAULT '',
///     role user_role NOT NULL DEFAULT 'user',
///     is_active BOOLEAN NOT NULL DEFAULT FALSE,
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Platform-wide user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full catalog and user management
    Admin,

    /// Can edit or delete any review and comment
    Moderator,

    /// Regular authenticated user
    User,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
            UserRole::User => "user",
        }
    }
}

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (stored lowercase, unique)
    pub email: String,

    /// Username (unique); derived from the email at registration
    pub username: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,

    /// Short free-text biography (empty by default)
    pub bio: String,

    /// Platform role
    pub role: UserRole,

    /// Whether the account has completed email activation
    pub is_active: bool,

    /// Superuser flag; grants admin capabilities regardless of role
    pub is_superuser: bool,

    /// Argon2id password hash
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Derived capability: superuser or role admin
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role == UserRole::Admin
    }

    /// Derived capability: admin or role moderator
    pub fn is_moderator_or_admin(&self) -> bool {
        self.is_admin() || self.role == UserRole::Moderator
    }
}

/// Input for creating a new user
///
/// New accounts are always created inactive; activation flips the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (stored lowercase)
    pub email: String,

    /// Username (unique)
    pub username: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New email address
    pub email: Option<String>,

    /// New username
    pub username: Option<String>,

    /// New first name (use Some(None) to clear)
    pub first_name: Option<Option<String>>,

    /// New last name (use Some(None) to clear)
    pub last_name: Option<Option<String>>,

    /// New biography
    pub bio: Option<String>,

    /// New role
    pub role: Option<UserRole>,

    /// New password hash
    pub password_hash: Option<String>,
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, bio, role, \
     is_active, is_superuser, password_hash, created_at, updated_at";

impl User {
    /// Creates a new, inactive user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email or username already exists (unique
    /// constraint violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.username)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Lists users with pagination, ordered by email
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY email LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// refreshed. Returns the updated user, or None if the user doesn't
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a new email or username collides with another
    /// user, or the database connection fails.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build a dynamic update statement from the present fields.
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = LOWER(${bind_count})"));
        }
        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${bind_count}"));
        }
        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${bind_count}"));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${bind_count}"));
        }
        if data.bio.is_some() {
            bind_count += 1;
            query.push_str(&format!(", bio = ${bind_count}"));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${bind_count}"));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(bio) = data.bio {
            q = q.bind(bio);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        q.fetch_optional(pool).await
    }

    /// Activates a pending account
    ///
    /// Sets `is_active = TRUE` and installs the freshly generated password
    /// hash in one statement. The `is_active = FALSE` guard makes the
    /// transition single-shot: a second activation attempt matches no row.
    pub async fn activate(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_active = TRUE, password_hash = $2, updated_at = NOW()
            WHERE id = $1 AND is_active = FALSE
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a user by ID
    ///
    /// Authored reviews and comments are removed by the cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: UserRole, is_superuser: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            username: "reader_example_com".to_string(),
            first_name: None,
            last_name: None,
            bio: String::new(),
            role,
            is_active: true,
            is_superuser,
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_admin_by_role() {
        assert!(user_with(UserRole::Admin, false).is_admin());
        assert!(!user_with(UserRole::Moderator, false).is_admin());
        assert!(!user_with(UserRole::User, false).is_admin());
    }

    #[test]
    fn test_is_admin_by_superuser_flag() {
        assert!(user_with(UserRole::User, true).is_admin());
        assert!(user_with(UserRole::Moderator, true).is_admin());
    }

    #[test]
    fn test_is_moderator_or_admin() {
        assert!(user_with(UserRole::Admin, false).is_moderator_or_admin());
        assert!(user_with(UserRole::Moderator, false).is_moderator_or_admin());
        assert!(user_with(UserRole::User, true).is_moderator_or_admin());
        assert!(!user_with(UserRole::User, false).is_moderator_or_admin());
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Moderator.as_str(), "moderator");
        assert_eq!(UserRole::User.as_str(), "user");
    }

    #[test]
    fn test_update_user_default_is_empty() {
        let update = UpdateUser::default();
        assert!(update.email.is_none());
        assert!(update.username.is_none());
        assert!(update.role.is_none());
        assert!(update.bio.is_none());
    }
}
