/// API route handlers
///
/// Handlers are thin orchestration: run the policy check, validate the
/// payload, check structural 404s, delegate to the models, serialize.
///
/// # Modules
///
/// - `auth`: Registration, activation, token refresh
/// - `categories` / `genres`: Slug-keyed catalog reference entities
/// - `titles`: Catalogued works with nested category/genre representation
/// - `reviews` / `comments`: Discussion, nested under titles
/// - `users`: Admin user management and the `/me` profile endpoints
/// - `health`: Liveness
use serde::Deserialize;

pub mod auth;
pub mod categories;
pub mod comments;
pub mod genres;
pub mod health;
pub mod reviews;
pub mod titles;
pub mod users;

/// Default page size for list endpoints
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Hard cap on page size
const MAX_PAGE_SIZE: i64 = 100;

/// Limit/offset pagination parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    /// Requested page size
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: Option<i64>,
}

impl Pagination {
    /// Effective page size, clamped to [1, 100]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Effective offset, never negative
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let page = Pagination::default();
        assert_eq!(page.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_pagination_clamped() {
        let page = Pagination {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(page.limit(), MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = Pagination {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(page.limit(), 1);
    }
}
