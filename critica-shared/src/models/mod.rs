/// Database models for Critica
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, roles and derived capabilities
/// - `category`: Slugged category reference entities
/// - `genre`: Slugged genre reference entities (many-to-many with titles)
/// - `title`: Catalogued works with the derived mean rating
/// - `review`: One review per (title, author), scored 1..10
/// - `comment`: Free-text comments attached to reviews
pub mod category;
pub mod comment;
pub mod genre;
pub mod review;
pub mod title;
pub mod user;

/// Escapes LIKE/ILIKE metacharacters in user-supplied search input
///
/// `%` and `_` in a search term must match themselves, not act as
/// wildcards. Backslash is the default escape character in Postgres
/// patterns, so it is escaped first.
pub(crate) fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
