//! # Critica Shared Library
//!
//! This crate contains the domain models, authentication primitives and the
//! authorization policy engine shared by the Critica API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, catalog entities, reviews, comments)
//! - `auth`: Password hashing, JWT issuance, confirmation codes, policies
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Critica shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
