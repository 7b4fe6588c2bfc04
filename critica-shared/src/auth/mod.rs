/// Authentication and authorization for Critica
///
/// # Modules
///
/// - `confirmation`: Stateless one-time account confirmation codes
/// - `jwt`: HS256 access/refresh token pairs
/// - `password`: Argon2id hashing and one-time password generation
/// - `policy`: Role and ownership policy checks
pub mod confirmation;
pub mod jwt;
pub mod password;
pub mod policy;
