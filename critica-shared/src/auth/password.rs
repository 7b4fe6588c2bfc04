/// Password hashing module using Argon2id
///
/// Accounts never carry a user-chosen password: registration stores the hash
/// of a server-generated one-time password, and activation overwrites it with
/// a fresh one. Hashing still uses Argon2id so the stored value is useless if
/// leaked and so every write changes the account fingerprint that
/// confirmation codes are bound to.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use critica_shared::auth::password::{generate_one_time_password, hash_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let password = generate_one_time_password();
/// let hash = hash_password(&password)?;
/// assert!(hash.starts_with("$argon2id$"));
/// # Ok(())
/// # }
/// ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, ParamsBuilder, Version,
};
use rand::{distributions::Alphanumeric, Rng};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Length of generated one-time passwords
pub const ONE_TIME_PASSWORD_LENGTH: usize = 24;

/// Generates a random alphanumeric one-time password
///
/// Used at registration and activation; the plaintext is hashed and
/// discarded, never shown to the user.
pub fn generate_one_time_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ONE_TIME_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Hashes a password using Argon2id with secure parameters
///
/// # Arguments
///
/// * `password` - The plaintext password to hash
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash)
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    // Generate a random salt using OS RNG
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)     // 3 iterations
        .p_cost(4)     // 4 parallelism
        .output_len(32) // 32-byte hash output
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("Hash should succeed");

        // Hash should start with $argon2id$
        assert!(hash.starts_with("$argon2id$"));

        // Hash should contain version
        assert!(hash.contains("v=19"));

        // Hash should contain parameters
        assert!(hash.contains("m=65536")); // 64 MB
        assert!(hash.contains("t=3"));     // 3 iterations
        assert!(hash.contains("p=4"));     // 4 parallelism
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let password = "same_password";

        let hash1 = hash_password(password).expect("Hash 1 should succeed");
        let hash2 = hash_password(password).expect("Hash 2 should succeed");

        // Different salts = different hashes
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_one_time_password_length_and_charset() {
        let password = generate_one_time_password();
        assert_eq!(password.len(), ONE_TIME_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_one_time_passwords_differ() {
        let a = generate_one_time_password();
        let b = generate_one_time_password();
        assert_ne!(a, b);
    }
}
