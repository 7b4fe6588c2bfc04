/// One-time account confirmation codes
///
/// Codes are not stored. Each code is an HMAC-SHA256 over a fingerprint of
/// the account's mutable state (id, password hash, active flag) plus an
/// issue timestamp, keyed by the server secret:
///
/// ```text
/// {timestamp_hex}-{hex(HMAC(secret, "id|password_hash|is_active|timestamp"))}
/// ```
///
/// Activation rewrites the password hash and flips the active flag, so the
/// fingerprint changes and the consumed code stops verifying. A failed
/// verification touches nothing, which keeps the outstanding correct code
/// valid no matter how many wrong guesses arrive.
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// How long an issued code stays verifiable
pub fn code_validity() -> Duration {
    Duration::days(3)
}

/// Error type for confirmation code operations
#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    /// HMAC keying failed
    #[error("Failed to key confirmation MAC: {0}")]
    KeyError(String),
}

fn fingerprint_mac(
    secret: &str,
    user_id: Uuid,
    password_hash: &str,
    is_active: bool,
    timestamp: i64,
) -> Result<HmacSha256, ConfirmationError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ConfirmationError::KeyError(e.to_string()))?;
    mac.update(user_id.as_bytes());
    mac.update(b"|");
    mac.update(password_hash.as_bytes());
    mac.update(b"|");
    mac.update(if is_active { b"1" } else { b"0" });
    mac.update(b"|");
    mac.update(timestamp.to_be_bytes().as_slice());
    Ok(mac)
}

/// Issues a confirmation code bound to the account's current state
///
/// # Errors
///
/// Returns `ConfirmationError::KeyError` if the MAC cannot be keyed.
pub fn make_code(
    secret: &str,
    user_id: Uuid,
    password_hash: &str,
    is_active: bool,
) -> Result<String, ConfirmationError> {
    let timestamp = Utc::now().timestamp();
    let mac = fingerprint_mac(secret, user_id, password_hash, is_active, timestamp)?;
    let digest = mac.finalize().into_bytes();

    Ok(format!("{:x}-{}", timestamp, hex::encode(digest)))
}

/// Verifies a confirmation code against the account's current state
///
/// Returns false for malformed codes, expired codes, codes issued against
/// different account state, and codes signed with a different secret. MAC
/// comparison is constant-time.
pub fn verify_code(
    secret: &str,
    user_id: Uuid,
    password_hash: &str,
    is_active: bool,
    code: &str,
) -> bool {
    let Some((ts_part, mac_part)) = code.split_once('-') else {
        return false;
    };
    let Ok(timestamp) = i64::from_str_radix(ts_part, 16) else {
        return false;
    };
    let Ok(expected) = hex::decode(mac_part) else {
        return false;
    };

    let age = Utc::now().timestamp() - timestamp;
    if age < 0 || age > code_validity().num_seconds() {
        return false;
    }

    let Ok(mac) = fingerprint_mac(secret, user_id, password_hash, is_active, timestamp) else {
        return false;
    };

    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
    const HASH: &str = "$argon2id$v=19$m=65536,t=3,p=4$salt$hash";

    #[test]
    fn test_code_roundtrip() {
        let user_id = Uuid::new_v4();
        let code = make_code(SECRET, user_id, HASH, false).unwrap();
        assert!(verify_code(SECRET, user_id, HASH, false, &code));
    }

    #[test]
    fn test_code_bound_to_user() {
        let code = make_code(SECRET, Uuid::new_v4(), HASH, false).unwrap();
        assert!(!verify_code(SECRET, Uuid::new_v4(), HASH, false, &code));
    }

    #[test]
    fn test_code_invalidated_by_state_change() {
        let user_id = Uuid::new_v4();
        let code = make_code(SECRET, user_id, HASH, false).unwrap();

        // Activation flips the flag and rewrites the hash
        assert!(!verify_code(SECRET, user_id, HASH, true, &code));
        assert!(!verify_code(SECRET, user_id, "$argon2id$other", false, &code));
    }

    #[test]
    fn test_code_bound_to_secret() {
        let user_id = Uuid::new_v4();
        let code = make_code(SECRET, user_id, HASH, false).unwrap();
        assert!(!verify_code("another-secret", user_id, HASH, false, &code));
    }

    #[test]
    fn test_wrong_guess_leaves_correct_code_valid() {
        let user_id = Uuid::new_v4();
        let code = make_code(SECRET, user_id, HASH, false).unwrap();

        assert!(!verify_code(SECRET, user_id, HASH, false, "deadbeef-0000"));
        assert!(!verify_code(SECRET, user_id, HASH, false, "not even a code"));

        // The real code still verifies afterwards
        assert!(verify_code(SECRET, user_id, HASH, false, &code));
    }

    #[test]
    fn test_malformed_codes_rejected() {
        let user_id = Uuid::new_v4();
        assert!(!verify_code(SECRET, user_id, HASH, false, ""));
        assert!(!verify_code(SECRET, user_id, HASH, false, "-"));
        assert!(!verify_code(SECRET, user_id, HASH, false, "zzzz-abcd"));
        assert!(!verify_code(SECRET, user_id, HASH, false, "1a2b3c"));
    }

    #[test]
    fn test_expired_code_rejected() {
        let user_id = Uuid::new_v4();
        let stale = Utc::now().timestamp() - code_validity().num_seconds() - 10;
        let mac = fingerprint_mac(SECRET, user_id, HASH, false, stale).unwrap();
        let code = format!("{:x}-{}", stale, hex::encode(mac.finalize().into_bytes()));

        assert!(!verify_code(SECRET, user_id, HASH, false, &code));
    }
}
