//! Webhook token verification.
//!
//! The sender puts a shared token in the `X-Webhook-Token` header; it is
//! compared in constant time.

use secrecy::{ExposeSecret, SecretString};

use shapegate_types::error::AuthError;

/// Header carrying the shared webhook token.
pub const TOKEN_HEADER: &str = "x-webhook-token";

/// Verify the token from the request against the configured one.
pub fn verify_token(expected: &SecretString, provided: Option<&str>) -> Result<(), AuthError> {
    let provided = provided
        .ok_or_else(|| AuthError::MissingToken("X-Webhook-Token header required".to_string()))?;

    if constant_time_eq(expected.expose_secret().as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

/// Constant-time byte comparison (XOR-based).
///
/// Returns true if and only if `a == b`. Time taken is independent of
/// how many bytes match.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_token_valid() {
        let expected = SecretString::from("my-webhook-token");
        assert!(verify_token(&expected, Some("my-webhook-token")).is_ok());
    }

    #[test]
    fn test_verify_token_invalid() {
        let expected = SecretString::from("my-webhook-token");
        assert!(matches!(
            verify_token(&expected, Some("my-webhook-tokem")),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            verify_token(&expected, Some("")),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_verify_token_missing() {
        let expected = SecretString::from("my-webhook-token");
        assert!(matches!(
            verify_token(&expected, None),
            Err(AuthError::MissingToken(_))
        ));
    }

    #[test]
    fn test_verify_token_is_exact_match() {
        let expected = SecretString::from("token");
        // No prefix stripping or trimming.
        assert!(verify_token(&expected, Some("Bearer token")).is_err());
        assert!(verify_token(&expected, Some("token ")).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer string"));
        assert!(constant_time_eq(b"", b""));
    }
}
