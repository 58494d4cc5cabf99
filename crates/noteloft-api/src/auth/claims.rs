//! JWT claims and the stateless signing/verification primitives.
//!
//! Claims decoding is pure: no storage is consulted here. Stored-token
//! checks (refresh, reset, verify flows) live in [`super::token`].

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use noteloft_core::models::TokenKind;
use noteloft_core::AppError;
use serde::{Deserialize, Serialize};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: i64,
    /// Issued-at timestamp (seconds).
    pub iat: i64,
    /// Expiration timestamp (seconds).
    pub exp: i64,
    /// Token kind; only `ACCESS` authenticates API calls.
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Slug of the tenant the token is bound to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

/// Sign claims with the shared secret (HS256).
pub fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// Verify a token's signature and expiry and decode its claims.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthenticated("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AppError::Unauthenticated("Invalid token signature".to_string())
            }
            _ => AppError::Unauthenticated("Invalid or expired token".to_string()),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const SECRET: &str = "test-secret-key-with-enough-length";

    fn claims(kind: TokenKind, tenant: Option<&str>, exp_offset_secs: i64) -> Claims {
        let now = Utc::now();
        Claims {
            sub: 7,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(exp_offset_secs)).timestamp(),
            kind,
            tenant: tenant.map(String::from),
        }
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let token = sign(&claims(TokenKind::Access, Some("acme"), 60), SECRET).expect("sign");
        let decoded = verify(&token, SECRET).expect("verify");
        assert_eq!(decoded.sub, 7);
        assert_eq!(decoded.kind, TokenKind::Access);
        assert_eq!(decoded.tenant.as_deref(), Some("acme"));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let token = sign(&claims(TokenKind::Access, None, -60), SECRET).expect("sign");
        let err = verify(&token, SECRET).expect_err("should reject");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = sign(&claims(TokenKind::Access, None, 60), SECRET).expect("sign");
        let err = verify(&token, "another-secret-key-with-enough-length").expect_err("reject");
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(verify("not-a-jwt", SECRET).is_err());
    }

    #[test]
    fn test_kind_serializes_as_type_field() {
        let token = sign(&claims(TokenKind::Refresh, None, 60), SECRET).expect("sign");
        let decoded = verify(&token, SECRET).expect("verify");
        assert_eq!(decoded.kind, TokenKind::Refresh);
    }

    /// Resolving the same token twice yields identical claims.
    #[test]
    fn test_verification_is_idempotent() {
        let token = sign(&claims(TokenKind::Access, Some("acme"), 60), SECRET).expect("sign");
        let first = verify(&token, SECRET).expect("verify");
        let second = verify(&token, SECRET).expect("verify");
        assert_eq!(first.sub, second.sub);
        assert_eq!(first.tenant, second.tenant);
        assert_eq!(first.exp, second.exp);
    }
}
