use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::{ResetTokenClaims, TokenClaims, RESET_ACTION};
use contracts::system::users::PublicUser;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

const ACCESS_TOKEN_LIFETIME_DAYS: i64 = 7;
const RESET_TOKEN_LIFETIME_HOURS: i64 = 1;

/// Sign an access token valid for seven days.
pub fn sign_access_token(secret: &str, user: &PublicUser) -> Result<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        apple_id: user.apple_id.clone(),
        exp: (now + chrono::Duration::days(ACCESS_TOKEN_LIFETIME_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

/// Validate an access token and extract its claims.
pub fn verify_access_token(secret: &str, token: &str) -> Result<TokenClaims> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

/// Sign a single-purpose password reset token valid for one hour.
pub fn sign_reset_token(secret: &str, user_id: &str, email: &str) -> Result<String> {
    let now = Utc::now();
    let claims = ResetTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        action: RESET_ACTION.to_string(),
        exp: (now + chrono::Duration::hours(RESET_TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode reset token")
}

/// Validate a reset token. The caller distinguishes expiry from other
/// failures via the jsonwebtoken error kind.
pub fn verify_reset_token(
    secret: &str,
    token: &str,
) -> std::result::Result<ResetTokenClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<ResetTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn sample_user() -> PublicUser {
        PublicUser {
            id: "u-1".into(),
            email: Some("ana@example.com".into()),
            name: Some("Ana".into()),
            apple_id: None,
            created_at: Utc::now().to_rfc3339(),
            last_login: None,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let token = sign_access_token("secret", &sample_user()).unwrap();
        let claims = verify_access_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email.as_deref(), Some("ana@example.com"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_access_token_rejects_wrong_secret() {
        let token = sign_access_token("secret", &sample_user()).unwrap();
        assert!(verify_access_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_reset_token_carries_purpose() {
        let token = sign_reset_token("secret", "u-1", "ana@example.com").unwrap();
        let claims = verify_reset_token("secret", &token).unwrap();
        assert_eq!(claims.action, RESET_ACTION);
        assert_eq!(claims.sub, "u-1");
    }

    #[test]
    fn test_access_token_is_not_a_reset_token() {
        // An access token decodes without the reset fields and must fail.
        let token = sign_access_token("secret", &sample_user()).unwrap();
        let err = verify_reset_token("secret", &token).unwrap_err();
        assert!(!matches!(err.kind(), ErrorKind::ExpiredSignature));
    }
}
