use serde::{Deserialize, Serialize};

use crate::system::users::PublicUser;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub apple_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppleLoginRequest {
    #[serde(default)]
    pub apple_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword", default)]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword", default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "newPassword", default)]
    pub new_password: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

// ============================================================================
// Token claims
// ============================================================================

/// Access token payload. `exp` and `iat` are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_id: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Short-lived password reset token. `action` guards against an access
/// token being replayed as a reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetTokenClaims {
    pub sub: String,
    pub email: String,
    pub action: String,
    pub exp: usize,
    pub iat: usize,
}

pub const RESET_ACTION: &str = "password_reset";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_password_uses_camel_keys() {
        let req: ChangePasswordRequest =
            serde_json::from_str(r#"{"currentPassword":"old","newPassword":"longenough"}"#)
                .unwrap();
        assert_eq!(req.current_password.as_deref(), Some("old"));
        assert_eq!(req.new_password.as_deref(), Some("longenough"));
    }

    #[test]
    fn test_token_claims_omit_absent_optionals() {
        let claims = TokenClaims {
            sub: "u1".into(),
            email: Some("a@b.c".into()),
            name: None,
            apple_id: None,
            exp: 100,
            iat: 50,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("apple_id"));
        assert!(!json.contains("name"));
    }
}
