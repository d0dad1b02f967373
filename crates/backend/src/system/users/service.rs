use chrono::Utc;
use contracts::system::auth::{
    AppleLoginRequest, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, UpdateProfileRequest, RESET_ACTION,
};
use contracts::system::users::PublicUser;
use jsonwebtoken::errors::ErrorKind;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use super::repository::{self, UserRecord};
use crate::shared::config::Config;
use crate::shared::error::ApiError;
use crate::system::auth::{jwt, password};
use crate::system::mailer::{Mailer, OutgoingEmail};

/// Returned for every forgot-password request so the endpoint never
/// reveals whether an account exists.
pub const RESET_NOTICE: &str =
    "If an account exists with this email, you will receive a password reset link";

// ============================================================================
// Registration and login
// ============================================================================

pub async fn register<C: ConnectionTrait>(
    conn: &C,
    jwt_secret: &str,
    req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    let email = req.email.as_deref().filter(|s| !s.is_empty());
    let pwd = req.password.as_deref().filter(|s| !s.is_empty());
    let name = req.name.as_deref().filter(|s| !s.is_empty());

    let (email, pwd, name) = match (email, pwd, name) {
        (Some(e), Some(p), Some(n)) => (e, p, n),
        _ => {
            return Err(ApiError::Validation(
                "Email, password, and name are required".to_string(),
            ))
        }
    };

    if !is_valid_email(email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    if pwd.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let existing = repository::find_by_email(conn, email)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash =
        password::hash_password(pwd).map_err(|e| ApiError::internal("Failed to register user", e))?;

    let record = UserRecord {
        id: Uuid::new_v4().to_string(),
        email: Some(email.to_string()),
        password_hash: Some(password_hash),
        name: Some(name.to_string()),
        apple_id: req.apple_id.clone().filter(|s| !s.is_empty()),
        active: 1,
        created_at: Utc::now().to_rfc3339(),
        last_login: None,
    };
    repository::insert(conn, &record)
        .await
        .map_err(|e| ApiError::internal("Failed to register user", e))?;

    let user = record.to_public();
    let token = jwt::sign_access_token(jwt_secret, &user)
        .map_err(|e| ApiError::internal("Failed to register user", e))?;

    Ok(AuthResponse { user, token })
}

pub async fn login<C: ConnectionTrait>(
    conn: &C,
    jwt_secret: &str,
    req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    let email = req.email.as_deref().filter(|s| !s.is_empty());
    let pwd = req.password.as_deref().filter(|s| !s.is_empty());
    let (email, pwd) = match (email, pwd) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ))
        }
    };

    let user = repository::find_by_email(conn, email)
        .await
        .map_err(|e| ApiError::internal("Failed to login", e))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    // Accounts created through Apple sign-in have no password hash.
    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = password::verify_password(pwd, hash)
        .map_err(|e| ApiError::internal("Failed to login", e))?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    repository::update_last_login(conn, &user.id)
        .await
        .map_err(|e| ApiError::internal("Failed to login", e))?;

    let public = user.to_public();
    let token = jwt::sign_access_token(jwt_secret, &public)
        .map_err(|e| ApiError::internal("Failed to login", e))?;

    Ok(AuthResponse {
        user: public,
        token,
    })
}

pub async fn apple_login<C: ConnectionTrait>(
    conn: &C,
    jwt_secret: &str,
    req: AppleLoginRequest,
) -> Result<AuthResponse, ApiError> {
    let apple_id = req
        .apple_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("Apple ID is required".to_string()))?;

    let user = match repository::find_by_apple_id(conn, apple_id)
        .await
        .map_err(|e| ApiError::internal("Failed to login with Apple", e))?
    {
        Some(user) => {
            repository::update_last_login(conn, &user.id)
                .await
                .map_err(|e| ApiError::internal("Failed to login with Apple", e))?;
            user
        }
        None => {
            let record = UserRecord {
                id: Uuid::new_v4().to_string(),
                email: req.email.clone().filter(|s| !s.is_empty()),
                password_hash: None,
                name: Some(
                    req.name
                        .clone()
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "Apple User".to_string()),
                ),
                apple_id: Some(apple_id.to_string()),
                active: 1,
                created_at: Utc::now().to_rfc3339(),
                last_login: None,
            };
            repository::insert(conn, &record)
                .await
                .map_err(|e| ApiError::internal("Failed to login with Apple", e))?;
            record
        }
    };

    let public = user.to_public();
    let token = jwt::sign_access_token(jwt_secret, &public)
        .map_err(|e| ApiError::internal("Failed to login with Apple", e))?;

    Ok(AuthResponse {
        user: public,
        token,
    })
}

// ============================================================================
// Profile
// ============================================================================

pub async fn get_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
) -> Result<PublicUser, ApiError> {
    let user = repository::find_by_id(conn, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch profile", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(user.to_public())
}

pub async fn update_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    req: UpdateProfileRequest,
) -> Result<PublicUser, ApiError> {
    let name = req.name.filter(|s| !s.is_empty());
    let email = req.email.filter(|s| !s.is_empty());

    if let Some(email) = &email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        let taken = repository::email_taken_by_other(conn, email, user_id)
            .await
            .map_err(|e| ApiError::internal("Failed to update profile", e))?;
        if taken {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }
    }

    if name.is_none() && email.is_none() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    repository::update_profile(conn, user_id, name.as_deref(), email.as_deref())
        .await
        .map_err(|e| ApiError::internal("Failed to update profile", e))?;

    let user = repository::find_by_id(conn, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to update profile", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(user.to_public())
}

pub async fn change_password<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    req: ChangePasswordRequest,
) -> Result<(), ApiError> {
    let current = req.current_password.as_deref().filter(|s| !s.is_empty());
    let new = req.new_password.as_deref().filter(|s| !s.is_empty());
    let (current, new) = match (current, new) {
        (Some(c), Some(n)) => (c, n),
        _ => {
            return Err(ApiError::Validation(
                "Current and new password are required".to_string(),
            ))
        }
    };

    if new.len() < 8 {
        return Err(ApiError::Validation(
            "New password must be at least 8 characters".to_string(),
        ));
    }

    let user = repository::find_by_id(conn, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to change password", e))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = match user.password_hash.as_deref() {
        Some(hash) => password::verify_password(current, hash)
            .map_err(|e| ApiError::internal("Failed to change password", e))?,
        None => false,
    };
    if !valid {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(new)
        .map_err(|e| ApiError::internal("Failed to change password", e))?;
    repository::update_password(conn, user_id, &new_hash)
        .await
        .map_err(|e| ApiError::internal("Failed to change password", e))?;

    Ok(())
}

// ============================================================================
// Password reset
// ============================================================================

/// Issue a reset token and email it to the account owner. The response is
/// identical whether or not the account exists.
pub async fn forgot_password<C: ConnectionTrait>(
    conn: &C,
    config: &Config,
    mailer: &dyn Mailer,
    req: ForgotPasswordRequest,
) -> Result<(), ApiError> {
    let email = match req.email.as_deref().filter(|s| !s.is_empty()) {
        Some(e) if is_valid_email(e) => e,
        _ => {
            return Err(ApiError::Validation(
                "Valid email address is required".to_string(),
            ))
        }
    };

    let user = match repository::find_by_email(conn, email)
        .await
        .map_err(|e| ApiError::internal("Failed to process password reset", e))?
    {
        Some(user) => user,
        None => return Ok(()),
    };

    let token = jwt::sign_reset_token(&config.jwt_secret, &user.id, email)
        .map_err(|e| ApiError::internal("Failed to process password reset", e))?;
    let reset_link = format!("{}/reset-password?token={}", config.frontend_url, token);

    let from = format!(
        "\"Pulse Support\" <{}>",
        config
            .email
            .no_reply_or_user()
            .unwrap_or_else(|| "no-reply@pulse.local".to_string())
    );
    let outgoing = OutgoingEmail {
        from,
        to: email.to_string(),
        subject: "Reset your Pulse password".to_string(),
        html_body: reset_email_body(&reset_link),
    };

    // A delivery failure must not reveal that the account exists.
    if let Err(e) = mailer.send(outgoing).await {
        tracing::error!("Failed to send password reset email: {:#}", e);
    }

    Ok(())
}

pub async fn reset_password<C: ConnectionTrait>(
    conn: &C,
    jwt_secret: &str,
    req: ResetPasswordRequest,
) -> Result<(), ApiError> {
    let token = req.token.as_deref().filter(|s| !s.is_empty());
    let new = req.new_password.as_deref().filter(|s| !s.is_empty());
    let (token, new) = match (token, new) {
        (Some(t), Some(n)) => (t, n),
        _ => {
            return Err(ApiError::Validation(
                "Token and new password are required".to_string(),
            ))
        }
    };

    if new.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let claims = match jwt::verify_reset_token(jwt_secret, token) {
        Ok(claims) => claims,
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            return Err(ApiError::Validation("Reset token has expired".to_string()))
        }
        Err(_) => return Err(ApiError::Validation("Invalid token".to_string())),
    };
    if claims.action != RESET_ACTION {
        return Err(ApiError::Validation("Invalid token".to_string()));
    }

    let new_hash = password::hash_password(new)
        .map_err(|e| ApiError::internal("Failed to reset password", e))?;
    repository::update_password(conn, &claims.sub, &new_hash)
        .await
        .map_err(|e| ApiError::internal("Failed to reset password", e))?;

    Ok(())
}

pub async fn delete_account<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<(), ApiError> {
    repository::deactivate(conn, user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete account", e))?;
    Ok(())
}

fn reset_email_body(reset_link: &str) -> String {
    format!(
        r#"
<div style="font-family: -apple-system, Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #1d1d1f;">Reset your password</h2>
    <p>We received a request to reset the password for your Pulse account.
       The link below is valid for one hour.</p>
    <p style="margin: 30px 0;">
        <a href="{reset_link}"
           style="display: inline-block; background-color: #007aff; color: white; padding: 12px 24px; text-decoration: none; border-radius: 8px;">
            Reset Password
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">
        If you didn't request this, you can safely ignore this email.
    </p>
</div>
"#
    )
}

/// Mirrors the storefront's email check: one @, and a dot somewhere in the
/// domain part. Shared with the contact form, which validates the same way.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !local.contains(char::is_whitespace)
                && !domain.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::EmailConfig;
    use crate::shared::data::db::test_db;
    use crate::system::mailer::ConsoleMailer;

    const SECRET: &str = "test-secret";

    fn register_req(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            name: Some(name.to_string()),
            apple_id: None,
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            database_path: String::new(),
            jwt_secret: SECRET.to_string(),
            admin_key: Some("admin-key".to_string()),
            frontend_url: "http://localhost:5500".to_string(),
            environment: "test".to_string(),
            email: EmailConfig {
                host: None,
                port: 587,
                secure: false,
                user: None,
                password: None,
                support_address: None,
                no_reply_address: None,
                website_url: "http://localhost:5500".to_string(),
            },
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("spaced name@example.com"));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let conn = test_db().await;
        let registered = register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();
        assert_eq!(registered.user.email.as_deref(), Some("ana@example.com"));
        assert!(!registered.token.is_empty());

        let logged_in = login(&conn, SECRET, login_req("ana@example.com", "longenough"))
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let conn = test_db().await;
        // Seven characters is one short of the minimum.
        let err = register(&conn, SECRET, register_req("ana@example.com", "short77", "Ana"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters");

        // Eight characters passes.
        register(&conn, SECRET, register_req("ana@example.com", "exactly8", "Ana"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let conn = test_db().await;
        register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();
        let err = register(&conn, SECRET, register_req("ana@example.com", "different8", "Ana2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.to_string(), "User already exists");
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let conn = test_db().await;
        register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();
        let err = login(&conn, SECRET, login_req("ana@example.com", "wrongpass1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_apple_login_creates_then_reuses_account() {
        let conn = test_db().await;
        let req = AppleLoginRequest {
            apple_id: Some("apple-123".to_string()),
            email: None,
            name: None,
        };

        let first = apple_login(&conn, SECRET, req.clone()).await.unwrap();
        assert_eq!(first.user.name.as_deref(), Some("Apple User"));
        assert!(first.user.email.is_none());

        let second = apple_login(&conn, SECRET, req).await.unwrap();
        assert_eq!(second.user.id, first.user.id);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let conn = test_db().await;
        register(&conn, SECRET, register_req("first@example.com", "longenough", "First"))
            .await
            .unwrap();
        let second = register(&conn, SECRET, register_req("second@example.com", "longenough", "Second"))
            .await
            .unwrap();

        let err = update_profile(
            &conn,
            &second.user.id,
            UpdateProfileRequest {
                name: None,
                email: Some("first@example.com".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Email already in use");

        let err = update_profile(
            &conn,
            &second.user.id,
            UpdateProfileRequest {
                name: None,
                email: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "No fields to update");
    }

    #[tokio::test]
    async fn test_change_password_verifies_current() {
        let conn = test_db().await;
        let auth = register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();

        let err = change_password(
            &conn,
            &auth.user.id,
            ChangePasswordRequest {
                current_password: Some("wrongpass1".to_string()),
                new_password: Some("brand-new-pass".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Current password is incorrect");

        change_password(
            &conn,
            &auth.user.id,
            ChangePasswordRequest {
                current_password: Some("longenough".to_string()),
                new_password: Some("brand-new-pass".to_string()),
            },
        )
        .await
        .unwrap();

        login(&conn, SECRET, login_req("ana@example.com", "brand-new-pass"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_with_valid_token() {
        let conn = test_db().await;
        let auth = register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();

        let token = jwt::sign_reset_token(SECRET, &auth.user.id, "ana@example.com").unwrap();
        reset_password(
            &conn,
            SECRET,
            ResetPasswordRequest {
                token: Some(token),
                new_password: Some("reset-password".to_string()),
            },
        )
        .await
        .unwrap();

        login(&conn, SECRET, login_req("ana@example.com", "reset-password"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_rejects_access_token() {
        let conn = test_db().await;
        let auth = register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();

        // An access token must not work as a reset token.
        let err = reset_password(
            &conn,
            SECRET,
            ResetPasswordRequest {
                token: Some(auth.token),
                new_password: Some("reset-password".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn test_forgot_password_hides_unknown_accounts() {
        let conn = test_db().await;
        let config = test_config();
        let mailer = ConsoleMailer::new();

        // Unknown address still succeeds.
        forgot_password(
            &conn,
            &config,
            &mailer,
            ForgotPasswordRequest {
                email: Some("nobody@example.com".to_string()),
            },
        )
        .await
        .unwrap();

        let err = forgot_password(
            &conn,
            &config,
            &mailer,
            ForgotPasswordRequest {
                email: Some("not-an-email".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Valid email address is required");
    }

    #[tokio::test]
    async fn test_delete_account_blocks_future_lookup() {
        let conn = test_db().await;
        let auth = register(&conn, SECRET, register_req("ana@example.com", "longenough", "Ana"))
            .await
            .unwrap();

        delete_account(&conn, &auth.user.id).await.unwrap();

        // The row survives as an inactive account.
        let record = repository::find_by_id(&conn, &auth.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.active, 0);
    }
}
