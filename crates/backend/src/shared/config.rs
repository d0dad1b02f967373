use std::env;

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub admin_key: Option<String>,
    pub frontend_url: String,
    pub environment: String,
    pub email: EmailConfig,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: Option<String>,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub support_address: Option<String>,
    pub no_reply_address: Option<String>,
    pub website_url: String,
}

impl EmailConfig {
    /// SMTP delivery is only possible when host and credentials are set.
    pub fn smtp_configured(&self) -> bool {
        self.host.is_some() && self.user.is_some() && self.password.is_some()
    }

    /// Sender address for transactional mail, falling back to the SMTP user.
    pub fn no_reply_or_user(&self) -> Option<String> {
        self.no_reply_address.clone().or_else(|| self.user.clone())
    }
}

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_PATH: &str = "target/db/pulse.db";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5500";

/// Load configuration from the process environment.
///
/// Missing values fall back to development defaults; a generated JWT secret
/// is reported with a warning so it is never silently used in production.
pub fn load_config() -> anyhow::Result<Config> {
    let port = env_var("PORT")
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let database_path =
        env_var("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

    let jwt_secret = match env_var("JWT_SECRET") {
        Some(secret) => secret,
        None => {
            tracing::warn!("JWT_SECRET is not set, using an insecure development secret");
            "pulse-dev-secret-do-not-use-in-production".to_string()
        }
    };

    let admin_key = env_var("ADMIN_KEY");
    if admin_key.is_none() {
        tracing::warn!("ADMIN_KEY is not set, admin endpoints will reject all requests");
    }

    let frontend_url = env_var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string());
    let environment = env_var("APP_ENV").unwrap_or_else(|| "development".to_string());

    let email = EmailConfig {
        host: env_var("EMAIL_HOST"),
        port: env_var("EMAIL_PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(587),
        secure: env_var("EMAIL_SECURE").as_deref() == Some("true"),
        user: env_var("EMAIL_USER"),
        password: env_var("EMAIL_PASSWORD"),
        support_address: env_var("SUPPORT_EMAIL"),
        no_reply_address: env_var("NO_REPLY_EMAIL"),
        website_url: env_var("WEBSITE_URL").unwrap_or_else(|| frontend_url.clone()),
    };

    Ok(Config {
        port,
        database_path,
        jwt_secret,
        admin_key,
        frontend_url,
        environment,
        email,
    })
}

/// Read an environment variable, treating empty strings as unset.
fn env_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
