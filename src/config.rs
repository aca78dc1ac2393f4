use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials for the outbound chat / email APIs. Empty values turn the
/// corresponding notifier call into a no-op.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotifyConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub resend_api_key: String,
    pub email_from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub service_name: String,
    pub frontend_base_url: String,
    pub allowed_origins: Vec<String>,
    pub reset_token_ttl_minutes: i64,
    pub distinct_mfa_errors: bool,
    pub notify: NotifyConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "clientdesk".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "clientdesk-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(120),
        };
        let notify = NotifyConfig {
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").unwrap_or_default(),
            resend_api_key: std::env::var("RESEND_API_KEY").unwrap_or_default(),
            email_from: std::env::var("EMAIL_FROM").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            jwt,
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "clientdesk".into()),
            frontend_base_url: std::env::var("FRONTEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            reset_token_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            distinct_mfa_errors: std::env::var("MFA_DISTINCT_ERRORS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            notify,
        })
    }
}
