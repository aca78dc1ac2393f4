use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User account record. Accounts are provisioned out-of-band and become
/// active through the token-driven setup flow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub totp_secret: String,
    pub monitoring_status: String,
    pub device_count: i32,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires: Option<OffsetDateTime>,
    pub mfa_setup_complete: bool,
    pub active: bool,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub identity_document: Option<String>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
}
