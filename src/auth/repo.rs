use crate::auth::repo_types::User;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, totp_secret, monitoring_status,
    device_count, reset_token, reset_token_expires, mfa_setup_complete,
    active, customer_id, subscription_id, identity_document, address,
    created_at
"#;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find the owner of an outstanding setup/reset token.
    pub async fn find_by_reset_token(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Store a fresh setup/reset token and its expiry.
    pub async fn set_reset_token(
        db: &PgPool,
        user_id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Persist a newly generated TOTP secret.
    pub async fn set_totp_secret(db: &PgPool, user_id: Uuid, secret: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET totp_secret = $2 WHERE id = $1")
            .bind(user_id)
            .bind(secret)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Consume an outstanding token: set the new password hash, clear the
    /// token and its expiry, mark MFA setup complete and the account active,
    /// all in one statement. The WHERE clause re-matches the token, so a
    /// concurrently consumed (now-null) token affects zero rows.
    pub async fn consume_reset_token(
        db: &PgPool,
        token: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_token = NULL,
                reset_token_expires = NULL,
                mfa_setup_complete = TRUE,
                active = TRUE
            WHERE reset_token = $1
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the stored password hash for an authenticated change.
    pub async fn update_password(
        db: &PgPool,
        user_id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
