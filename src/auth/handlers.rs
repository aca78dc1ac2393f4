use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AckResponse, ChangePasswordRequest, CompleteResetRequest, FinalizeSetupRequest,
            ForgotPasswordRequest, LoginRequest, LoginResponse, ProfileSummary, SetupCheckQuery,
            SetupCheckResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
        totp,
    },
    error::{AppError, Result},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/setup-check", get(setup_check))
        .route("/auth/setup-finalize", post(finalize_setup))
        .route("/auth/complete-reset", post(complete_reset))
        .route("/auth/change-password", post(change_password))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A token set without an expiry has no valid window.
fn link_expired(expires: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match expires {
        Some(exp) => exp < now,
        None => true,
    }
}

fn check_link_valid(user: &User) -> Result<()> {
    if link_expired(user.reset_token_expires, OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, "setup link expired");
        return Err(AppError::Expired("This link has expired".into()));
    }
    Ok(())
}

fn invalid_link() -> AppError {
    AppError::NotFound("This link is not valid".into())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    if !totp::verify_code(&user.totp_secret, payload.code.trim())? {
        warn!(user_id = %user.id, "login invalid one-time code");
        // MFA_DISTINCT_ERRORS=false folds this into the generic credential
        // failure.
        return Err(if state.config.distinct_mfa_errors {
            AppError::InvalidMfa
        } else {
            AppError::InvalidCredentials
        });
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id, &user.email, &user.name)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: ProfileSummary {
            name: user.name,
            monitoring_status: user.monitoring_status,
            device_count: user.device_count,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<AckResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    // The acknowledgement is identical whether or not the email matches an
    // account.
    let ack = AckResponse {
        message: "If that email is registered, a reset link is on its way.".into(),
    };

    if !is_valid_email(&payload.email) {
        return Ok(Json(ack));
    }

    if let Some(user) = User::find_by_email(&state.db, &payload.email).await? {
        if user.reset_token.is_some() {
            info!(user_id = %user.id, "replacing outstanding reset token");
        }
        let token = generate_reset_token();
        let ttl = state.config.reset_token_ttl_minutes;
        let expires = OffsetDateTime::now_utc() + TimeDuration::minutes(ttl);
        User::set_reset_token(&state.db, user.id, &token, expires).await?;

        let link = format!("{}/setup?token={}", state.config.frontend_base_url, token);
        let subject = format!("{} password reset", state.config.service_name);
        let html = format!(
            "<p>Hello {},</p><p>Use the link below to set your password. \
             It expires in {} minutes.</p><p><a href=\"{}\">{}</a></p>",
            user.name, ttl, link, link
        );
        let notifier = state.notifier.clone();
        let to = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_email(&to, &subject, &html).await {
                warn!(error = %e, "reset email send failed");
            }
        });
        info!(user_id = %user.id, "reset token issued");
    }

    Ok(Json(ack))
}

#[instrument(skip(state, query))]
pub async fn setup_check(
    State(state): State<AppState>,
    Query(query): Query<SetupCheckQuery>,
) -> Result<Json<SetupCheckResponse>> {
    let user = User::find_by_reset_token(&state.db, &query.token)
        .await?
        .ok_or_else(invalid_link)?;
    check_link_valid(&user)?;

    if user.mfa_setup_complete {
        return Ok(Json(SetupCheckResponse {
            mfa_required: false,
            otpauth_url: None,
            qr_png_base64: None,
        }));
    }

    // Accounts provisioned without a secret get one on first inspection.
    let secret = if user.totp_secret.is_empty() {
        let secret = totp::generate_secret();
        User::set_totp_secret(&state.db, user.id, &secret).await?;
        secret
    } else {
        user.totp_secret.clone()
    };

    let provisioning = totp::provisioning(&secret, &state.config.service_name, &user.email)?;
    Ok(Json(SetupCheckResponse {
        mfa_required: true,
        otpauth_url: Some(provisioning.otpauth_url),
        qr_png_base64: Some(provisioning.qr_png_base64),
    }))
}

#[instrument(skip(state, payload))]
pub async fn finalize_setup(
    State(state): State<AppState>,
    Json(payload): Json<FinalizeSetupRequest>,
) -> Result<Json<AckResponse>> {
    let user = User::find_by_reset_token(&state.db, &payload.token)
        .await?
        .ok_or_else(invalid_link)?;
    check_link_valid(&user)?;

    // The code must verify against the enrolled secret before anything
    // mutates.
    if !totp::verify_code(&user.totp_secret, payload.code.trim())? {
        warn!(user_id = %user.id, "setup finalize invalid one-time code");
        return Err(AppError::InvalidMfa);
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;
    if !User::consume_reset_token(&state.db, &payload.token, &hash).await? {
        // Token was consumed between lookup and update.
        return Err(invalid_link());
    }

    info!(user_id = %user.id, "account setup completed");
    Ok(Json(AckResponse {
        message: "Your account is ready. You can now sign in.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn complete_reset(
    State(state): State<AppState>,
    Json(payload): Json<CompleteResetRequest>,
) -> Result<Json<AckResponse>> {
    let user = User::find_by_reset_token(&state.db, &payload.token)
        .await?
        .ok_or_else(invalid_link)?;
    check_link_valid(&user)?;

    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;
    if !User::consume_reset_token(&state.db, &payload.token, &hash).await? {
        return Err(invalid_link());
    }

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(AckResponse {
        message: "Your password has been reset.".into(),
    }))
}

#[instrument(skip(state, session, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    session: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<AckResponse>> {
    let user = User::find_by_email(&state.db, &session.email)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    if !totp::verify_code(&user.totp_secret, payload.code.trim())? {
        warn!(user_id = %user.id, "change password invalid one-time code");
        return Err(AppError::InvalidMfa);
    }

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let hash = hash_password(&payload.new_password)?;
    if !User::update_password(&state.db, user.id, &hash).await? {
        return Err(AppError::NotFound("Account not found".into()));
    }

    info!(user_id = %user.id, "password changed");
    Ok(Json(AckResponse {
        message: "Password updated.".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("u@x.com"));
        assert!(is_valid_email("first.last@sub.domain.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn reset_tokens_are_64_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        // Two draws should essentially never collide.
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn expiry_window() {
        let now = OffsetDateTime::now_utc();
        assert!(!link_expired(Some(now + TimeDuration::minutes(5)), now));
        assert!(link_expired(Some(now - TimeDuration::seconds(1)), now));
        assert!(link_expired(None, now));
    }
}
