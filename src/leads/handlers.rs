use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::handlers::is_valid_email,
    error::{AppError, Result},
    leads::{
        dto::{ContactRequest, ContactResponse},
        repo,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}

#[instrument(skip(state, payload))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(mut payload): Json<ContactRequest>,
) -> Result<Json<ContactResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(AppError::Validation("Name and message are required".into()));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }

    repo::insert_lead(&state.db, payload.name.trim(), &payload.email, &payload.message).await?;
    info!(email = %payload.email, "lead recorded");

    let text = format!(
        "New lead from {} <{}>:\n{}",
        payload.name.trim(),
        payload.email,
        payload.message
    );
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.send_chat_message(&text).await {
            warn!(error = %e, "lead chat notification failed");
        }
    });

    Ok(Json(ContactResponse {
        success: true,
        message: "Your message has been sent. We'll get back to you shortly.".into(),
    }))
}
