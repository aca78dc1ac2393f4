use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::{extractors::AuthUser, repo_types::User},
    dashboard::{
        dto::{DashboardProfile, DashboardResponse},
        repo,
    },
    error::{AppError, Result},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state, session))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    session: AuthUser,
) -> Result<Json<DashboardResponse>> {
    let user = User::find_by_id(&state.db, session.id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    let documents = repo::documents_for_user(&state.db, user.id).await?;
    let billing = repo::billing_for_user(&state.db, user.id).await?;

    Ok(Json(DashboardResponse {
        user: DashboardProfile {
            name: user.name,
            email: user.email,
            monitoring_status: user.monitoring_status,
            device_count: user.device_count,
        },
        documents,
        billing,
    }))
}
