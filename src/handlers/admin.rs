// Admin login: password in, session token out

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    app::AppState,
    middleware::admin_auth::{expires_at, issue_token, verify_password},
    utils::ServiceError,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchange the admin password for a session token
/// POST /api/v1/admin/login
#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    tag = "Admin",
    operation_id = "adminLogin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = LoginResponse),
        (status = 401, description = "Wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    if !verify_password(&request.password, &state.config.admin_password) {
        warn!("Rejected admin login attempt");
        return ServiceError::Unauthorized.into_response();
    }

    let now = Utc::now();
    info!("Admin session issued");
    Json(LoginResponse {
        token: issue_token(&state.config.admin_password, now),
        expires_at: expires_at(now),
    })
    .into_response()
}
