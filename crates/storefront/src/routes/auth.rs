//! Customer authentication routes.
//!
//! Password accounts with an emailed one-time code confirming the address.
//! A session is only started once the email is verified.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use tidewear_core::db::users::User;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Build the auth router (mounted at `/api/auth`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/resend", post(resend))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
    pub verification_required: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an unverified customer account and email a code.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool(), state.email())
        .register(&body.email, &body.password, &body.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            verification_required: true,
        }),
    ))
}

/// Confirm the emailed code and log the user in.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.pool(), state.email())
        .verify(&body.email, &body.code)
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    Ok(Json(current))
}

/// Send a fresh verification code.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn resend(
    State(state): State<AppState>,
    Json(body): Json<ResendRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.email())
        .resend(&body.email)
        .await?;

    Ok(Json(MessageResponse {
        message: "If the account exists and is unverified, a new code has been sent",
    }))
}

/// Password login.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.pool(), state.email())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    tracing::info!(user_id = %current.id, "Customer logged in");
    Ok(Json(current))
}

/// End the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
