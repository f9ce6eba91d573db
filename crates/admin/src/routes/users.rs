//! Account management.
//!
//! Admins can rename accounts, change roles and delete accounts, but never
//! demote or delete themselves, so the store cannot be left without the
//! admin who is acting.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::db::UserRepository;
use tidewear_core::db::users::User;
use tidewear_core::{Page, PageParams, UserId, UserRole};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 100;

/// Build the users router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list))
        .route("/users/{id}", patch(update).delete(remove))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<UserRole>,
    pub name: Option<String>,
}

/// Check an update against the acting admin and tidy the name.
fn validate_update(
    acting: UserId,
    target: UserId,
    body: &UpdateUserRequest,
) -> Result<Option<String>> {
    if acting == target && body.role.is_some_and(|role| role != UserRole::Admin) {
        return Err(AppError::Conflict(
            "you cannot remove your own admin role".to_owned(),
        ));
    }
    body.name
        .as_deref()
        .map(|raw| {
            let name = raw.trim();
            if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
                Err(AppError::BadRequest(format!(
                    "name must be 1 to {MAX_NAME_LENGTH} characters"
                )))
            } else {
                Ok(name.to_owned())
            }
        })
        .transpose()
}

/// Search by email or name, newest first.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<User>>> {
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let (users, total) = UserRepository::new(state.pool())
        .list(search, params.limit(), params.offset())
        .await?;
    Ok(Json(Page::new(users, params, total)))
}

#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let name = validate_update(admin.id, id, &body)?;
    let user = UserRepository::new(state.pool())
        .update(id, name.as_deref(), body.role)
        .await?;
    tracing::info!(user_id = %id, role = %user.role, "User updated");
    Ok(Json(user))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if admin.id == id {
        return Err(AppError::Conflict(
            "you cannot delete your own account".to_owned(),
        ));
    }
    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
