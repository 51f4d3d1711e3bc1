//! Admin-only user management.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::router::{Ack, Lenient};
use crate::session::Session;
use crate::user::Role;
use crate::AppState;

/// A user as exposed over the API. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    username: String,
    role: Role,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    ok: bool,
    users: Vec<PublicUser>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
    username: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordBody {
    password: Option<String>,
}

#[derive(Debug, Validate)]
struct NewUser {
    #[validate(length(min = 1, message = "Username must not be empty."))]
    username: String,
    #[validate(length(min = 4, message = "Password must contain at least 4 characters."))]
    password: String,
}

/// `GET /api/users`.
pub async fn list(State(state): State<AppState>) -> Json<ListResponse> {
    let core = state.core.lock().await;
    let users = core
        .users
        .list()
        .into_iter()
        .map(|user| PublicUser {
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
        })
        .collect();

    Json(ListResponse { ok: true, users })
}

/// `POST /api/users`.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Lenient(body): Lenient<CreateBody>,
) -> Result<Json<Ack>> {
    let (Some(username), Some(password), Some(role)) =
        (body.username, body.password, body.role)
    else {
        return Err(ServerError::MissingFields);
    };

    let role: Role = role.trim().parse()?;
    let new_user = NewUser {
        username: username.trim().to_owned(),
        password,
    };
    new_user.validate()?;

    let mut core = state.core.lock().await;
    core.users
        .add(&new_user.username, &new_user.password, role)?;

    tracing::info!(username = %new_user.username, ?role, by = %session.username, "user created");
    Ok(Json(Ack::default()))
}

/// `DELETE /api/users/{username}`.
pub async fn remove(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
) -> Result<Json<Ack>> {
    let mut core = state.core.lock().await;
    core.users.delete(&username)?;
    // a deleted account must not keep working through old tokens.
    core.sessions.revoke_all_for(&username);

    tracing::info!(%username, by = %session.username, "user deleted");
    Ok(Json(Ack::default()))
}

/// `PUT /api/users/{username}/password`.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
    Lenient(body): Lenient<PasswordBody>,
) -> Result<Json<Ack>> {
    let Some(password) = body.password else {
        return Err(ServerError::MissingFields);
    };
    let new_user = NewUser {
        username: username.clone(),
        password,
    };
    new_user.validate()?;

    let mut core = state.core.lock().await;
    core.users.reset_password(&username, &new_user.password)?;
    // force re-login everywhere.
    core.sessions.revoke_all_for(&username);

    tracing::info!(%username, by = %session.username, "password reset, sessions revoked");
    Ok(Json(Ack::default()))
}
