//! Session issuance and revocation.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::router::{bearer, Ack, Lenient};
use crate::user::Role;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// `POST /api/login`.
pub async fn login(
    State(state): State<AppState>,
    Lenient(body): Lenient<Body>,
) -> Result<Json<Response>> {
    let username = body.username.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ServerError::MissingFields);
    }

    let mut core = state.core.lock().await;
    let (username, role) = core.users.verify(username, password)?;
    let session = core.sessions.issue(&username, role);

    tracing::info!(%username, ?role, "session issued");
    Ok(Json(Response {
        ok: true,
        token: session.token,
        username,
        role,
    }))
}

/// `POST /api/logout`. Token optional; always succeeds.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Ack> {
    if let Some(token) = bearer(&headers) {
        state.core.lock().await.sessions.revoke(token);
    }
    Json(Ack::default())
}
