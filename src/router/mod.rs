//! HTTP API surface.

mod display;
mod login;
mod queue;
mod status;
mod users;

use axum::extract::{FromRequest, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, ServerError};
use crate::session::Session;
use crate::user::Role;
use crate::AppState;

/// Caps request bodies; center images are inline data URLs, so this is
/// larger than the usual JSON payloads warrant.
const BODY_LIMIT: usize = 4_000_000;

/// The route table: (method, path) -> (auth level, handler).
pub fn api(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/next", post(queue::next))
        .route("/prev", post(queue::prev))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    let admin = Router::new()
        .route("/queue/reset", post(queue::reset))
        .route("/note", post(display::set_note))
        .route("/note/clear", post(display::clear_note))
        .route("/ticker", post(display::set_ticker))
        .route("/ticker/clear", post(display::clear_ticker))
        .route("/display-message", post(display::set_display_message))
        .route("/display-message/clear", post(display::clear_display_message))
        .route("/center-image", post(display::set_center_image).delete(display::clear_center_image))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{username}", delete(users::remove))
        .route("/users/{username}/password", put(users::reset_password))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/health", get(status::health))
        .route("/state", get(status::state))
        .route("/login", post(login::login))
        .route("/logout", post(login::logout))
        .merge(staff)
        .merge(admin)
}

/// Fixed `{ok:true}` answer for effect-only operations.
#[derive(Debug, Serialize)]
pub struct Ack {
    ok: bool,
}

impl Default for Ack {
    fn default() -> Self {
        Self { ok: true }
    }
}

/// Extract the bearer token from the `Authorization` header.
///
/// A missing or malformed header reads the same as no session at all.
fn bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolve the request's session, sweeping it if expired.
async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = bearer(headers)?;
    state.core.lock().await.sessions.validate(token)
}

/// Gate for operations open to staff and admin alike.
async fn require_staff(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let session = resolve_session(&state, req.headers())
        .await
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Gate for admin-only operations.
async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let session = resolve_session(&state, req.headers())
        .await
        .ok_or(ServerError::Unauthorized)?;
    if session.role != Role::Admin {
        return Err(ServerError::Forbidden);
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// JSON body extractor that treats malformed or absent bodies as an empty
/// object, deferring to field-level `MISSING_FIELDS` validation.
pub struct Lenient<T>(pub T);

impl<S, T> FromRequest<S> for Lenient<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(
        req: Request,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let bytes = axum::body::to_bytes(req.into_body(), BODY_LIMIT)
            .await
            .unwrap_or_default();
        Ok(Lenient(serde_json::from_slice(&bytes).unwrap_or_default()))
    }
}
