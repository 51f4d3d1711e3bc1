//! Ticket calling: next, recall, reset.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::queue::{Lane, Ticket};
use crate::router::{Ack, Lenient};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct Body {
    number: Option<String>,
    gender: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Response {
    ok: bool,
    current: Ticket,
}

/// `POST /api/next`.
pub async fn next(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Lenient(body): Lenient<Body>,
) -> Result<Json<Response>> {
    let number = body.number.as_deref().map(str::trim).unwrap_or_default();
    if number.is_empty() {
        return Err(ServerError::MissingFields);
    }
    let lane: Lane = body
        .gender
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .parse()?;

    let ticket = Ticket {
        number: number.to_owned(),
        gender: lane,
        called_by: session.username.clone(),
        called_at: Utc::now(),
    };

    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    doc.call_next(ticket.clone(), state.config.queue.history_limit);
    core.store.set(doc)?;

    tracing::info!(number = %ticket.number, gender = ?ticket.gender, by = %ticket.called_by, "ticket called");
    Ok(Json(Response {
        ok: true,
        current: ticket,
    }))
}

/// `POST /api/prev`. Recall the most recent previous call.
pub async fn prev(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Response>> {
    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    let recalled = doc.call_previous()?;
    core.store.set(doc)?;

    tracing::info!(number = %recalled.number, by = %session.username, "ticket recalled");
    Ok(Json(Response {
        ok: true,
        current: recalled,
    }))
}

/// `POST /api/queue/reset`. Admin only; broadcast fields survive.
pub async fn reset(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Ack>> {
    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    doc.reset_queue();
    core.store.set(doc)?;

    tracing::info!(by = %session.username, "queue reset");
    Ok(Json(Ack::default()))
}
