//! Admin-set broadcast fields: note, ticker, display message, center image.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{Result, ServerError};
use crate::queue::{Banner, CenterImage, QueueState};
use crate::router::{Ack, Lenient};
use crate::session::Session;
use crate::AppState;

const DATA_URL_PREFIX: &str = "data:image/";

#[derive(Debug, Default, Deserialize)]
pub struct TextBody {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageBody {
    image: Option<String>,
}

fn banner(doc: &mut QueueState, field: Field) -> &mut Banner {
    match field {
        Field::Note => &mut doc.note,
        Field::Ticker => &mut doc.ticker,
        Field::DisplayMessage => &mut doc.display_message,
    }
}

#[derive(Clone, Copy, Debug)]
enum Field {
    Note,
    Ticker,
    DisplayMessage,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Note => write!(f, "note"),
            Field::Ticker => write!(f, "ticker"),
            Field::DisplayMessage => write!(f, "display message"),
        }
    }
}

async fn set_banner(
    state: AppState,
    session: Session,
    body: TextBody,
    field: Field,
) -> Result<Json<Ack>> {
    let text = body.text.map(|t| t.trim().to_owned()).unwrap_or_default();
    if text.is_empty() {
        return Err(ServerError::MissingFields);
    }

    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    banner(&mut doc, field).set(text, &session.username, Utc::now());
    core.store.set(doc)?;

    tracing::info!(%field, by = %session.username, "banner updated");
    Ok(Json(Ack::default()))
}

async fn clear_banner(state: AppState, session: Session, field: Field) -> Result<Json<Ack>> {
    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    banner(&mut doc, field).clear(&session.username, Utc::now());
    core.store.set(doc)?;

    tracing::info!(%field, by = %session.username, "banner cleared");
    Ok(Json(Ack::default()))
}

/// `POST /api/note`.
pub async fn set_note(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Lenient(body): Lenient<TextBody>,
) -> Result<Json<Ack>> {
    set_banner(state, session, body, Field::Note).await
}

/// `POST /api/note/clear`.
pub async fn clear_note(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Ack>> {
    clear_banner(state, session, Field::Note).await
}

/// `POST /api/ticker`.
pub async fn set_ticker(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Lenient(body): Lenient<TextBody>,
) -> Result<Json<Ack>> {
    set_banner(state, session, body, Field::Ticker).await
}

/// `POST /api/ticker/clear`.
pub async fn clear_ticker(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Ack>> {
    clear_banner(state, session, Field::Ticker).await
}

/// `POST /api/display-message`.
pub async fn set_display_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Lenient(body): Lenient<TextBody>,
) -> Result<Json<Ack>> {
    set_banner(state, session, body, Field::DisplayMessage).await
}

/// `POST /api/display-message/clear`.
pub async fn clear_display_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Ack>> {
    clear_banner(state, session, Field::DisplayMessage).await
}

/// `POST /api/center-image`.
pub async fn set_center_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Lenient(body): Lenient<ImageBody>,
) -> Result<Json<Ack>> {
    let image = body.image.unwrap_or_default();
    if !image.starts_with(DATA_URL_PREFIX) {
        return Err(ServerError::InvalidImage);
    }

    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    doc.center_image = Some(CenterImage {
        data_url: image,
        set_by: session.username.clone(),
        set_at: Utc::now(),
    });
    core.store.set(doc)?;

    tracing::info!(by = %session.username, "center image updated");
    Ok(Json(Ack::default()))
}

/// `DELETE /api/center-image`.
pub async fn clear_center_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Ack>> {
    let mut core = state.core.lock().await;
    let mut doc = core.store.get().clone();
    doc.center_image = None;
    core.store.set(doc)?;

    tracing::info!(by = %session.username, "center image cleared");
    Ok(Json(Ack::default()))
}
