//! Public read path: health probe and the display snapshot.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::queue::QueueState;
use crate::router::Ack;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Response {
    ok: bool,
    state: QueueState,
}

/// `GET /api/health`.
pub async fn health() -> Json<Ack> {
    Json(Ack::default())
}

/// `GET /api/state`. Unauthenticated; the display screen polls this.
pub async fn state(State(state): State<AppState>) -> Json<Response> {
    let core = state.core.lock().await;
    Json(Response {
        ok: true,
        state: core.store.get().clone(),
    })
}
