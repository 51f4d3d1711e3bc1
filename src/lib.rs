//! Callboard is a single-tenant queue calling service: staff call numbered
//! tickets, an admin manages users and broadcast fields, and a public display
//! screen polls the current state.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
mod crypto;
pub mod error;
mod queue;
mod router;
mod session;
mod store;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, header};
use axum::Router;
use error::ServerError;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub core: Arc<Mutex<Core>>,
}

/// Single owner of every mutable table.
///
/// Requests lock it for the whole read-validate-mutate-persist step, so two
/// concurrent mutations can never interleave on the queue document.
pub struct Core {
    pub users: user::UserDirectory,
    pub sessions: session::SessionManager,
    pub store: store::StateStore,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION]))
        // Add CORS preflight support for the display screen.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        .nest("/api", router::api(state.clone()))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
        .layer(middleware)
}

/// Unknown path or method. Same envelope either way.
async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Initialize the application state.
pub fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read();

    let paths = match &config.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            (Some(dir.join("users.json")), Some(dir.join("state.json")))
        },
        None => {
            tracing::warn!(
                "missing `data_dir` entry on `config.yaml` file, state will not survive restarts"
            );
            (None, None)
        },
    };

    let hasher = crypto::Hasher::new(config.pepper.clone().unwrap_or_default());
    let users = user::UserDirectory::open(paths.0, hasher, &config.seed)?;
    let sessions = session::SessionManager::new(config.session.lifetime_days);
    let store = store::StateStore::open(paths.1)?;

    Ok(AppState {
        config,
        core: Arc::new(Mutex::new(Core {
            users,
            sessions,
            store,
        })),
    })
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

#[cfg(test)]
pub(crate) const TEST_ADMIN_PASSWORD: &str = "2626";
#[cfg(test)]
pub(crate) const TEST_STAFF_PASSWORD: &str = "1234";

/// In-memory state seeded with one admin and one staff account.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let config = Arc::new(config::Configuration::default());
    let hasher = crypto::Hasher::new("");
    let seed = config::Seed {
        admin: config::Account {
            username: "admin".into(),
            password: TEST_ADMIN_PASSWORD.into(),
        },
        staff: Some(config::Account {
            username: "staff".into(),
            password: TEST_STAFF_PASSWORD.into(),
        }),
    };

    let users = user::UserDirectory::open(None, hasher, &seed).unwrap();
    let sessions = session::SessionManager::new(config.session.lifetime_days);
    let store = store::StateStore::open(None).unwrap();

    AppState {
        config,
        core: Arc::new(Mutex::new(Core {
            users,
            sessions,
            store,
        })),
    }
}

/// Log in through the real route and return the bearer token.
#[cfg(test)]
pub(crate) async fn login_token(app: &Router, username: &str, password: &str) -> String {
    use http_body_util::BodyExt;

    let response = make_request(
        app.clone(),
        Method::POST,
        "/api/login",
        None,
        serde_json::json!({ "username": username, "password": password }).to_string(),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    body["token"].as_str().unwrap().to_owned()
}
