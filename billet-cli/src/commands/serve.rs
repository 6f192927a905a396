//! Serve command - migrations, expiry sweep, and the HTTP API

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Path as NoteName, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use minijinja::{context, Environment};
use tracing::{error, info};
use uuid::Uuid;

use billet_core::config::Config;
use billet_core::services::{NoteService, SWEEP_INTERVAL};
use billet_core::{Error as StoreError, SetOutcome};

use crate::commands::{get_context, resolve_backend};
use crate::{templates, StoreArgs};

/// Bearer tokens from /api/session are honored this long.
const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Server state shared across handlers.
///
/// The session map is owned here - created at server start, gone at
/// shutdown - and every lookup checks the token's age.
struct AppState {
    notes: NoteService,
    templates: Environment<'static>,
    credentials: Option<HashSet<String>>,
    sessions: Mutex<HashMap<String, Instant>>,
    recent_notes: usize,
}

impl AppState {
    fn basic_auth_ok(&self, encoded: &str) -> bool {
        let Some(credentials) = &self.credentials else {
            return true;
        };
        let Ok(decoded) = BASE64.decode(encoded) else {
            return false;
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return false;
        };
        credentials.contains(&pair)
    }

    fn session_ok(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(token) {
            Some(issued) if issued.elapsed() < SESSION_TTL => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    fn issue_session(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.lock().unwrap();
        // Housekeeping: drop tokens that already aged out.
        sessions.retain(|_, issued| issued.elapsed() < SESSION_TTL);
        sessions.insert(token.clone(), Instant::now());
        token
    }
}

pub async fn run(
    store: StoreArgs,
    host: &str,
    port: u16,
    creds: Option<&str>,
    creds_file: Option<&Path>,
    note_expiry: u64,
    recent_notes: usize,
) -> Result<()> {
    let credentials = Config::load_credentials(creds, creds_file)?;

    let mut config = Config::new(resolve_backend(&store))
        .with_expiry_days(note_expiry)
        .with_recent_notes(recent_notes);
    config.credentials = credentials.clone();

    let ctx = get_context(config)?;

    if let Some(expiry) = ctx.expiry_service() {
        tokio::spawn(expiry.run(SWEEP_INTERVAL));
    }

    if credentials.is_none() {
        info!("authentication disabled (no credentials configured)");
    }

    let state = Arc::new(AppState {
        notes: ctx.note_service.clone(),
        templates: templates::environment()?,
        credentials,
        sessions: Mutex::new(HashMap::new()),
        recent_notes: ctx.config.recent_notes,
    });

    let app = Router::new()
        .route("/", get(index_page))
        .route("/note/{name}", get(note_page))
        .route(
            "/api/note/{name}",
            get(raw_note)
                .post(create_note)
                .put(upsert_note)
                .delete(delete_note),
        )
        .route("/api/session", post(create_session))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), auth))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("invalid host:port")?;
    info!("serving notes at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    axum::serve(listener, app).await.context("HTTP server error")
}

/// Basic-auth / bearer-token middleware. A no-op when auth is disabled.
async fn auth(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if state.credentials.is_none() {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let allowed = match authorization {
        Some(value) => {
            if let Some(encoded) = value.strip_prefix("Basic ") {
                state.basic_auth_ok(encoded)
            } else if let Some(token) = value.strip_prefix("Bearer ") {
                state.session_ok(token)
            } else {
                false
            }
        }
        None => false,
    };

    if allowed {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=Restricted")],
            "401 Unauthorized",
        )
            .into_response()
    }
}

/// POST /api/session - trade credentials for a bearer token.
///
/// The auth middleware has already validated the request, so this only
/// mints the token.
async fn create_session(State(state): State<Arc<AppState>>) -> Response {
    let token = state.issue_session();
    Json(serde_json::json!({
        "token": token,
        "expires_in_secs": SESSION_TTL.as_secs(),
    }))
    .into_response()
}

/// GET / - HTML index of recent notes.
async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    let notes = match state.notes.recent(state.recent_notes) {
        Ok(notes) => notes,
        Err(e) => return store_error(e),
    };
    render(&state, "index.html", context! { notes })
}

/// GET /note/{name} - HTML note page.
async fn note_page(State(state): State<Arc<AppState>>, NoteName(name): NoteName<String>) -> Response {
    match state.notes.get(&name) {
        Ok(Some(body)) => {
            let body = String::from_utf8_lossy(&body).into_owned();
            render(&state, "note.html", context! { title => name, body })
        }
        Ok(None) => not_found(),
        Err(e) => store_error(e),
    }
}

/// GET /api/note/{name} - raw note body. Good for binaries or curl.
async fn raw_note(State(state): State<Arc<AppState>>, NoteName(name): NoteName<String>) -> Response {
    match state.notes.get(&name) {
        Ok(Some(body)) => (
            [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
            body,
        )
            .into_response(),
        Ok(None) => not_found(),
        Err(e) => store_error(e),
    }
}

/// POST /api/note/{name} - create; 409 when the note already exists.
async fn create_note(
    state: State<Arc<AppState>>,
    name: NoteName<String>,
    body: Bytes,
) -> Response {
    set_note(state, name, body, false).await
}

/// PUT /api/note/{name} - create or overwrite.
async fn upsert_note(
    state: State<Arc<AppState>>,
    name: NoteName<String>,
    body: Bytes,
) -> Response {
    set_note(state, name, body, true).await
}

async fn set_note(
    State(state): State<Arc<AppState>>,
    NoteName(name): NoteName<String>,
    body: Bytes,
    clobber: bool,
) -> Response {
    match state.notes.set(&name, &body, clobber) {
        Ok(SetOutcome::Created) => (StatusCode::CREATED, "201 Created").into_response(),
        Ok(SetOutcome::Updated) => (StatusCode::OK, "Updated").into_response(),
        Ok(SetOutcome::Conflict) => (StatusCode::CONFLICT, "409 Conflict").into_response(),
        Err(e) => store_error(e),
    }
}

/// DELETE /api/note/{name}
async fn delete_note(
    State(state): State<Arc<AppState>>,
    NoteName(name): NoteName<String>,
) -> Response {
    match state.notes.delete(&name) {
        Ok(()) => (StatusCode::OK, "Deleted").into_response(),
        Err(e) => store_error(e),
    }
}

fn render(state: &AppState, template: &str, ctx: minijinja::Value) -> Response {
    let page = state
        .templates
        .get_template(template)
        .and_then(|t| t.render(ctx));
    match page {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("rendering {template}: {e}");
            internal_error()
        }
    }
}

fn store_error(e: StoreError) -> Response {
    match e {
        StoreError::InvalidName(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        other => {
            error!("store error: {other}");
            internal_error()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
}
