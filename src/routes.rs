use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::{collections::HashMap, sync::Arc};
use parking_lot::RwLock;
use uuid::Uuid;
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::GenerateError,
    gemini::{GeminiClient, api_base_from_env},
    models::{GenerateRequest, GenerationResult, Session, SessionView},
    render::render_region,
};

pub type SessionStore = Arc<RwLock<HashMap<Uuid, Session>>>;

/// Sessions idle past this age are dropped; the page's unload DELETE is only
/// best-effort, so the store sweeps on each session creation.
const SESSION_IDLE_TTL_SECS: i64 = 60 * 60;

fn sweep_expired_sessions(store: &SessionStore, now: chrono::DateTime<Utc>) {
    let ttl = chrono::Duration::seconds(SESSION_IDLE_TTL_SECS);
    let mut guard = store.write();
    let before = guard.len();
    guard.retain(|_, session| now - session.updated_at < ttl);
    let swept = before - guard.len();
    if swept > 0 {
        tracing::info!("🧹 Swept {} expired session(s)", swept);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub http: reqwest::Client,
    pub gemini_base: String,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_base_url(api_base_from_env())
    }

    pub fn with_base_url(gemini_base: String) -> Self {
        AppState {
            store: Arc::default(),
            http: reqwest::Client::new(),
            gemini_base,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/session", post(create_session))
        .route("/api/session/:id", get(get_session).delete(delete_session))
        .route("/api/session/:id/generate", post(generate_chapter))
        .route("/api/session/:id/view", get(view_result))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "AI Book Chapter Writer",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn create_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    sweep_expired_sessions(&state.store, Utc::now());
    let session = Session::new();
    let id = session.id;
    state.store.write().insert(id, session);
    tracing::info!("🆕 Created session {}", id);
    Json(serde_json::json!({ "session_id": id }))
}

pub async fn get_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, GenerateError> {
    let guard = state.store.read();
    let session = guard.get(&id).ok_or(GenerateError::SessionNotFound)?;
    Ok(Json(SessionView::from(session)))
}

pub async fn delete_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Response {
    if state.store.write().remove(&id).is_some() {
        tracing::info!("🗑️ Cleared session {}", id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// One submission: snapshot the form fields, gate on the credential, issue
/// the single provider call, and replace the session's last result. A failed
/// submission leaves the previous result untouched.
pub async fn generate_chapter(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>, GenerateError> {
    // Capture the credential in the session before the precondition check,
    // matching the form behavior where the key field persists across submits.
    {
        let mut guard = state.store.write();
        let session = guard.get_mut(&id).ok_or(GenerateError::SessionNotFound)?;
        session.api_key = body.api_key.clone();
        session.updated_at = Utc::now();
    }

    if body.api_key.is_empty() {
        return Err(GenerateError::MissingApiKey);
    }

    tracing::info!("✍️ Generating chapter for book: {}", body.book_name);

    // Provider call happens outside the lock.
    let client = GeminiClient::new(
        state.http.clone(),
        body.api_key.clone(),
        state.gemini_base.clone(),
    );
    let result = client.generate_chapter(&body).await?;

    let mut guard = state.store.write();
    let session = guard.get_mut(&id).ok_or(GenerateError::SessionNotFound)?;
    session.last_result = Some(result.clone());
    session.updated_at = Utc::now();

    tracing::info!(
        "✅ Chapter generated for session {} (well-formed: {})",
        id,
        result.is_well_formed()
    );
    Ok(Json(result))
}

pub async fn view_result(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Html<String>, GenerateError> {
    let guard = state.store.read();
    let session = guard.get(&id).ok_or(GenerateError::SessionNotFound)?;
    Ok(Html(render_region(session.last_result.as_ref())))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}


const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>AI Book Chapter Writer</title>
    <meta charset="utf-8">
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; max-width: 960px; }
        .columns { display: flex; gap: 24px; }
        .columns > div { flex: 1; }
        label { display: block; margin-top: 12px; font-weight: bold; }
        input, textarea { width: 100%; padding: 6px; margin-top: 4px; box-sizing: border-box; }
        textarea { min-height: 80px; }
        button { margin-top: 16px; padding: 10px 20px; }
        #spinner { display: none; margin-top: 12px; }
        #error { display: none; margin-top: 12px; background-color: #fdecea; padding: 12px; border-radius: 4px; }
        .warning { background-color: #fff4e5; padding: 12px; border-radius: 4px; margin-bottom: 12px; }
        .result { margin-top: 24px; background-color: #f5f5f5; padding: 20px; border-radius: 8px; }
        .result pre { white-space: pre-wrap; }
        .chapter-content { white-space: pre-wrap; }
    </style>
</head>
<body>
    <h1>📖 AI Book Chapter Writer</h1>

    <label for="api_key">🔑 Google AI Studio API Key</label>
    <input type="password" id="api_key" placeholder="Enter your Google API Key">

    <h2>📚 Chapter Inputs</h2>
    <form id="chapter_form">
        <div class="columns">
            <div>
                <label for="book_name">Book Name</label>
                <input type="text" id="book_name">
                <label for="chapter_title">Chapter Title</label>
                <input type="text" id="chapter_title">
                <label for="narrative_style">Narrative Style</label>
                <textarea id="narrative_style" placeholder="e.g. First-person, poetic, dark fantasy..."></textarea>
            </div>
            <div>
                <label for="sequence">Chapter Sequence / Outline</label>
                <textarea id="sequence" placeholder="Describe the flow of the chapter..."></textarea>
                <label for="details">Additional Details / Constraints</label>
                <textarea id="details" placeholder="Themes, tone, pacing, word count, etc."></textarea>
            </div>
        </div>
        <button type="submit">✍️ Generate Chapter</button>
    </form>

    <div id="spinner">⏳ Generating chapter...</div>
    <div id="error"></div>
    <h2 id="output_heading" style="display:none">🧠 Generated Output</h2>
    <div id="output"></div>

    <script>
        let sessionId = null;

        async function ensureSession() {
            if (sessionId) return sessionId;
            const res = await fetch('/api/session', { method: 'POST' });
            const body = await res.json();
            sessionId = body.session_id;
            return sessionId;
        }

        async function refreshView() {
            const res = await fetch('/api/session/' + sessionId + '/view');
            const html = await res.text();
            document.getElementById('output').innerHTML = html;
            document.getElementById('output_heading').style.display = html ? 'block' : 'none';
        }

        document.getElementById('chapter_form').addEventListener('submit', async (e) => {
            e.preventDefault();
            const spinner = document.getElementById('spinner');
            const error = document.getElementById('error');
            error.style.display = 'none';
            spinner.style.display = 'block';
            try {
                const id = await ensureSession();
                const payload = {
                    api_key: document.getElementById('api_key').value,
                    book_name: document.getElementById('book_name').value,
                    chapter_title: document.getElementById('chapter_title').value,
                    narrative_style: document.getElementById('narrative_style').value,
                    sequence: document.getElementById('sequence').value,
                    details: document.getElementById('details').value,
                };
                const res = await fetch('/api/session/' + id + '/generate', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(payload),
                });
                if (!res.ok) {
                    const body = await res.json();
                    error.textContent = 'Error: ' + (body.error || res.statusText);
                    error.style.display = 'block';
                } else {
                    await refreshView();
                }
            } catch (err) {
                error.textContent = 'Error: ' + err;
                error.style.display = 'block';
            } finally {
                spinner.style.display = 'none';
            }
        });

        // End-of-session cleanup; the server drops credential and result.
        window.addEventListener('beforeunload', () => {
            if (sessionId) {
                fetch('/api/session/' + sessionId, { method: 'DELETE', keepalive: true });
            }
        });
    </script>
</body>
</html>
"#;
