use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::answer::{Answerer, LlmAnswerer};
use crate::config::AppConfig;
use crate::history::{HistoryStore, SESSION_COOKIE, Turn};
use crate::llm::ChatCompletionsDriver;
use crate::page;
use crate::rate_limit::{AskRateLimiter, limit_questions};
use crate::transport::{AskRequest, AskResponse};

/// Largest accepted request body.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = config.llm.settings();
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        api_key_set = settings.api_key.is_some(),
        "LLM configuration loaded"
    );

    let answerer: Arc<dyn Answerer> =
        Arc::new(LlmAnswerer::new(ChatCompletionsDriver::new(settings)));

    let state = AppState::new(Arc::clone(&config), answerer);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
///
/// Timeout and rate limiting wrap `/ask` only; page loads never count
/// against the question budget.
pub fn build_router(state: AppState) -> Router {
    let resilience = &state.config.resilience;

    let mut ask_routes = Router::new().route("/ask", post(ask_handler));
    if !resilience.timeout_disabled {
        let timeout = Duration::from_secs(resilience.timeout_secs);
        ask_routes = ask_routes.route_layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => {
                        tracing::warn!(name: "ask.timed_out", "Question timed out");
                        (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                    }
                }
            },
        ));
    }
    if resilience.rate_limit_enabled {
        let limiter = Arc::new(AskRateLimiter::from_config(resilience));
        ask_routes =
            ask_routes.route_layer(axum::middleware::from_fn_with_state(limiter, limit_questions));
    }

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/clear_history", post(clear_history_handler))
        .merge(ask_routes)
        .nest_service("/static", ServeDir::new(&state.config.server.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

impl AppState {
    /// Assemble state from configuration and an answerer.
    pub fn new(config: Arc<AppConfig>, answerer: Arc<dyn Answerer>) -> Self {
        let history = HistoryStore::with_idle_timeout(Duration::from_secs(
            config.server.session_idle_secs,
        ));
        Self {
            answerer,
            history,
            config,
        }
    }
}

/// The visitor's session id, minting one (and its cookie) when absent.
fn session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        return (jar, id);
    }
    let id = HistoryStore::new_session_id();
    let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - The chat page.
async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    Html(page::chat_page(&state.config.server.page_title))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// GET /health - Liveness probe.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Error body returned when no answer could be produced.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// POST /ask - Answer one question in the context of the visitor's history.
async fn ask_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<AskRequest>,
) -> Result<(CookieJar, Json<AskResponse>), (StatusCode, Json<ErrorResponse>)> {
    let (jar, session_id) = session(jar);
    let question = req.question.trim();
    let history = state.history.recent(&session_id);
    info!(
        name: "ask.received",
        question_len = question.len(),
        history_turns = history.len(),
        "Received ask request"
    );

    if question.is_empty() {
        return Ok((jar, Json(AskResponse::text(""))));
    }

    match state.answerer.answer(question, &history).await {
        Ok(answer) => {
            info!(
                name: "ask.answered",
                answer_len = answer.len(),
                "Answer produced"
            );
            state
                .history
                .record(&session_id, Turn::new(question, answer.clone()));
            Ok((jar, Json(AskResponse::text(answer))))
        }
        Err(e) => {
            tracing::error!(name: "ask.failed", error = ?e, "Failed to answer question");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "failed to get an answer".to_string(),
                }),
            ))
        }
    }
}

/// POST /clear_history - Forget the visitor's conversation and return to the page.
async fn clear_history_handler(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let cleared = state.history.clear(cookie.value());
        info!(name: "history.cleared", cleared, "Conversation history cleared");
    }
    Redirect::to("/")
}
