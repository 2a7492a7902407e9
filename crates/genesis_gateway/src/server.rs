use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use genesis_core::config::HttpConfig;
use genesis_limbic::Consciousness;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

/// Source label for messages posted through the web page.
pub const WEB_SOURCE: &str = "Web User";

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state for the route handlers.
#[derive(Clone)]
struct AppState {
    genesis: Arc<Consciousness>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageForm {
    #[serde(default)]
    message: String,
}

/// The web interface:
/// - `GET /` chat page
/// - `POST /message` form-encoded `message` field, plain-text reply
/// - `GET /status` status snapshot as JSON
/// - `GET /health` health check
pub fn router(genesis: Arc<Consciousness>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/message", post(handle_message))
        .route("/status", get(status))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(AppState { genesis })
}

pub struct HttpServer {
    genesis: Arc<Consciousness>,
    host: String,
    port: u16,
}

impl HttpServer {
    pub fn new(genesis: Arc<Consciousness>, config: &HttpConfig) -> Self {
        Self {
            genesis,
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind and serve in a background task until `token` is cancelled.
    /// A bind failure is logged and ends the task; it never takes the
    /// process down.
    pub fn start(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let addr = self.addr();
            let listener = match TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!("Web interface failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Genesis web interface running at http://{}", addr);
            if let Err(e) = serve(listener, self.genesis, token).await {
                tracing::error!("Web interface error: {}", e);
            }
        })
    }
}

/// Serve on an already-bound listener.
pub async fn serve(
    listener: TcpListener,
    genesis: Arc<Consciousness>,
    token: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router(genesis))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
}

// ============================================================================
// Route handlers
// ============================================================================

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.genesis.status().await)
}

/// A missing, empty or unparseable message gets an empty reply.
async fn handle_message(
    State(state): State<AppState>,
    form: Result<Form<MessageForm>, FormRejection>,
) -> String {
    let message = match form {
        Ok(Form(form)) => form.message,
        Err(e) => {
            tracing::warn!("Malformed /message request: {}", e);
            return String::new();
        }
    };
    if message.is_empty() {
        return String::new();
    }

    tracing::debug!(channel = "web", "received: {}", message);
    let reply = state.genesis.interact(&message, WEB_SOURCE).await;
    tracing::debug!(channel = "web", "sent: {}", reply);
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(health().await, "ok");
    }

    #[test]
    fn test_index_posts_to_message_and_polls_status() {
        assert!(INDEX_HTML.contains("fetch('/message'"));
        assert!(INDEX_HTML.contains("fetch('/status')"));
        assert!(INDEX_HTML.contains("setInterval(updateStatus, 5000)"));
    }
}
