use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::chat::ChatService;
use crate::config::ServeConfig;
use crate::error::ChatError;
use crate::models::{ChatRequest, ChatResponse};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(templates_dir: impl Into<PathBuf>, chat: ChatService) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(templates_dir.into())),
            chat: Arc::new(chat),
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    // Use AutoReloader for development convenience
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, Response> {
    let persona = state.chat.persona();
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    institution => &persona.name,
                    institution_short => &persona.short_name,
                    greeting => persona.greeting(),
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        })
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat request body: {}", rejection.body_text());
        ChatError::bad_request("Invalid request body")
    })?;

    state.chat.respond(&request.messages).await.map(Json)
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    // Serve static files from the configured directory
    let static_files_service = ServeDir::new(static_dir).not_found_service(tower::service_fn(
        |_: axum::extract::Request| async {
            Ok::<_, std::convert::Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        },
    ));

    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(chat_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(config: ServeConfig) -> Result<()> {
    let chat = config
        .build_chat_service()
        .context("Failed to initialize chat service")?;
    let state = AppState::new(&config.templates_dir, chat);
    let app = router(state, &config.static_dir);

    let addr = config.addr();
    info!("Web server listening on http://{}", addr);

    // Bind using tokio::net::TcpListener
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
