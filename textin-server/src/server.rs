use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use textin_core::{ContactSummary, Registry};
use textin_types::InboundMessage;

use crate::{config::ServerConfig, twiml};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub registry: Arc<Registry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Provider webhook: Twilio sends GET or POST depending on its settings
        .route("/", get(inbound_query).post(inbound_form))
        .route("/healthz", get(healthz))
        .route("/api/status", get(status))
        .with_state(state)
}

pub async fn serve(config: ServerConfig, registry: Arc<Registry>) -> Result<()> {
    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        registry: registry.clone(),
    };

    info!(addr = %config.listen_addr, "textin listening");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Serialize)]
struct StatusPayload {
    listening: String,
    contacts: Vec<ContactSummary>,
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusPayload {
        listening: state.config.listen_addr.clone(),
        contacts: state.registry.snapshot(),
    })
}

/// Webhook parameters, named the way the SMS provider sends them.
#[derive(Debug, Deserialize)]
struct WebhookParams {
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "Body")]
    body: Option<String>,
}

async fn inbound_query(
    State(state): State<AppState>,
    Query(params): Query<WebhookParams>,
) -> Response {
    handle_inbound(&state, params).await
}

async fn inbound_form(State(state): State<AppState>, Form(params): Form<WebhookParams>) -> Response {
    handle_inbound(&state, params).await
}

async fn handle_inbound(state: &AppState, params: WebhookParams) -> Response {
    let Some(sender) = params.from.filter(|from| !from.trim().is_empty()) else {
        warn!("webhook request without a sender");
        return (StatusCode::BAD_REQUEST, "missing From").into_response();
    };

    let message = InboundMessage::new(
        sender.trim(),
        params.body.as_deref().unwrap_or_default(),
        state.registry.clock().now(),
    );
    let reply = state.registry.dispatch(&message).await;

    (
        [(header::CONTENT_TYPE, "application/xml")],
        twiml::render(reply.as_deref()),
    )
        .into_response()
}
