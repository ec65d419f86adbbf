//! HTTP server: routes, body translation, blocking dispatch, graceful shutdown.

use crate::config::{self, Config};
use crate::dispatch::{ActionResult, Dispatcher, Params};
use crate::error::ActionError;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path as UrlPath, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

type ApiResponse = (StatusCode, Json<ActionResult>);

/// Shared state for the API (dispatcher and per-request time limit).
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    /// When Some, a dispatch that runs longer returns 504.
    pub request_timeout: Option<Duration>,
}

impl ApiState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            request_timeout: None,
        }
    }
}

/// All routes, with permissive CORS.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_http))
        .route("/api/mobile-control", post(mobile_control))
        .route("/api/phonebook", get(list_contacts).post(add_contact))
        .route("/api/phonebook/:name", delete(delete_contact))
        .route("/api/system/volume", post(set_volume))
        .route("/api/system/brightness", post(set_brightness))
        .route("/api/system/theme", post(set_theme))
        .route("/api/communication/call", post(make_call))
        .route("/api/communication/sms", post(send_sms))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the API server; binds to config.server.bind:config.server.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
/// `config_path` locates the default phonebook file beside the config.
pub async fn run_server(config: Config, config_path: PathBuf) -> Result<()> {
    let bind = config.server.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        log::warn!(
            "binding to non-loopback address {}; the API has no authentication",
            bind
        );
    }
    let dispatcher = Dispatcher::from_config(&config, &config_path);
    log::info!(
        "phonebook at {}, platform {}",
        dispatcher.store().path().display(),
        dispatcher.platform_name()
    );
    let mut state = ApiState::new(dispatcher);
    state.request_timeout = config.server.request_timeout_secs.map(Duration::from_secs);

    let bind_addr = format!("{}:{}", bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("api listening on {}", bind_addr);
    serve(listener, state).await
}

/// Serve on an already-bound listener until a shutdown signal arrives.
pub async fn serve(listener: tokio::net::TcpListener, state: ApiState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("api server exited")?;
    log::info!("api stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

fn bad_request(msg: impl Into<String>) -> ApiResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ActionResult::failed(&ActionError::validation(msg))),
    )
}

/// Body must be a non-empty JSON object.
fn parse_body(body: &[u8]) -> Result<Params, ApiResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(bad_request("request body must not be empty"));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(bad_request("request body must be a JSON object")),
        Err(e) => Err(bad_request(format!("invalid JSON body: {}", e))),
    }
}

/// Copy body fields into dispatcher params under their action names (`(body_key, param_key)`).
fn remap(body: &Params, pairs: &[(&str, &str)]) -> Params {
    let mut params = Params::new();
    for (from, to) in pairs {
        if let Some(v) = body.get(*from) {
            params.insert(to.to_string(), v.clone());
        }
    }
    params
}

/// Dispatch on the blocking pool; the dispatcher waits on child processes.
async fn run_action(state: &ApiState, action: &str, params: Params) -> ApiResponse {
    let dispatcher = state.dispatcher.clone();
    let name = action.to_string();
    let task = tokio::task::spawn_blocking(move || dispatcher.dispatch(&name, &params));
    let joined = match state.request_timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                log::warn!("action {} exceeded {:?}; returning 504", action, limit);
                return (
                    StatusCode::GATEWAY_TIMEOUT,
                    Json(ActionResult::failed(&ActionError::Execution(format!(
                        "action '{}' did not finish within {}s",
                        action,
                        limit.as_secs()
                    )))),
                );
            }
        },
        None => task.await,
    };
    match joined {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(e) => {
            log::error!("action {} task failed: {}", action, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResult::failed(&ActionError::Execution(format!(
                    "internal error while running '{}'",
                    action
                )))),
            )
        }
    }
}

/// GET /health returns a static readiness JSON (for probes).
async fn health_http() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "mobilectl",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/mobile-control: `{ "action": ..., <params> }`.
async fn mobile_control(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    let mut params = match parse_body(&body) {
        Ok(p) => p,
        Err(r) => return r,
    };
    let action = match params.shift_remove("action") {
        Some(Value::String(a)) if !a.trim().is_empty() => a,
        _ => return bad_request("missing 'action' field"),
    };
    run_action(&state, &action, params).await
}

async fn list_contacts(State(state): State<ApiState>) -> ApiResponse {
    run_action(&state, "phonebook_list", Params::new()).await
}

/// POST /api/phonebook: `{ "name", "phone", "alias"? }`.
async fn add_contact(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    match parse_body(&body) {
        Ok(b) => {
            let params = remap(
                &b,
                &[
                    ("name", "contact_name"),
                    ("phone", "phone_number"),
                    ("alias", "contact_alias"),
                ],
            );
            run_action(&state, "phonebook_add", params).await
        }
        Err(r) => r,
    }
}

async fn delete_contact(State(state): State<ApiState>, UrlPath(name): UrlPath<String>) -> ApiResponse {
    let mut params = Params::new();
    params.insert("contact_name".to_string(), Value::String(name));
    run_action(&state, "phonebook_delete", params).await
}

/// Shared shape of the single-purpose POST routes.
async fn remapped(
    state: &ApiState,
    body: &[u8],
    action: &str,
    pairs: &[(&str, &str)],
) -> ApiResponse {
    match parse_body(body) {
        Ok(b) => run_action(state, action, remap(&b, pairs)).await,
        Err(r) => r,
    }
}

async fn set_volume(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    remapped(&state, &body, "volume", &[("level", "volume_level")]).await
}

async fn set_brightness(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    remapped(&state, &body, "brightness", &[("level", "brightness_level")]).await
}

async fn set_theme(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    remapped(&state, &body, "theme", &[("mode", "theme_mode")]).await
}

async fn make_call(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    remapped(&state, &body, "call", &[("phone_number", "phone_number")]).await
}

async fn send_sms(State(state): State<ApiState>, body: Bytes) -> ApiResponse {
    remapped(
        &state,
        &body,
        "sms",
        &[("phone_number", "phone_number"), ("message", "sms_message")],
    )
    .await
}

async fn not_found() -> ApiResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ActionResult::failed(&ActionError::NotFound(
            "no such endpoint".to_string(),
        ))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_requires_object() {
        assert!(parse_body(b"").is_err());
        assert!(parse_body(b"  \n").is_err());
        assert!(parse_body(b"[1,2]").is_err());
        assert!(parse_body(b"{oops").is_err());
        let p = parse_body(br#"{"level": 5}"#).unwrap();
        assert_eq!(p.get("level"), Some(&json!(5)));
    }

    #[test]
    fn bad_request_is_validation_kind() {
        let (status, Json(result)) = bad_request("nope");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(result.error, Some(crate::error::ErrorKind::ValidationError));
    }

    #[test]
    fn remap_renames_and_skips_absent() {
        let body = parse_body(br#"{"name":"a","phone":"1","extra":true}"#).unwrap();
        let p = remap(
            &body,
            &[("name", "contact_name"), ("phone", "phone_number"), ("alias", "contact_alias")],
        );
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("contact_name"), Some(&json!("a")));
        assert!(p.get("contact_alias").is_none());
    }
}
