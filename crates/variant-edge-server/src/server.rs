//! HTTP entry point: every path except `/health` serves a variant page.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use variant_edge::{HandlerError, RequestHandler, VariantResponse};

/// Shared state passed to all handlers via axum State.
pub struct ServerState {
    pub handler: RequestHandler,
}

/// Build the router around a request handler.
pub fn router(handler: RequestHandler) -> Router {
    let state = Arc::new(ServerState { handler });

    Router::new()
        .route("/health", get(handle_health))
        .fallback(handle_variant)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, handler: RequestHandler) -> anyhow::Result<()> {
    let app = router(handler);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("variant-edge listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires; never resolves if listening failed.
async fn wait_for_signal(signal: impl std::future::Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            tracing::warn!("cannot listen for Ctrl-C, graceful shutdown disabled: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// Join every `Cookie` header; HTTP/2 clients may send one per pair.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

async fn handle_variant(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let cookies = cookie_header(&headers);

    match state.handler.handle(cookies.as_deref()).await {
        Ok(resp) => page_response(resp),
        Err(e) => error_response(&e),
    }
}

fn page_response(resp: VariantResponse) -> Response {
    let mut response = (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("text/html"))],
        resp.html,
    )
        .into_response();

    if let Some(cookie) = resp.set_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(_) => {
                tracing::warn!(url = %resp.assignment.url, "variant URL cannot be stored in a cookie");
            }
        }
    }

    response
}

fn error_response(err: &HandlerError) -> Response {
    tracing::warn!("upstream failure: {err}");
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        format!("{err}\n"),
    )
        .into_response()
}

/// Health check endpoint.
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
