// rest/mod.rs — HTTP transport adapter.
//
// Thin axum layer that translates verbs/paths into the four relay operations
// and relay outcomes into status codes.
//
// Endpoints:
//   POST   /{session_id}                              start a session
//   DELETE /{session_id}                              end a session
//   GET    /message/{session_id}/{participant_id}     drain a mailbox
//   POST   /message/{session_id}                      post a message
//   GET    /health                                    liveness + counters

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppContext;

pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("relay listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let max_body = ctx.config.max_body_bytes;
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/message/{session_id}/{participant_id}",
            get(routes::messages::get_messages),
        )
        .route("/message/{session_id}", post(routes::messages::post_message))
        .route(
            "/{session_id}",
            post(routes::sessions::start_session).delete(routes::sessions::end_session),
        )
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
