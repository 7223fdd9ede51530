use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use backend_application::AppState;
use backend_domain::ChatReplier;
use backend_infrastructure::AppConfig;
use backend_interfaces_http::{build_router, cors_layer};

use crate::context::AppContext;
use crate::discord_bridge::spawn_discord_bridge;
use crate::ingestion_worker::spawn_ingestion_worker;

fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(cors_layer(&state.config.cors_origins))
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_standalone(config: AppConfig) -> Result<()> {
    let context = AppContext::new(&config).await?;
    let state = context.state;

    match context.replier {
        Some(replier) => {
            let chat_replier: Arc<dyn ChatReplier> = replier.clone();
            let (queue, _worker) = spawn_ingestion_worker(state.clone(), chat_replier);
            spawn_discord_bridge(state.clone(), replier, queue);
        }
        None => info!("no discord_token configured, serving the HTTP API only"),
    }

    let app = build_router_with_layers(state.clone());
    let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(
        "shutdown complete, {} events recorded this run",
        state.metrics.events_recorded()
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("cannot install SIGTERM handler: {}", err);
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
    info!("shutdown signal received");
}
