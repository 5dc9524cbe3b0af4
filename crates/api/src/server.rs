//! Router assembly and shared application state: a thin wrapper that owns
//! the dependency graph and builds a `Router<AppState>`.

use crate::middleware::logging::get_tracing_layer;
use courier_common::CourierConfig;
use courier_core::{
    BroadcastEngine, ChannelAuthorizer, ChannelRegistry, LifecycleSupervisor, RateLimiter,
    StatsCollector, TokenVerifier,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CourierConfig>,
    pub registry: Arc<ChannelRegistry>,
    pub broadcast: Arc<BroadcastEngine>,
    pub stats: Arc<StatsCollector>,
    pub rate_limiter: Arc<RateLimiter>,
    pub authorizer: Arc<ChannelAuthorizer>,
    pub token_verifier: Option<Arc<TokenVerifier>>,
    pub lifecycle: Arc<LifecycleSupervisor>,
}

pub struct CourierServer {
    state: AppState,
}

impl CourierServer {
    pub fn new(config: CourierConfig) -> anyhow::Result<Self> {
        let registry = Arc::new(ChannelRegistry::new(
            config.max_clients_per_channel,
            config.max_total_clients,
        ));
        let stats = Arc::new(StatsCollector::new());
        let broadcast = Arc::new(BroadcastEngine::new(registry.clone(), stats.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        let authorizer = Arc::new(ChannelAuthorizer::new());
        let lifecycle = Arc::new(LifecycleSupervisor::new(config.shutdown_deadline_seconds));

        let token_verifier = match &config.auth.secret {
            Some(secret) => Some(Arc::new(TokenVerifier::new(
                secret,
                &config.auth.algorithm,
                config.auth.leeway_seconds,
            )?)),
            None => None,
        };

        for name in &config.channels.preconfigured {
            let channel = courier_common::types::ChannelName::parse(name)?;
            registry.ensure_channel(&channel, false);
        }

        Ok(Self {
            state: AppState {
                config: Arc::new(config),
                registry,
                broadcast,
                stats,
                rate_limiter,
                authorizer,
                token_verifier,
                lifecycle,
            },
        })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/publish", post(crate::routes::publish::publish))
            .route("/publish/:channel", post(crate::routes::publish::publish_legacy))
            .route("/health", get(crate::routes::health::health))
            .route("/stats", get(crate::routes::stats::stats))
            .route("/subscribe/:channel", get(crate::routes::subscribe::subscribe))
            .merge(crate::openapi::docs_router())
            .layer(axum::middleware::from_fn(crate::middleware::logging::logging_middleware))
            .layer(get_tracing_layer())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Courier listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(self.state.lifecycle.clone()))
            .await?;
        Ok(())
    }
}

async fn shutdown_signal(lifecycle: Arc<LifecycleSupervisor>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining");
    lifecycle.begin_shutdown();
    tokio::time::sleep(lifecycle.shutdown_deadline()).await;
}
