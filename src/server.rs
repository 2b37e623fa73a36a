//! Process-scoped application context and the HTTP server.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{self, TokenIssuer};
use crate::config::Config;
use crate::ledger::{Ledger, ShopPolicy};
use crate::llm::{GenerationError, LLMClient, TextGenerator};
use crate::metrics::Metrics;
use crate::repository::{MemoryUserRepository, UserRepository};
use crate::routes;
use crate::tutor::Tutor;

/// Everything a handler needs, built once at startup.
pub struct AppContext {
    pub config: Config,
    pub ledger: Ledger,
    pub tokens: TokenIssuer,
    pub tutor: Tutor,
    pub metrics: Mutex<Metrics>,
    pub start_time: Instant,
}

impl AppContext {
    /// Wire up the context from explicit collaborators.
    pub fn new(
        config: Config,
        repo: Arc<dyn UserRepository>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let secret = if config.auth.jwt_secret.is_empty() {
            warn!("no jwt_secret configured, generating a random one for this process");
            auth::random_secret()
        } else {
            config.auth.jwt_secret.clone()
        };

        Self {
            ledger: Ledger::new(repo, ShopPolicy::from(&config.shop)),
            tokens: TokenIssuer::new(secret.as_bytes(), config.auth.token_ttl_secs),
            tutor: Tutor::new(generator),
            metrics: Mutex::new(Metrics::new()),
            start_time: Instant::now(),
            config,
        }
    }

    /// Production wiring: in-memory ledger and the HTTP generation client.
    pub fn from_config(config: Config) -> Result<Self, GenerationError> {
        if config.llm.api_key.is_empty() {
            warn!("LLM api_key is empty, /explain and /generate-problem will fail upstream");
        }
        let generator = Arc::new(LLMClient::new(&config.llm)?);
        Ok(Self::new(
            config,
            Arc::new(MemoryUserRepository::new()),
            generator,
        ))
    }

    /// Apply `f` to the metrics. A poisoned lock is skipped; counters are best effort.
    pub fn with_metrics(&self, f: impl FnOnce(&mut Metrics)) {
        if let Ok(mut metrics) = self.metrics.lock() {
            f(&mut metrics);
        }
    }

    pub fn metrics_snapshot(&self) -> Metrics {
        let mut snapshot = self
            .metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default();
        snapshot.uptime_sec = self.start_time.elapsed().as_secs();
        snapshot
    }
}

/// Full application router with tracing and permissive CORS for the browser client.
pub fn app(ctx: Arc<AppContext>) -> Router {
    routes::router()
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the HTTP server until the process is stopped.
pub async fn run(ctx: AppContext) -> std::io::Result<()> {
    let addr = ctx.config.server.bind.clone();
    let app = app(Arc::new(ctx));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "homework helper backend listening");

    axum::serve(listener, app).await
}
