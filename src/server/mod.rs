// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP SERVER - API de recomendação de otimizações
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//!
//! Servidor HTTP fino sobre o [`QueryService`].
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (versão + tamanho do corpus)
//! - `GET /patterns` - Lista o corpus carregado
//! - `POST /query` - Recomendações para uma query
//! - `POST /reload` - Recarrega o corpus da fonte configurada
//!
//! ## Uso
//!
//! ```bash
//! cargo run --features server -- --server --port 3000
//! ```

#[allow(missing_docs)]
pub mod handlers;
#[allow(missing_docs)]
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

pub use types::*;

use crate::config::EngineConfig;
use crate::corpus::CorpusSource;
use crate::registry::SnapshotHandle;
use crate::service::QueryService;

/// Estado compartilhado entre todos os handlers
pub struct AppState {
    /// Serviço de queries sobre o snapshot corrente
    pub service: QueryService,
    /// Fonte de corpus usada no boot (e reusada pelo /reload)
    pub source: Box<dyn CorpusSource>,
}

/// Inicia o servidor HTTP na porta especificada.
///
/// Entry point chamado de main.rs quando `--server` é passado.
pub async fn start_server(
    handle: Arc<SnapshotHandle>,
    source: Box<dyn CorpusSource>,
    config: EngineConfig,
    port: u16,
) -> anyhow::Result<()> {
    use axum::{
        routing::{get, post},
        Router,
    };
    use tower_http::cors::CorsLayer;

    let service = QueryService::new(handle, config.threshold, config.top_k, config.deadline());
    let state = Arc::new(AppState { service, source });

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/patterns", get(handlers::list_patterns))
        .route("/query", post(handlers::query))
        .route("/reload", post(handlers::reload))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("TurboKit server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
