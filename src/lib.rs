//! # TurboKit - Engine de Recomendação de Otimizações
//!
//! Este crate implementa o engine **TurboKit** em Rust: dado um texto livre
//! ou trecho de código descrevendo um problema de performance, devolve uma
//! lista ranqueada de padrões de otimização conhecidos (cada um com speedup
//! medido, transição de classe de complexidade e template de código) para um
//! assistente externo aplicar.
//!
//! ## Arquitetura Principal
//!
//! O pipeline tem 5 estágios, todos determinísticos:
//!
//! ### 1. Tokenizer (`tokenizer`)
//! Texto cru (scripts mistos, código) → tokens normalizados:
//! - palavras latinas minúsculas, `_` e `.` preservados em identificadores
//! - ideogramas CJK individuais + n-grams deslizantes (2..4)
//! - frases técnicas do corpus retidas verbatim (ex: "記憶化快取")
//!
//! ### 2. Registry (`registry`)
//! Corpus validado e indexado uma vez num [`RegistrySnapshot`] imutável;
//! índice invertido token → padrões. Reload é copy-on-write com troca
//! atômica via [`SnapshotHandle`] — leitores nunca veem índice parcial.
//!
//! ### 3. Scorer (`scorer`)
//! Blend harmônico de cobertura/precisão com bônus de frase exata,
//! monotônico por construção.
//!
//! ### 4. Ranking (`ranking`)
//! Threshold, ordem total (confiança, speedup, id), top-k, rationale.
//!
//! ### 5. QueryService (`service`)
//! Orquestra tudo em uma chamada pura de `(snapshot, query)`, com deadline
//! e variante batch paralela.
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use turbokit::prelude::*;
//!
//! let snapshot = turbokit::corpus::load_snapshot(&EmbeddedCorpus).await?;
//! let results = turbokit::service::handle(
//!     &snapshot,
//!     &Query::from_text("list lookup is slow"),
//!     &HandleOptions::default(),
//! )?;
//! println!("{:?}", results[0].pattern_id);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Tipos fundamentais compartilhados por todo o sistema.
///
/// - [`Pattern`]: padrão de otimização do corpus
/// - [`Query`]: requisição de recomendação
/// - [`MatchResult`]: resultado efêmero de um match
/// - [`Recommendation`] / [`QueryResponse`]: formato de transporte
pub mod types;

/// Tokenizer multi-script (latino + CJK) com retenção de frases.
pub mod tokenizer;

/// Fontes de corpus (embutido, arquivo) e load com validação fail-fast.
pub mod corpus;

/// Snapshot imutável do corpus com índice invertido e handle copy-on-write.
pub mod registry;

/// Score de cobertura/precisão com bônus de frase exata.
pub mod scorer;

/// Filtro por threshold, ordem total determinística e top-k.
pub mod ranking;

/// Orquestração do pipeline: validação, deadline, batch paralelo.
pub mod service;

/// Configuração do runtime Tokio e do engine via variáveis de ambiente.
///
/// **Runtime Tokio:**
/// - `TK_THREADS`: Número de threads do runtime (padrão: dinâmico)
/// - `TK_MAX_THREADS`: Máximo de threads (padrão: 16)
/// - `TK_MAX_BLOCKING`: Máximo de blocking threads (padrão: 512)
///
/// **Engine:**
/// - `TK_THRESHOLD`: Confiança mínima (padrão: 0.15)
/// - `TK_TOP_K`: Máximo de recomendações (padrão: 5)
/// - `TK_DEADLINE_MS`: Deadline por query em ms (padrão: 250, 0 desliga)
/// - `TK_CORPUS`: Caminho de corpus JSON (padrão: embutido)
pub mod config;

/// Servidor HTTP opcional (feature `server`): /health, /patterns, /query.
#[cfg(feature = "server")]
pub mod server;

// Re-exports principais
pub use config::{
    create_tokio_runtime, install_panic_hook, load_engine_config, load_runtime_config,
    EngineConfig, RuntimeConfig,
};
pub use corpus::{CorpusSource, EmbeddedCorpus, FileCorpus};
pub use registry::{RegistryError, RegistrySnapshot, SnapshotHandle};
pub use service::{QueryError, QueryService};
pub use types::{MatchResult, Pattern, Query, QueryResponse, Recommendation};

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// ```rust,ignore
/// use turbokit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::corpus::{CorpusSource, EmbeddedCorpus, FileCorpus};
    pub use crate::ranking::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};
    pub use crate::registry::{RegistryError, RegistrySnapshot, SnapshotHandle};
    pub use crate::service::{HandleOptions, QueryError, QueryService};
    pub use crate::tokenizer::{TokenStream, Tokenizer};
    pub use crate::types::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
