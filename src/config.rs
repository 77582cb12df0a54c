// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO RUNTIME E DO ENGINE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Configurações para o runtime Tokio e para o engine de matching.
// Todas as configurações podem ser definidas via .env
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::PathBuf;
use std::time::Duration;

use crate::ranking::{DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use crate::service::HandleOptions;

/// Configuração do runtime Tokio.
///
/// Controla número de threads e comportamento do async runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Número de worker threads do Tokio.
    /// Se None, usa cálculo dinâmico: min(cpu_cores, max_threads).
    pub worker_threads: Option<usize>,

    /// Número máximo de threads (limite superior para cálculo dinâmico).
    /// Padrão: 16
    pub max_threads: usize,

    /// Número máximo de blocking threads.
    /// Padrão: 512 (padrão do Tokio)
    pub max_blocking_threads: usize,

    /// Nome da thread principal.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None, // Dinâmico
            max_threads: 16,
            max_blocking_threads: 512,
            thread_name: "turbokit".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Cria configuração padrão.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calcula número efetivo de worker threads.
    ///
    /// Se `worker_threads` está definido, usa esse valor.
    /// Senão, calcula: min(cpu_cores, max_threads)
    pub fn effective_worker_threads(&self) -> usize {
        if let Some(threads) = self.worker_threads {
            threads
        } else {
            let cpu_cores = num_cpus::get();
            std::cmp::min(cpu_cores, self.max_threads)
        }
    }
}

/// Carrega configuração do runtime a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `TK_THREADS`: Número fixo de threads (opcional)
/// - `TK_MAX_THREADS`: Máximo de threads para cálculo dinâmico (padrão: 16)
/// - `TK_MAX_BLOCKING`: Máximo de blocking threads (padrão: 512)
pub fn load_runtime_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();

    // TK_THREADS: número fixo de threads
    if let Ok(threads_str) = std::env::var("TK_THREADS") {
        if let Ok(threads) = threads_str.parse::<usize>() {
            if threads > 0 {
                config.worker_threads = Some(threads);
                log::info!("📦 TK_THREADS={} (fixo)", threads);
            }
        }
    }

    // TK_MAX_THREADS: limite superior para cálculo dinâmico
    if let Ok(max_str) = std::env::var("TK_MAX_THREADS") {
        if let Ok(max) = max_str.parse::<usize>() {
            if max > 0 {
                config.max_threads = max;
                log::info!("📦 TK_MAX_THREADS={}", max);
            }
        }
    }

    // TK_MAX_BLOCKING: máximo de blocking threads
    if let Ok(blocking_str) = std::env::var("TK_MAX_BLOCKING") {
        if let Ok(blocking) = blocking_str.parse::<usize>() {
            if blocking > 0 {
                config.max_blocking_threads = blocking;
                log::info!("📦 TK_MAX_BLOCKING={}", blocking);
            }
        }
    }

    config
}

/// Configuração do engine de matching.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Confiança mínima para um match entrar no ranking.
    pub threshold: f64,

    /// Máximo de recomendações por query.
    pub top_k: usize,

    /// Deadline default por query, em milissegundos. 0 desliga.
    pub deadline_ms: u64,

    /// Caminho do corpus em disco; None usa o corpus embutido.
    pub corpus_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            deadline_ms: 250,
            corpus_path: None,
        }
    }
}

impl EngineConfig {
    /// Opções para uma chamada de `handle`, com a deadline ancorada em agora.
    ///
    /// Chamar uma vez por requisição: o `Instant` resultante vale para essa
    /// chamada, não para o processo.
    pub fn handle_options(&self) -> HandleOptions {
        HandleOptions {
            threshold: self.threshold,
            top_k: self.top_k,
            deadline: self.deadline().map(|d| std::time::Instant::now() + d),
        }
    }

    /// Deadline como `Duration`, se habilitada.
    pub fn deadline(&self) -> Option<Duration> {
        if self.deadline_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.deadline_ms))
        }
    }
}

/// Carrega configuração do engine a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `TK_THRESHOLD`: Confiança mínima em [0,1] (padrão: 0.15)
/// - `TK_TOP_K`: Máximo de recomendações (padrão: 5)
/// - `TK_DEADLINE_MS`: Deadline por query em ms, 0 desliga (padrão: 250)
/// - `TK_CORPUS`: Caminho do corpus JSON (padrão: corpus embutido)
pub fn load_engine_config() -> EngineConfig {
    let mut config = EngineConfig::default();

    if let Ok(threshold_str) = std::env::var("TK_THRESHOLD") {
        if let Ok(threshold) = threshold_str.parse::<f64>() {
            if (0.0..=1.0).contains(&threshold) {
                config.threshold = threshold;
                log::info!("📦 TK_THRESHOLD={}", threshold);
            } else {
                log::warn!("⚠ TK_THRESHOLD={} fora de [0,1], usando default", threshold);
            }
        }
    }

    if let Ok(top_k_str) = std::env::var("TK_TOP_K") {
        if let Ok(top_k) = top_k_str.parse::<usize>() {
            if top_k > 0 {
                config.top_k = top_k;
                log::info!("📦 TK_TOP_K={}", top_k);
            }
        }
    }

    if let Ok(deadline_str) = std::env::var("TK_DEADLINE_MS") {
        if let Ok(deadline_ms) = deadline_str.parse::<u64>() {
            config.deadline_ms = deadline_ms;
            log::info!("📦 TK_DEADLINE_MS={}", deadline_ms);
        }
    }

    if let Ok(path) = std::env::var("TK_CORPUS") {
        if !path.trim().is_empty() {
            config.corpus_path = Some(PathBuf::from(path.trim()));
            log::info!("📦 TK_CORPUS={:?}", config.corpus_path);
        }
    }

    config
}

/// Instala panic hook customizado que não envenena outras threads.
///
/// Loga o panic com informações da thread e deixa o runtime Tokio capturar
/// o JoinError da task, em vez de abortar o processo inteiro.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed").to_string();

        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        log::error!("[PANIC] Thread {} at {}: {}", thread_name, location, message);

        let _ = &original_hook; // mantém o hook original vivo sem invocá-lo
    }));
}

/// Cria o runtime Tokio com configuração customizada.
///
/// Deve ser chamada no início do programa, antes de qualquer código async.
pub fn create_tokio_runtime(config: &RuntimeConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let worker_threads = config.effective_worker_threads();

    log::info!(
        "🚀 Criando runtime Tokio: {} workers, {} blocking max",
        worker_threads,
        config.max_blocking_threads
    );

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(&config.thread_name)
        .enable_all()
        .build()
}
