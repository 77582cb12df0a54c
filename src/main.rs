// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TURBOKIT CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// CLI do engine de recomendação de otimizações.
//
// Uso:
//   turbokit-cli "my list lookup is slow"
//   turbokit-cli --code "if x in big_list: pass" "slow membership check"
//   turbokit-cli --patterns            (lista o corpus carregado)
//   turbokit-cli --server              (sobe o servidor HTTP; feature `server`)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::PathBuf;
use std::sync::Arc;

use turbokit::corpus::{self, CorpusSource, EmbeddedCorpus, FileCorpus};
use turbokit::prelude::*;
use turbokit::{
    create_tokio_runtime, install_panic_hook, load_engine_config, load_runtime_config, EngineConfig,
};

/// Tenta carregar o arquivo .env de múltiplos locais possíveis
fn load_dotenv() {
    // Lista de possíveis locais para o .env
    let possible_paths = [
        // Diretório atual
        PathBuf::from(".env"),
        // Diretório pai (se executando de um subdiretório)
        PathBuf::from("../.env"),
        // Caminho absoluto em tempo de compilação (fallback)
        {
            let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            p.push(".env");
            p
        },
    ];

    for path in &possible_paths {
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => {
                    eprintln!(
                        "✓ Carregado .env de: {:?}",
                        path.canonicalize().unwrap_or(path.clone())
                    );
                    return;
                }
                Err(e) => {
                    eprintln!("⚠ Erro ao carregar {:?}: {}", path, e);
                }
            }
        }
    }

    // Sem .env é um estado normal: toda configuração tem default embutido
    let _ = dotenvy::dotenv();
}

struct CliArgs {
    query: Option<String>,
    code: Option<String>,
    list_patterns: bool,
    #[cfg(feature = "server")]
    server: bool,
    #[cfg(feature = "server")]
    port: u16,
}

fn usage(program: &str) -> ! {
    eprintln!("TurboKit CLI v{}", turbokit::VERSION);
    eprintln!();
    eprintln!("Uso: {} [opções] <descrição do problema>", program);
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --code <trecho>       Trecho de código junto da descrição");
    eprintln!("  --corpus <arquivo>    Corpus JSON alternativo (default: embutido)");
    eprintln!("  --top-k <n>           Máximo de recomendações (padrão: 5)");
    eprintln!("  --threshold <x>       Confiança mínima em [0,1] (padrão: 0.15)");
    eprintln!("  --patterns            Lista os padrões do corpus e sai");
    #[cfg(feature = "server")]
    {
        eprintln!("  --server              Sobe o servidor HTTP");
        eprintln!("  --port <n>            Porta do servidor (padrão: 3000)");
    }
    eprintln!();
    eprintln!("Exemplos:");
    eprintln!("  {} \"list lookup is slow\"", program);
    eprintln!(
        "  {} --code \"if x in big_list: pass\" \"slow membership\"",
        program
    );
    eprintln!("  {} \"記憶化 快取 遞迴\"", program);
    std::process::exit(1);
}

/// Parse manual dos argumentos; flags desconhecidas abortam com usage
fn parse_args(config: &mut EngineConfig) -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let program = args[0].clone();

    let mut parsed = CliArgs {
        query: None,
        code: None,
        list_patterns: false,
        #[cfg(feature = "server")]
        server: false,
        #[cfg(feature = "server")]
        port: 3000,
    };

    let mut free: Vec<String> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--code" => {
                i += 1;
                parsed.code = Some(args.get(i).cloned().unwrap_or_else(|| usage(&program)));
            }
            "--corpus" => {
                i += 1;
                let path = args.get(i).cloned().unwrap_or_else(|| usage(&program));
                config.corpus_path = Some(PathBuf::from(path));
            }
            "--top-k" => {
                i += 1;
                let raw = args.get(i).cloned().unwrap_or_else(|| usage(&program));
                match raw.parse::<usize>() {
                    Ok(n) if n > 0 => config.top_k = n,
                    _ => usage(&program),
                }
            }
            "--threshold" => {
                i += 1;
                let raw = args.get(i).cloned().unwrap_or_else(|| usage(&program));
                match raw.parse::<f64>() {
                    Ok(t) if (0.0..=1.0).contains(&t) => config.threshold = t,
                    _ => usage(&program),
                }
            }
            "--patterns" => parsed.list_patterns = true,
            #[cfg(feature = "server")]
            "--server" => parsed.server = true,
            #[cfg(feature = "server")]
            "--port" => {
                i += 1;
                let raw = args.get(i).cloned().unwrap_or_else(|| usage(&program));
                match raw.parse::<u16>() {
                    Ok(p) => parsed.port = p,
                    _ => usage(&program),
                }
            }
            other if other.starts_with("--") => usage(&program),
            other => free.push(other.to_string()),
        }
        i += 1;
    }

    if !free.is_empty() {
        parsed.query = Some(free.join(" "));
    }

    #[cfg(feature = "server")]
    let needs_query = !parsed.list_patterns && !parsed.server;
    #[cfg(not(feature = "server"))]
    let needs_query = !parsed.list_patterns;

    if needs_query && parsed.query.is_none() && parsed.code.is_none() {
        usage(&program);
    }

    parsed
}

fn corpus_source(config: &EngineConfig) -> Box<dyn CorpusSource> {
    match &config.corpus_path {
        Some(path) => Box::new(FileCorpus::new(path)),
        None => Box::new(EmbeddedCorpus),
    }
}

fn main() -> anyhow::Result<()> {
    // Carregar .env PRIMEIRO, antes de qualquer coisa
    load_dotenv();

    // Inicializar logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    install_panic_hook();

    let runtime_config = load_runtime_config();
    let mut engine_config = load_engine_config();
    let args = parse_args(&mut engine_config);

    let runtime = create_tokio_runtime(&runtime_config)?;
    runtime.block_on(run(engine_config, args))
}

async fn run(config: EngineConfig, args: CliArgs) -> anyhow::Result<()> {
    let source = corpus_source(&config);
    let snapshot = corpus::load_snapshot(source.as_ref()).await?;

    if args.list_patterns {
        print_patterns(&snapshot);
        return Ok(());
    }

    #[cfg(feature = "server")]
    if args.server {
        let handle = Arc::new(SnapshotHandle::new(snapshot));
        return turbokit::server::start_server(handle, source, config, args.port).await;
    }

    let query = match args.code {
        Some(code) => Query::with_code(args.query.as_deref().unwrap_or(""), &code),
        None => Query::from_text(args.query.as_deref().unwrap_or("")),
    };

    let handle = Arc::new(SnapshotHandle::new(snapshot));
    let service = QueryService::new(handle, config.threshold, config.top_k, config.deadline());
    let response = service.respond(&query)?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" TURBOKIT v{}", turbokit::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Query: {}", query.text);
    if let Some(code) = &query.code_excerpt {
        println!("Código: {}", code);
    }
    println!();

    if response.recommendations.is_empty() {
        println!("✗ Nenhum padrão de otimização casou com a query.");
    } else {
        for (i, rec) in response.recommendations.iter().enumerate() {
            println!(
                "{}. {} [{}] — confiança {:.2}",
                i + 1,
                rec.title,
                rec.level,
                rec.confidence
            );
            println!(
                "   {} → {}  ({}x speedup medido)",
                rec.complexity_before, rec.complexity_after, rec.speedup_factor
            );
            println!("   {}", rec.rationale);
            if !rec.caveats.is_empty() {
                println!("   ⚠ {}", rec.caveats.join("; "));
            }
            println!();
        }
    }

    if !response.suggestions.is_empty() {
        println!("Sugestões:");
        for suggestion in &response.suggestions {
            println!("  - {}", suggestion);
        }
        println!();
    }

    Ok(())
}

fn print_patterns(snapshot: &RegistrySnapshot) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" CORPUS: {} padrões", snapshot.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    for pattern in snapshot.patterns() {
        println!(
            "  {:<28} [{:>2}] {:>8.1}x  {} → {}",
            pattern.id,
            pattern.level,
            pattern.speedup_factor,
            pattern.complexity_before,
            pattern.complexity_after
        );
    }
    println!();
}
