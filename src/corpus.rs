// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FONTES DE CORPUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para obter o corpus de padrões. I/O acontece só
// aqui, na borda: o pipeline de matching em si é CPU-bound e nunca bloqueia.
// Um corpus malformado aborta o load inteiro — nunca servimos
// recomendações silenciosamente degradadas.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::registry::{RegistryError, RegistrySnapshot};
use crate::types::Pattern;

/// Corpus default, recuperado das tabelas de benchmark do TurboCode Kit
/// (14 padrões, keywords em inglês e chinês tradicional)
pub const DEFAULT_CORPUS_JSON: &str = include_str!("../data/patterns.json");

/// Fonte de corpus
///
/// A camada de transporte escolhe a fonte (arquivo, embutido); o engine só
/// enxerga a lista de padrões resultante.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Descrição legível para logs
    fn describe(&self) -> String;

    /// Lê e decodifica a lista de padrões (sem validar o conteúdo;
    /// validação é papel do build do registry)
    async fn fetch(&self) -> Result<Vec<Pattern>, RegistryError>;
}

/// Corpus embutido no binário
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCorpus;

#[async_trait]
impl CorpusSource for EmbeddedCorpus {
    fn describe(&self) -> String {
        "embedded corpus (data/patterns.json)".to_string()
    }

    async fn fetch(&self) -> Result<Vec<Pattern>, RegistryError> {
        parse_corpus(DEFAULT_CORPUS_JSON)
    }
}

/// Corpus em arquivo JSON no disco
#[derive(Debug, Clone)]
pub struct FileCorpus {
    path: PathBuf,
}

impl FileCorpus {
    /// Fonte apontando para o arquivo dado
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CorpusSource for FileCorpus {
    fn describe(&self) -> String {
        format!("corpus file {:?}", self.path)
    }

    async fn fetch(&self) -> Result<Vec<Pattern>, RegistryError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        parse_corpus(&content)
    }
}

/// Decodifica um corpus JSON (array de padrões)
pub fn parse_corpus(json: &str) -> Result<Vec<Pattern>, RegistryError> {
    let patterns: Vec<Pattern> = serde_json::from_str(json)?;
    Ok(patterns)
}

/// Load completo: fetch da fonte + validação + índice
///
/// Único lugar onde mutação de dados do corpus é legal; o snapshot
/// devolvido é imutável dali em diante.
pub async fn load_snapshot(source: &dyn CorpusSource) -> Result<RegistrySnapshot, RegistryError> {
    log::info!("📥 carregando {}", source.describe());
    let patterns = source.fetch().await?;
    let snapshot = RegistrySnapshot::build(patterns)?;
    log::info!(
        "✓ corpus carregado: {} padrões, {} tokens",
        snapshot.len(),
        snapshot.indexed_tokens()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fonte mock para testes (estilo MockSearchClient)
    struct MockCorpusSource {
        json: &'static str,
    }

    #[async_trait]
    impl CorpusSource for MockCorpusSource {
        fn describe(&self) -> String {
            "mock corpus".to_string()
        }

        async fn fetch(&self) -> Result<Vec<Pattern>, RegistryError> {
            parse_corpus(self.json)
        }
    }

    #[tokio::test]
    async fn test_embedded_corpus_loads() {
        let snapshot = load_snapshot(&EmbeddedCorpus).await.unwrap();
        assert_eq!(snapshot.len(), 14);
        assert!(snapshot.get("list_lookup").is_some());
        assert!(snapshot.get("memoization_cache").is_some());
        // ~128 keywords indexadas geram bem mais tokens (n-grams CJK)
        assert!(snapshot.indexed_tokens() > 100);
    }

    #[tokio::test]
    async fn test_embedded_corpus_speedups_positive() {
        let patterns = EmbeddedCorpus.fetch().await.unwrap();
        assert!(patterns.iter().all(|p| p.speedup_factor > 0.0));
        assert!(patterns.iter().all(|p| !p.keywords.is_empty()));
    }

    #[tokio::test]
    async fn test_mock_source_duplicate_id_fails_load() {
        let source = MockCorpusSource {
            json: r#"[
                {"id": "x", "title": "X", "keywords": ["a"],
                 "complexity_before": "O(n)", "complexity_after": "O(1)",
                 "speedup_factor": 2.0},
                {"id": "x", "title": "X2", "keywords": ["b"],
                 "complexity_before": "O(n)", "complexity_after": "O(1)",
                 "speedup_factor": 3.0}
            ]"#,
        };
        let err = load_snapshot(&source).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "x"));
    }

    #[tokio::test]
    async fn test_malformed_json_fails_load() {
        let source = MockCorpusSource { json: "not json" };
        let err = load_snapshot(&source).await.unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_fails_load() {
        let source = FileCorpus::new("/nonexistent/patterns.json");
        let err = load_snapshot(&source).await.unwrap_err();
        assert!(matches!(err, RegistryError::Io(_)));
    }
}
