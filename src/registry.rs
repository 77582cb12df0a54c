// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// REGISTRY DE PADRÕES - SNAPSHOT IMUTÁVEL + ÍNDICE INVERTIDO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// O corpus é validado e indexado uma única vez em `RegistrySnapshot::build`.
// Depois disso o snapshot nunca muda: leitores concorrentes não precisam de
// lock. Reload de corpus é copy-on-write: constrói-se um snapshot novo fora
// do hot path e troca-se a referência no `SnapshotHandle`; requisições em
// voo continuam com o snapshot antigo até terminarem.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::tokenizer::{TokenStream, Tokenizer};
use crate::types::Pattern;

/// Erros de construção do registry
///
/// Qualquer violação aborta o load inteiro (fail-fast): nunca servimos um
/// registry parcialmente válido.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Dois padrões com o mesmo id
    #[error("duplicate pattern id: {0}")]
    DuplicateId(String),

    /// Padrão com lista de keywords vazia
    #[error("pattern {0} has no keywords")]
    EmptyKeywords(String),

    /// `speedup_factor` zero, negativo ou NaN
    #[error("pattern {0} has non-positive speedup_factor {1}")]
    InvalidSpeedup(String, f64),

    /// Falha de leitura da fonte do corpus
    #[error("corpus I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON do corpus malformado
    #[error("corpus parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Assinatura pré-tokenizada de uma keyword
///
/// Calculada no build para que o scorer não re-tokenize keywords a cada
/// query. `atoms` são os tokens atômicos da keyword (palavras latinas ou
/// ideogramas); a keyword é considerada encontrada quando todos os atoms
/// estão presentes no token set da query.
#[derive(Debug, Clone)]
pub struct KeywordSig {
    /// Keyword original, como escrita no corpus
    pub raw: String,
    /// Tokens atômicos em ordem
    pub atoms: Vec<String>,
}

impl KeywordSig {
    /// True quando todos os atoms aparecem no token set da query
    pub fn matches(&self, query: &TokenStream) -> bool {
        !self.atoms.is_empty() && self.atoms.iter().all(|a| query.contains(a))
    }

    /// True para keywords com mais de um token atômico (frase)
    pub fn is_phrase(&self) -> bool {
        self.atoms.len() > 1
    }
}

/// Snapshot imutável do corpus indexado
///
/// Construído uma vez, servido para muitas queries. Todos os acessos são
/// read-only; o tipo não expõe nenhuma mutação após `build`.
#[derive(Debug)]
pub struct RegistrySnapshot {
    patterns: Vec<Pattern>,
    by_id: HashMap<String, usize>,
    /// Índice invertido: token normalizado → índices de padrões (ordenados)
    index: HashMap<String, Vec<usize>>,
    /// Assinaturas de keywords, paralelas a `patterns`
    signatures: Vec<Vec<KeywordSig>>,
    tokenizer: Tokenizer,
    built_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    /// Valida o corpus e constrói o índice invertido
    ///
    /// Validações (qualquer falha aborta o load inteiro):
    /// - ids únicos
    /// - toda keyword list não-vazia
    /// - `speedup_factor > 0` (NaN também é rejeitado)
    ///
    /// Cada keyword é tokenizada exatamente como texto de query; todos os
    /// tokens resultantes (inclusive n-grams CJK) apontam para o padrão.
    pub fn build(patterns: Vec<Pattern>) -> Result<Self, RegistryError> {
        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(patterns.len());
        for (i, p) in patterns.iter().enumerate() {
            if by_id.insert(p.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateId(p.id.clone()));
            }
            if p.keywords.is_empty() {
                return Err(RegistryError::EmptyKeywords(p.id.clone()));
            }
            if !(p.speedup_factor > 0.0) {
                return Err(RegistryError::InvalidSpeedup(p.id.clone(), p.speedup_factor));
            }
        }

        // Tokenizer compartilhado: frases CJK do corpus inteiro
        let tokenizer = Tokenizer::with_phrases(patterns.iter().flat_map(|p| p.keywords.iter()));

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut signatures: Vec<Vec<KeywordSig>> = Vec::with_capacity(patterns.len());

        for (i, p) in patterns.iter().enumerate() {
            let mut sigs = Vec::with_capacity(p.keywords.len());
            for keyword in &p.keywords {
                let stream = tokenizer.tokenize(keyword, None);
                if stream.is_empty() {
                    // keyword sem tokens (só pontuação) nunca casaria nada
                    log::warn!(
                        "⚠ keyword {:?} do padrão '{}' não produz tokens, ignorada no índice",
                        keyword,
                        p.id
                    );
                    continue;
                }
                for token in stream.iter() {
                    let postings = index.entry(token.to_string()).or_default();
                    if postings.last() != Some(&i) {
                        postings.push(i);
                    }
                }
                sigs.push(KeywordSig {
                    raw: keyword.clone(),
                    atoms: stream.sequence().to_vec(),
                });
            }
            signatures.push(sigs);
        }

        log::info!(
            "📚 registry construído: {} padrões, {} tokens indexados",
            patterns.len(),
            index.len()
        );

        Ok(Self {
            patterns,
            by_id,
            index,
            signatures,
            tokenizer,
            built_at: Utc::now(),
        })
    }

    /// Tokenizer phrase-aware deste snapshot
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// União dos postings de todos os tokens presentes no índice
    ///
    /// Tokens desconhecidos não contribuem (não é erro). O resultado é um
    /// set ordenado de índices, então a iteração é determinística.
    pub fn candidates(&self, tokens: &TokenStream) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for token in tokens.iter() {
            if let Some(postings) = self.index.get(token) {
                out.extend(postings.iter().copied());
            }
        }
        out
    }

    /// Busca padrão por id
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.by_id.get(id).map(|&i| &self.patterns[i])
    }

    /// Padrão por índice interno (como devolvido por `candidates`)
    pub fn pattern_at(&self, idx: usize) -> &Pattern {
        &self.patterns[idx]
    }

    /// Assinaturas de keywords do padrão no índice dado
    pub fn signatures_at(&self, idx: usize) -> &[KeywordSig] {
        &self.signatures[idx]
    }

    /// Todos os padrões, na ordem do corpus
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Número de padrões
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True se o corpus é vazio
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Número de tokens distintos no índice invertido
    pub fn indexed_tokens(&self) -> usize {
        self.index.len()
    }

    /// Instante de construção do snapshot
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Handle compartilhado para o snapshot corrente
///
/// Leitura frequente, escrita rara: `current()` clona um `Arc` sob read
/// lock; `swap()` troca a referência sob write lock. Requisições que já
/// obtiveram o `Arc` seguem usando o snapshot antigo — nenhuma requisição
/// observa um índice meio-construído.
pub struct SnapshotHandle {
    inner: RwLock<Arc<RegistrySnapshot>>,
}

impl SnapshotHandle {
    /// Cria o handle com o snapshot inicial
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Snapshot corrente (barato: clona o Arc)
    pub fn current(&self) -> Arc<RegistrySnapshot> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            // lock envenenado: o dado é imutável, o Arc continua íntegro
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Troca atômica para um snapshot novo (copy-on-write)
    pub fn swap(&self, snapshot: RegistrySnapshot) {
        let fresh = Arc::new(snapshot);
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        log::info!(
            "🔄 snapshot trocado: {} padrões (construído em {})",
            fresh.len(),
            fresh.built_at()
        );
        *guard = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(id: &str, keywords: &[&str], speedup: f64) -> Pattern {
        Pattern {
            id: id.into(),
            title: id.into(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            complexity_before: "O(n)".into(),
            complexity_after: "O(1)".into(),
            speedup_factor: speedup,
            level: "B".into(),
            applicability_notes: String::new(),
            caveats: vec![],
            code_template_before: String::new(),
            code_template_after: String::new(),
        }
    }

    #[test]
    fn test_build_ok() {
        let snap = RegistrySnapshot::build(vec![
            pattern("a", &["list", "lookup"], 2.0),
            pattern("b", &["cache"], 3.0),
        ])
        .unwrap();

        assert_eq!(snap.len(), 2);
        assert!(snap.get("a").is_some());
        assert!(snap.get("missing").is_none());
        assert!(snap.indexed_tokens() >= 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = RegistrySnapshot::build(vec![
            pattern("x", &["a"], 1.0),
            pattern("x", &["b"], 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "x"));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let err = RegistrySnapshot::build(vec![pattern("x", &[], 1.0)]).unwrap_err();
        assert!(matches!(err, RegistryError::EmptyKeywords(id) if id == "x"));
    }

    #[test]
    fn test_invalid_speedup_rejected() {
        let err = RegistrySnapshot::build(vec![pattern("x", &["a"], 0.0)]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSpeedup(id, _) if id == "x"));

        let err = RegistrySnapshot::build(vec![pattern("y", &["a"], f64::NAN)]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSpeedup(id, _) if id == "y"));
    }

    #[test]
    fn test_candidates_union() {
        let snap = RegistrySnapshot::build(vec![
            pattern("a", &["list", "lookup"], 2.0),
            pattern("b", &["loop", "lookup"], 3.0),
            pattern("c", &["cache"], 4.0),
        ])
        .unwrap();

        let stream = snap.tokenizer().tokenize("lookup", None);
        let cands = snap.candidates(&stream);
        assert_eq!(cands.into_iter().collect::<Vec<_>>(), vec![0, 1]);

        // token desconhecido não contribui nem falha
        let stream = snap.tokenizer().tokenize("quantum teleportation", None);
        assert!(snap.candidates(&stream).is_empty());
    }

    #[test]
    fn test_multiword_keyword_indexed_by_parts() {
        let snap =
            RegistrySnapshot::build(vec![pattern("a", &["list lookup"], 2.0)]).unwrap();
        let stream = snap.tokenizer().tokenize("lookup", None);
        assert_eq!(snap.candidates(&stream).len(), 1);
    }

    #[test]
    fn test_cjk_keyword_shares_ngrams() {
        let snap = RegistrySnapshot::build(vec![pattern("m", &["記憶化快取"], 2.0)]).unwrap();
        // query com só metade da frase ainda alcança o padrão via n-gram
        let stream = snap.tokenizer().tokenize("快取", None);
        assert_eq!(snap.candidates(&stream).len(), 1);
    }

    #[test]
    fn test_signature_matching() {
        let snap = RegistrySnapshot::build(vec![pattern(
            "m",
            &["list lookup", "cache", "記憶化快取"],
            2.0,
        )])
        .unwrap();
        let sigs = snap.signatures_at(0);
        assert_eq!(sigs.len(), 3);
        assert!(sigs[0].is_phrase());
        assert!(!sigs[1].is_phrase());
        assert!(sigs[2].is_phrase()); // 5 ideogramas

        let q = snap.tokenizer().tokenize("list lookup cache", None);
        assert!(sigs[0].matches(&q));
        assert!(sigs[1].matches(&q));
        assert!(!sigs[2].matches(&q));
    }

    #[test]
    fn test_snapshot_is_debuggable() {
        // snapshots aparecem em asserts e logs de teste; Debug precisa valer
        // para o tipo inteiro
        let snap = RegistrySnapshot::build(vec![pattern("a", &["list"], 2.0)]).unwrap();
        let dump = format!("{:?}", snap);
        assert!(dump.contains("list"));
    }

    #[test]
    fn test_snapshot_handle_swap() {
        let handle = SnapshotHandle::new(
            RegistrySnapshot::build(vec![pattern("a", &["list"], 2.0)]).unwrap(),
        );
        let before = handle.current();
        assert_eq!(before.len(), 1);

        handle.swap(
            RegistrySnapshot::build(vec![
                pattern("a", &["list"], 2.0),
                pattern("b", &["cache"], 3.0),
            ])
            .unwrap(),
        );

        // requisição em voo mantém o snapshot antigo
        assert_eq!(before.len(), 1);
        assert_eq!(handle.current().len(), 2);
    }
}
