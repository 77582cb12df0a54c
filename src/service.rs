// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// QUERY SERVICE - ORQUESTRAÇÃO DO PIPELINE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Tokenizer → candidates → scorer → ranking, em uma única chamada pura de
// (snapshot, query). Nenhum estado escondido: o mesmo par (snapshot, query)
// produz resultados byte-idênticos sob qualquer carga concorrente.
//
// Deadline: checada após a validação, após a tokenização e entre cada
// candidato do scoring. Estourou → `DeadlineExceeded`, nunca um ranking
// parcial.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::ranking::{self, ScoredCandidate, DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use crate::registry::{RegistrySnapshot, SnapshotHandle};
use crate::scorer;
use crate::types::{MatchResult, Query, QueryResponse, Recommendation};

/// Erros de uma chamada de query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// `text` e `code_excerpt` ambos vazios/whitespace
    #[error("invalid query: text and code_excerpt are both empty")]
    InvalidQuery,

    /// Deadline estourada durante tokenização ou scoring
    #[error("query processing exceeded the caller-supplied deadline")]
    DeadlineExceeded,
}

/// Opções de uma chamada de `handle`
#[derive(Debug, Clone, Copy)]
pub struct HandleOptions {
    /// Confiança mínima (default 0.15)
    pub threshold: f64,
    /// Máximo de resultados (default 5)
    pub top_k: usize,
    /// Instante-limite; `None` = sem limite
    pub deadline: Option<Instant>,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            deadline: None,
        }
    }
}

impl HandleOptions {
    fn check_deadline(&self) -> Result<(), QueryError> {
        match self.deadline {
            Some(limit) if Instant::now() >= limit => Err(QueryError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Processa uma query contra um snapshot
///
/// Valida, tokeniza, coleta candidatos do índice invertido, pontua cada um
/// e ranqueia. Query válida sem nenhum match devolve lista vazia, não erro.
pub fn handle(
    snapshot: &RegistrySnapshot,
    query: &Query,
    opts: &HandleOptions,
) -> Result<Vec<MatchResult>, QueryError> {
    if query.is_blank() {
        return Err(QueryError::InvalidQuery);
    }
    opts.check_deadline()?;

    let stream = snapshot
        .tokenizer()
        .tokenize(&query.text, query.code_excerpt.as_deref());
    opts.check_deadline()?;

    if stream.is_empty() {
        // input não-vazio mas sem tokens significativos: query válida,
        // zero matches
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for idx in snapshot.candidates(&stream) {
        opts.check_deadline()?;
        let breakdown = scorer::score(&stream, snapshot.signatures_at(idx));
        if breakdown.score > 0.0 {
            let pattern = snapshot.pattern_at(idx);
            candidates.push(ScoredCandidate {
                pattern_id: pattern.id.clone(),
                speedup_factor: pattern.speedup_factor,
                score: breakdown.score,
                matched_keywords: breakdown.matched_keywords,
            });
        }
    }
    opts.check_deadline()?;

    Ok(ranking::rank(candidates, opts.threshold, opts.top_k))
}

/// Processa várias queries independentes em paralelo (rayon)
///
/// Cada query é avaliada isoladamente contra o mesmo snapshot; o resultado
/// de cada posição é idêntico ao de uma chamada individual de `handle`.
pub fn handle_batch(
    snapshot: &RegistrySnapshot,
    queries: &[Query],
    opts: &HandleOptions,
) -> Vec<Result<Vec<MatchResult>, QueryError>> {
    queries
        .par_iter()
        .map(|q| handle(snapshot, q, opts))
        .collect()
}

/// Monta a resposta de transporte: recomendações + sugestões
///
/// As sugestões são derivadas deterministicamente do ranking, no espírito
/// do servidor original.
pub fn respond(
    snapshot: &RegistrySnapshot,
    query: &Query,
    opts: &HandleOptions,
) -> Result<QueryResponse, QueryError> {
    let results = handle(snapshot, query, opts)?;

    let recommendations: Vec<Recommendation> = results
        .iter()
        .filter_map(|r| {
            snapshot
                .get(&r.pattern_id)
                .map(|p| Recommendation::from_match(r, p))
        })
        .collect();

    Ok(QueryResponse {
        request_id: uuid::Uuid::new_v4(),
        suggestions: suggestions(&recommendations),
        recommendations,
    })
}

fn suggestions(recommendations: &[Recommendation]) -> Vec<String> {
    if recommendations.is_empty() {
        return vec![
            "no matching optimization pattern found".to_string(),
            "try broader keywords such as 'list', 'loop' or 'cache'".to_string(),
        ];
    }

    let mut out = vec![format!(
        "{} optimization pattern(s) matched",
        recommendations.len()
    )];
    if recommendations.len() > 3 {
        out.push("prefer A-level patterns first".to_string());
    }
    out
}

/// Serviço de queries para a camada de transporte
///
/// Amarra um [`SnapshotHandle`] compartilhado aos limites vindos da
/// configuração. A deadline é guardada como duração e ancorada a cada
/// chamada. Cada chamada captura o snapshot corrente uma vez e segue com
/// ele até o fim — um swap concorrente não afeta a chamada em voo.
pub struct QueryService {
    handle: Arc<SnapshotHandle>,
    threshold: f64,
    top_k: usize,
    deadline: Option<std::time::Duration>,
}

impl QueryService {
    /// Cria o serviço com os limites dados
    pub fn new(
        handle: Arc<SnapshotHandle>,
        threshold: f64,
        top_k: usize,
        deadline: Option<std::time::Duration>,
    ) -> Self {
        Self {
            handle,
            threshold,
            top_k,
            deadline,
        }
    }

    /// Handle do snapshot (para reload pela camada de transporte)
    pub fn snapshot_handle(&self) -> &Arc<SnapshotHandle> {
        &self.handle
    }

    /// Opções de chamada com a deadline ancorada em agora
    pub fn options(&self) -> HandleOptions {
        HandleOptions {
            threshold: self.threshold,
            top_k: self.top_k,
            deadline: self.deadline.map(|d| Instant::now() + d),
        }
    }

    /// Resposta completa com os limites configurados
    pub fn respond(&self, query: &Query) -> Result<QueryResponse, QueryError> {
        let snapshot = self.handle.current();
        let started = Instant::now();
        let response = respond(&snapshot, query, &self.options())?;
        log::debug!(
            "🔎 query {} → {} recomendações em {:?}",
            response.request_id,
            response.recommendations.len(),
            started.elapsed()
        );
        Ok(response)
    }

    /// Snapshot corrente (ex: para listar padrões)
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.handle.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pattern;
    use std::time::Duration;

    fn pattern(id: &str, keywords: &[&str], speedup: f64) -> Pattern {
        Pattern {
            id: id.into(),
            title: id.into(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            complexity_before: "O(n)".into(),
            complexity_after: "O(1)".into(),
            speedup_factor: speedup,
            level: "A".into(),
            applicability_notes: String::new(),
            caveats: vec![],
            code_template_before: String::new(),
            code_template_after: String::new(),
        }
    }

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot::build(vec![
            pattern("list_lookup", &["list", "lookup", "in", "search"], 524.8),
            pattern("memoization_cache", &["記憶化快取", "遞迴", "cache"], 2803.3),
            pattern("deque_operations", &["deque", "queue", "pop"], 140.8),
        ])
        .unwrap()
    }

    #[test]
    fn test_blank_query_rejected() {
        let snap = snapshot();
        let err = handle(&snap, &Query::default(), &HandleOptions::default()).unwrap_err();
        assert_eq!(err, QueryError::InvalidQuery);

        let err = handle(
            &snap,
            &Query::with_code("  ", "   "),
            &HandleOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, QueryError::InvalidQuery);
    }

    #[test]
    fn test_no_overlap_is_empty_not_error() {
        let snap = snapshot();
        let out = handle(
            &snap,
            &Query::from_text("quantum teleportation"),
            &HandleOptions::default(),
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_punctuation_only_is_empty_not_error() {
        let snap = snapshot();
        let out = handle(&snap, &Query::from_text("!?!?"), &HandleOptions::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_top_match_list_lookup() {
        let snap = snapshot();
        let out = handle(
            &snap,
            &Query::from_text("list lookup is slow"),
            &HandleOptions::default(),
        )
        .unwrap();
        assert_eq!(out[0].pattern_id, "list_lookup");
        assert!(out[0].confidence > 0.5);
    }

    #[test]
    fn test_deterministic_repeat() {
        let snap = snapshot();
        let query = Query::with_code("slow membership", "if x in big_list: pass");
        let opts = HandleOptions::default();
        let a = handle(&snap, &query, &opts).unwrap();
        let b = handle(&snap, &query, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expired_deadline() {
        let snap = snapshot();
        let opts = HandleOptions {
            deadline: Some(Instant::now() - Duration::from_millis(1)),
            ..Default::default()
        };
        let err = handle(&snap, &Query::from_text("list lookup"), &opts).unwrap_err();
        assert_eq!(err, QueryError::DeadlineExceeded);
    }

    #[test]
    fn test_batch_matches_individual() {
        let snap = snapshot();
        let queries = vec![
            Query::from_text("list lookup is slow"),
            Query::from_text("記憶化 快取 遞迴"),
            Query::from_text("quantum teleportation"),
            Query::default(),
        ];
        let opts = HandleOptions::default();
        let batch = handle_batch(&snap, &queries, &opts);

        for (q, r) in queries.iter().zip(&batch) {
            assert_eq!(r, &handle(&snap, q, &opts));
        }
    }

    #[test]
    fn test_respond_joins_pattern_data() {
        let snap = snapshot();
        let resp = respond(
            &snap,
            &Query::from_text("list lookup is slow"),
            &HandleOptions::default(),
        )
        .unwrap();
        let top = &resp.recommendations[0];
        assert_eq!(top.pattern_id, "list_lookup");
        assert_eq!(top.speedup_factor, 524.8);
        assert_eq!(top.complexity_before, "O(n)");
        assert!(!resp.suggestions.is_empty());
    }

    #[test]
    fn test_respond_no_match_suggestions() {
        let snap = snapshot();
        let resp = respond(
            &snap,
            &Query::from_text("quantum teleportation"),
            &HandleOptions::default(),
        )
        .unwrap();
        assert!(resp.recommendations.is_empty());
        assert_eq!(resp.suggestions.len(), 2);
    }

    #[test]
    fn test_service_uses_current_snapshot() {
        let handle_ = Arc::new(SnapshotHandle::new(snapshot()));
        let service = QueryService::new(Arc::clone(&handle_), DEFAULT_THRESHOLD, DEFAULT_TOP_K, None);

        let before = service.respond(&Query::from_text("deque pop slow")).unwrap();
        assert_eq!(before.recommendations[0].pattern_id, "deque_operations");

        // corpus novo sem deque: próximo respond já vê o snapshot trocado
        handle_.swap(
            RegistrySnapshot::build(vec![pattern("only", &["deque"], 1.5)]).unwrap(),
        );
        let after = service.respond(&Query::from_text("deque pop slow")).unwrap();
        assert_eq!(after.recommendations[0].pattern_id, "only");
    }
}
