// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RANKING AGGREGATOR - FILTRO, ORDEM TOTAL, TOP-K, RATIONALE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::cmp::Ordering;

use crate::types::MatchResult;

/// Threshold default de confiança
pub const DEFAULT_THRESHOLD: f64 = 0.15;
/// Tamanho default do ranking
pub const DEFAULT_TOP_K: usize = 5;

/// Candidato com score, pronto para ranquear
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// Id do padrão candidato
    pub pattern_id: String,
    /// Speedup do padrão (critério de desempate)
    pub speedup_factor: f64,
    /// Score cru do scorer, em [0,1]
    pub score: f64,
    /// Keywords casadas, na forma original do corpus
    pub matched_keywords: Vec<String>,
}

/// Arredonda confiança para 2 casas (formato de saída)
pub fn round_confidence(score: f64) -> f64 {
    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Filtra, ordena, trunca e anexa rationale
///
/// - descarta candidatos com confiança (já arredondada) < threshold
/// - ordena por confiança desc; empate por speedup desc, depois id asc —
///   ordem total, totalmente determinística
/// - trunca em `top_k`
pub fn rank(
    mut candidates: Vec<ScoredCandidate>,
    threshold: f64,
    top_k: usize,
) -> Vec<MatchResult> {
    candidates.retain(|c| round_confidence(c.score) >= threshold);

    candidates.sort_by(|a, b| {
        let ca = round_confidence(a.score);
        let cb = round_confidence(b.score);
        cb.partial_cmp(&ca)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.speedup_factor
                    .partial_cmp(&a.speedup_factor)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.pattern_id.cmp(&b.pattern_id))
    });

    candidates.truncate(top_k);

    candidates
        .into_iter()
        .map(|c| MatchResult {
            confidence: round_confidence(c.score),
            rationale: rationale(&c.matched_keywords),
            pattern_id: c.pattern_id,
            matched_keywords: c.matched_keywords,
        })
        .collect()
}

/// Forma fixa e legível da lista de keywords casadas
fn rationale(matched: &[String]) -> String {
    if matched.is_empty() {
        "no keyword overlap".to_string()
    } else {
        format!("matched keywords: {}", matched.join(", "))
    }
}
