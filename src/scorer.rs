// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MATCH SCORER - COBERTURA/PRECISÃO COM BÔNUS DE FRASE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Score em [0,1] de uma query contra a assinatura de keywords de um padrão:
//
//   coverage  = keywords casadas / total de keywords do padrão
//   precision = min(keywords casadas / max(tokens da query, 1), 1)
//   base      = 2cp / (c + p)          (blend harmônico, 0 se c ou p == 0)
//   score     = min(base + 0.15, 1.0)  quando há hit de frase exata
//
// O hit de frase dispara quando uma keyword multi-token aparece contígua na
// sequência tokenizada da query, ou quando duas keywords casadas distintas
// aparecem adjacentes. Matches específicos valem mais que coincidência.
//
// Monotônico: adicionar um token que casa, ou um hit de frase, nunca reduz
// o score de um candidato.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::registry::KeywordSig;
use crate::tokenizer::TokenStream;

/// Bônus somado (com teto em 1.0) quando há frase exata na query
pub const EXACT_PHRASE_BONUS: f64 = 0.15;

/// Score detalhado de um candidato
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    /// Score final em [0,1] (sem arredondamento; o ranking arredonda)
    pub score: f64,
    /// Keywords do padrão encontradas na query, na ordem do corpus
    pub matched_keywords: Vec<String>,
    /// True se o bônus de frase exata foi aplicado
    pub phrase_hit: bool,
}

/// Calcula o score de uma query contra as assinaturas de um padrão
///
/// Função pura: não toca estado compartilhado, segura para chamar em
/// paralelo contra o mesmo snapshot.
pub fn score(query: &TokenStream, sigs: &[KeywordSig]) -> ScoreBreakdown {
    let matched: Vec<&KeywordSig> = sigs.iter().filter(|s| s.matches(query)).collect();

    let overlap = matched.len() as f64;
    let total_keywords = sigs.len().max(1) as f64;
    let query_tokens = query.len().max(1) as f64;

    let coverage = overlap / total_keywords;
    // keywords multi-token sobrepostas podem casar mais keywords do que há
    // tokens distintos na query; o teto mantém o score em [0,1]
    let precision = (overlap / query_tokens).min(1.0);

    let base = if coverage > 0.0 && precision > 0.0 {
        2.0 * coverage * precision / (coverage + precision)
    } else {
        0.0
    };

    let phrase_hit = base > 0.0 && has_phrase_hit(query, &matched);
    let score = if phrase_hit {
        (base + EXACT_PHRASE_BONUS).min(1.0)
    } else {
        base
    };

    ScoreBreakdown {
        score,
        matched_keywords: matched.iter().map(|s| s.raw.clone()).collect(),
        phrase_hit,
    }
}

/// Evidência de frase na query tokenizada
///
/// Duas formas contam:
/// 1. uma keyword-frase inteira aparece contígua na sequência da query
/// 2. duas keywords casadas distintas aparecem em posições adjacentes
///    (o matcher original por substring recompensava exatamente essa
///    contiguidade)
fn has_phrase_hit(query: &TokenStream, matched: &[&KeywordSig]) -> bool {
    let seq = query.sequence();

    // forma 1: frase inteira contígua
    for sig in matched {
        if sig.is_phrase() && contains_contiguous(seq, &sig.atoms) {
            return true;
        }
    }

    // forma 2: keywords casadas distintas em tokens adjacentes
    for pair in seq.windows(2) {
        let first = matched.iter().position(|s| s.atoms.iter().any(|a| a == &pair[0]));
        let second = matched.iter().position(|s| s.atoms.iter().any(|a| a == &pair[1]));
        if let (Some(a), Some(b)) = (first, second) {
            if a != b {
                return true;
            }
        }
    }

    false
}

/// True se `needle` aparece como janela contígua de `haystack`
fn contains_contiguous(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
