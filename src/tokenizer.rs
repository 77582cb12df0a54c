// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TOKENIZER MULTI-SCRIPT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Converte texto cru (scripts mistos, trechos de código) em um stream de
// tokens normalizados. Sem parsing semântico: `list.index` e `lru_cache`
// viram tokens como qualquer palavra.
//
// Regras:
// - ASCII minúsculo; pontuação removida exceto `_` e `.` (identificadores)
// - Runs latinos segmentados por whitespace
// - Runs CJK: ideogramas individuais + n-grams deslizantes (n = 2..4)
// - Frases CJK configuradas (vindas das keywords do corpus) são emitidas
//   como token único quando aparecem verbatim
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Menor n-gram CJK emitido
pub const CJK_NGRAM_MIN: usize = 2;
/// Maior n-gram CJK emitido
pub const CJK_NGRAM_MAX: usize = 4;

/// Palavras latinas normalizadas: letras, dígitos, `_` e `.`
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9_.]+").expect("regex literal"));

/// Stream de tokens de uma query (ou de uma keyword do corpus)
///
/// Carrega duas visões do mesmo texto:
/// - `tokens`: conjunto completo (palavras, ideogramas, n-grams, frases),
///   usado para membership e para o denominador de precisão
/// - `sequence`: tokens atômicos em ordem textual (palavras + ideogramas,
///   sem n-grams), usado para detecção de frases contíguas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: BTreeSet<String>,
    sequence: Vec<String>,
}

impl TokenStream {
    /// True se nenhum token foi extraído
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Número total de tokens distintos (inclui n-grams)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Membership de um token
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Tokens atômicos em ordem textual
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    /// Iterador sobre o conjunto completo (ordem lexicográfica, determinística)
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }

    fn push_atomic(&mut self, token: &str) {
        self.sequence.push(token.to_string());
        self.tokens.insert(token.to_string());
    }

    fn push_derived(&mut self, token: String) {
        self.tokens.insert(token);
    }
}

/// Tokenizer com dicionário opcional de frases CJK
///
/// O dicionário vem das keywords do corpus: qualquer keyword CJK com 2+
/// ideogramas é retida como token único quando aparece verbatim no texto,
/// sem necessidade de dicionário de segmentação completo.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    phrases: Vec<String>,
}

impl Tokenizer {
    /// Tokenizer sem frases configuradas
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizer com frases retiradas de uma lista de keywords
    ///
    /// Só keywords inteiramente CJK com 2+ ideogramas entram no dicionário;
    /// frases latinas multi-palavra já são cobertas pela sequência de tokens.
    pub fn with_phrases<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<String> = keywords
            .into_iter()
            .filter_map(|k| {
                let normalized = normalize(k.as_ref());
                let trimmed = normalized.trim().to_string();
                let chars: Vec<char> = trimmed.chars().collect();
                if chars.len() >= 2 && chars.iter().all(|&c| is_cjk(c)) {
                    Some(trimmed)
                } else {
                    None
                }
            })
            .collect();
        phrases.sort();
        phrases.dedup();
        Self { phrases }
    }

    /// Tokeniza texto + trecho de código opcional
    ///
    /// Input sem tokens significativos (whitespace puro, só pontuação)
    /// produz um stream vazio, nunca um erro. Determinístico: mesmo input,
    /// mesmo output, independente de concorrência.
    pub fn tokenize(&self, text: &str, code_excerpt: Option<&str>) -> TokenStream {
        let mut stream = TokenStream::default();
        self.tokenize_into(&mut stream, text);
        if let Some(code) = code_excerpt {
            self.tokenize_into(&mut stream, code);
        }
        stream
    }

    fn tokenize_into(&self, stream: &mut TokenStream, raw: &str) {
        let normalized = normalize(raw);

        for run in normalized.split_whitespace() {
            for segment in split_scripts(run) {
                match segment {
                    Segment::Latin(s) => {
                        for m in WORD_RE.find_iter(s) {
                            // pontos de sentença nas bordas saem; internos
                            // (list.index) ficam
                            let word = m.as_str().trim_matches('.');
                            if !word.is_empty() {
                                stream.push_atomic(word);
                            }
                        }
                    }
                    Segment::Cjk(s) => {
                        let chars: Vec<char> = s.chars().collect();
                        for &c in &chars {
                            stream.push_atomic(&c.to_string());
                        }
                        for n in CJK_NGRAM_MIN..=CJK_NGRAM_MAX {
                            if chars.len() < n {
                                break;
                            }
                            for window in chars.windows(n) {
                                stream.push_derived(window.iter().collect());
                            }
                        }
                    }
                }
            }
        }

        // Frases do corpus presentes verbatim viram token único
        for phrase in &self.phrases {
            if normalized.contains(phrase.as_str()) {
                stream.push_derived(phrase.clone());
            }
        }
    }
}

enum Segment<'a> {
    Latin(&'a str),
    Cjk(&'a str),
}

/// Ideogramas CJK (Unified Ideographs + extensão A + compatibilidade)
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
    )
}

/// Normaliza: ASCII minúsculo, mantém [a-z0-9_.], ideogramas CJK e
/// whitespace; todo o resto vira espaço
fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else if c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || c == '_'
                || c == '.'
                || is_cjk(c)
                || c.is_whitespace()
            {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Divide um run sem whitespace em segmentos latinos/CJK alternados
fn split_scripts(run: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut current_cjk: Option<bool> = None;

    for (idx, c) in run.char_indices() {
        let cjk = is_cjk(c);
        match current_cjk {
            None => current_cjk = Some(cjk),
            Some(prev) if prev != cjk => {
                segments.push(make_segment(&run[start..idx], prev));
                start = idx;
                current_cjk = Some(cjk);
            }
            _ => {}
        }
    }

    if let Some(cjk) = current_cjk {
        segments.push(make_segment(&run[start..], cjk));
    }
    segments
}

fn make_segment(s: &str, cjk: bool) -> Segment<'_> {
    if cjk {
        Segment::Cjk(s)
    } else {
        Segment::Latin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_words_lowercased() {
        let t = Tokenizer::new();
        let stream = t.tokenize("List Lookup IS Slow!", None);
        assert!(stream.contains("list"));
        assert!(stream.contains("lookup"));
        assert!(stream.contains("is"));
        assert!(stream.contains("slow"));
        assert_eq!(stream.sequence(), &["list", "lookup", "is", "slow"]);
    }

    #[test]
    fn test_identifier_chars_preserved() {
        let t = Tokenizer::new();
        let stream = t.tokenize("", Some("idx = names.index(x); from functools import lru_cache"));
        assert!(stream.contains("names.index"));
        assert!(stream.contains("lru_cache"));
        assert!(stream.contains("functools"));
    }

    #[test]
    fn test_sentence_period_stripped() {
        let t = Tokenizer::new();
        let stream = t.tokenize("the loop is slow.", None);
        assert!(stream.contains("slow"));
        assert!(!stream.contains("slow."));
    }

    #[test]
    fn test_whitespace_only_yields_empty() {
        let t = Tokenizer::new();
        assert!(t.tokenize("   \t\n  ", None).is_empty());
        assert!(t.tokenize("", Some("  ")).is_empty());
        assert!(t.tokenize("!!! ???", None).is_empty());
    }

    #[test]
    fn test_cjk_chars_and_ngrams() {
        let t = Tokenizer::new();
        let stream = t.tokenize("記憶化", None);
        // ideogramas individuais
        assert!(stream.contains("記"));
        assert!(stream.contains("憶"));
        assert!(stream.contains("化"));
        // n-grams deslizantes
        assert!(stream.contains("記憶"));
        assert!(stream.contains("憶化"));
        assert!(stream.contains("記憶化"));
        // sequência só tem os atômicos
        assert_eq!(stream.sequence(), &["記", "憶", "化"]);
    }

    #[test]
    fn test_cjk_ngrams_do_not_cross_whitespace() {
        let t = Tokenizer::new();
        let stream = t.tokenize("記憶 快取", None);
        assert!(stream.contains("記憶"));
        assert!(stream.contains("快取"));
        assert!(!stream.contains("憶快"));
    }

    #[test]
    fn test_mixed_script_run_splits() {
        let t = Tokenizer::new();
        let stream = t.tokenize("cache快取", None);
        assert!(stream.contains("cache"));
        assert!(stream.contains("快取"));
        assert_eq!(stream.sequence(), &["cache", "快", "取"]);
    }

    #[test]
    fn test_phrase_retained_verbatim() {
        let t = Tokenizer::with_phrases(["記憶化快取", "list lookup", "遞迴"]);
        let stream = t.tokenize("使用記憶化快取優化遞迴", None);
        // frase de 5 ideogramas vai além do n-gram máximo (4), mas é retida
        assert!(stream.contains("記憶化快取"));
        assert!(stream.contains("遞迴"));
    }

    #[test]
    fn test_phrase_absent_not_emitted() {
        let t = Tokenizer::with_phrases(["記憶化快取"]);
        let stream = t.tokenize("記憶化 快取", None);
        // espaço quebra o verbatim
        assert!(!stream.contains("記憶化快取"));
    }

    #[test]
    fn test_deterministic() {
        let t = Tokenizer::with_phrases(["記憶化快取"]);
        let a = t.tokenize("list lookup 記憶化快取 lru_cache", Some("x in xs"));
        let b = t.tokenize("list lookup 記憶化快取 lru_cache", Some("x in xs"));
        assert_eq!(a, b);
        let av: Vec<&str> = a.iter().collect();
        let bv: Vec<&str> = b.iter().collect();
        assert_eq!(av, bv);
    }
}
