// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

/// Identificador único de um padrão de otimização
pub type PatternId = String;

fn default_level() -> String {
    "B".into()
}

/// Um padrão de otimização documentado
///
/// Cada padrão descreve uma técnica com complexidade antes/depois e speedup
/// medidos externamente pelo benchmark harness. O engine nunca recalcula
/// esses números: são dados opacos e confiáveis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    /// Id único no corpus (ex: "list_lookup")
    pub id: PatternId,
    /// Título legível
    pub title: String,
    /// Keywords normalizadas; podem conter frases multi-palavra
    pub keywords: Vec<String>,
    /// Classe de complexidade antes (ex: "O(n)")
    pub complexity_before: String,
    /// Classe de complexidade depois (ex: "O(1)")
    pub complexity_after: String,
    /// Speedup medido (> 0), fornecido pelo harness externo
    pub speedup_factor: f64,
    /// Grau atribuído pelo harness ("A+", "A", "B+", ...)
    #[serde(default = "default_level")]
    pub level: String,
    /// Notas de aplicabilidade (texto livre)
    #[serde(default)]
    pub applicability_notes: String,
    /// Ressalvas, em ordem de importância
    #[serde(default)]
    pub caveats: Vec<String>,
    /// Template de código "antes" (blob opaco)
    #[serde(default)]
    pub code_template_before: String,
    /// Template de código "depois" (blob opaco)
    #[serde(default)]
    pub code_template_after: String,
}

/// Query de recomendação
///
/// Pelo menos um de `text`/`code_excerpt` deve ser não-vazio (validado pelo
/// QueryService, não aqui).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// Texto livre descrevendo o problema (pode misturar scripts)
    pub text: String,
    /// Trecho de código opcional (tokenizado lexicalmente, nunca executado)
    #[serde(default)]
    pub code_excerpt: Option<String>,
    /// Dica de linguagem opcional (ex: "python")
    #[serde(default)]
    pub language_hint: Option<String>,
}

impl Query {
    /// Query só de texto
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Query com texto e trecho de código
    pub fn with_code(text: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code_excerpt: Some(code.into()),
            language_hint: None,
        }
    }

    /// True se ambos os campos são vazios/whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
            && self
                .code_excerpt
                .as_deref()
                .map(|c| c.trim().is_empty())
                .unwrap_or(true)
    }
}

/// Resultado de match para um padrão
///
/// Efêmero: criado e descartado por requisição, nunca persiste.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Id do padrão casado
    pub pattern_id: PatternId,
    /// Confiança em [0,1], arredondada para 2 casas
    pub confidence: f64,
    /// Keywords do padrão efetivamente encontradas na query
    pub matched_keywords: Vec<String>,
    /// Explicação curta do match
    pub rationale: String,
}

/// Recomendação no formato de transporte
///
/// Junção de um [`MatchResult`] com os dados do padrão correspondente.
#[derive(Debug, Clone, Serialize)]
#[allow(missing_docs)]
pub struct Recommendation {
    pub pattern_id: PatternId,
    pub title: String,
    pub confidence: f64,
    pub speedup_factor: f64,
    pub complexity_before: String,
    pub complexity_after: String,
    pub level: String,
    pub matched_keywords: Vec<String>,
    pub caveats: Vec<String>,
    pub rationale: String,
}

impl Recommendation {
    /// Monta a recomendação juntando match + padrão
    pub fn from_match(result: &MatchResult, pattern: &Pattern) -> Self {
        Self {
            pattern_id: result.pattern_id.clone(),
            title: pattern.title.clone(),
            confidence: result.confidence,
            speedup_factor: pattern.speedup_factor,
            complexity_before: pattern.complexity_before.clone(),
            complexity_after: pattern.complexity_after.clone(),
            level: pattern.level.clone(),
            matched_keywords: result.matched_keywords.clone(),
            caveats: pattern.caveats.clone(),
            rationale: result.rationale.clone(),
        }
    }
}

/// Resposta completa de uma query (lista ordenada + sugestões)
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Id da requisição (para correlação em logs)
    pub request_id: uuid::Uuid,
    /// Recomendações ordenadas por confiança
    pub recommendations: Vec<Recommendation>,
    /// Dicas legíveis geradas deterministicamente do ranking
    pub suggestions: Vec<String>,
}
