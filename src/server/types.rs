// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SCHEMAS API - Request/response do servidor HTTP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Pattern, Query};

// ─────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────

/// Resposta de GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Sempre "ok"
    pub status: String,
    pub version: String,
    pub patterns: usize,
}

// ─────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────

/// Resumo de um padrão em GET /patterns (sem templates de código)
#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub id: String,
    pub title: String,
    pub level: String,
    pub speedup_factor: f64,
    pub complexity_before: String,
    pub complexity_after: String,
    pub keywords: Vec<String>,
}

impl PatternSummary {
    pub fn from_pattern(pattern: &Pattern) -> Self {
        Self {
            id: pattern.id.clone(),
            title: pattern.title.clone(),
            level: pattern.level.clone(),
            speedup_factor: pattern.speedup_factor,
            complexity_before: pattern.complexity_before.clone(),
            complexity_after: pattern.complexity_after.clone(),
            keywords: pattern.keywords.clone(),
        }
    }
}

/// Resposta de GET /patterns
#[derive(Debug, Serialize)]
pub struct PatternsResponse {
    pub patterns: Vec<PatternSummary>,
    pub built_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────

/// Request para POST /query
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub text: String,
    pub code_excerpt: Option<String>,
    pub language_hint: Option<String>,
}

impl QueryRequest {
    pub fn into_query(self) -> Query {
        Query {
            text: self.text,
            code_excerpt: self.code_excerpt,
            language_hint: self.language_hint,
        }
    }
}

// ─────────────────────────────────────────────────
// Reload
// ─────────────────────────────────────────────────

/// Resposta de POST /reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub patterns: usize,
    pub indexed_tokens: usize,
    pub built_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────
// Error Response
// ─────────────────────────────────────────────────

/// Resposta de erro da API
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// Detalhes do erro
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_into_query() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"text": "slow lookup", "code_excerpt": "x in xs"}"#).unwrap();
        let query = req.into_query();
        assert_eq!(query.text, "slow lookup");
        assert_eq!(query.code_excerpt.as_deref(), Some("x in xs"));
    }

    #[test]
    fn test_query_request_text_defaults_empty() {
        let req: QueryRequest = serde_json::from_str(r#"{"code_excerpt": "x in xs"}"#).unwrap();
        assert!(req.text.is_empty());
        assert!(!req.into_query().is_blank());
    }

    #[test]
    fn test_api_error_shape() {
        let err = ApiError {
            error: ApiErrorDetail {
                message: "bad".into(),
                error_type: "invalid_request_error".into(),
            },
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains(r#""type":"invalid_request_error""#));
    }
}
