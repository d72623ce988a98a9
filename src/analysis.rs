//! The analysis collaborator: scores a resume against a job description.
//!
//! The pipeline only depends on the [`Analyzer`] trait. [`LlmAnalyzer`] is
//! the production implementation over `edgequake-llm`; tests and embedders
//! can supply their own.
//!
//! ## Provider resolution
//!
//! [`LlmAnalyzer::from_config`] picks a provider in this order:
//!
//! 1. `IngestConfig::provider` (pre-built)
//! 2. `IngestConfig::provider_name` (+ `model`)
//! 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`
//! 4. `OPENAI_API_KEY` → OpenAI
//! 5. `ProviderFactory::from_env()` auto-detection
//!
//! There are no retries: one failed call is one `Analysis` failure, and the
//! user decides whether to submit again.

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::prompts::{analysis_user_prompt, ANALYSIS_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-mini";

// ── Report schema ────────────────────────────────────────────────────────────

/// Per-dimension scores, each 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub keywords: f64,
    pub experience: f64,
    pub format: f64,
    pub grammar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRelevance {
    pub keyword: String,
    /// 0–100.
    pub relevance: f64,
}

/// One axis of the radar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarMetric {
    pub subject: String,
    /// The candidate's score on this axis.
    #[serde(rename = "A")]
    pub a: f64,
    pub full_mark: f64,
}

/// The structured result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub ats_score: f64,
    pub breakdown: ScoreBreakdown,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub keyword_analysis: Vec<KeywordRelevance>,
    pub summary: String,
    pub suggested_job_roles: Vec<String>,
    pub radar_metrics: Vec<RadarMetric>,
}

// ── Collaborator trait ───────────────────────────────────────────────────────

/// Scores resume text against a job description.
///
/// Implementations must be cheap to share across tasks; the session clones
/// an `Arc` of the analyzer into each analysis task.
pub trait Analyzer: Send + Sync + 'static {
    fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> impl Future<Output = Result<AnalysisReport, IngestError>> + Send;
}

// ── LLM implementation ───────────────────────────────────────────────────────

/// [`Analyzer`] backed by a chat-completion provider.
pub struct LlmAnalyzer {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl std::fmt::Debug for LlmAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAnalyzer")
            .field("provider", &self.provider.name())
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmAnalyzer {
    /// Wrap an existing provider, taking call options from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &IngestConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Resolve a provider from `config` and the environment.
    pub fn from_config(config: &IngestConfig) -> Result<Self, IngestError> {
        let provider = resolve_provider(config)?;
        info!("Analysis provider: {} ({})", provider.name(), provider.model());
        Ok(Self::new(provider, config))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl Analyzer for LlmAnalyzer {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisReport, IngestError> {
        let messages = vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(analysis_user_prompt(resume_text, job_description)),
        ];
        let options = self.options();
        let start = Instant::now();

        let call = self.provider.chat(&messages, Some(&options));
        let response = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                return Err(IngestError::AnalysisTimeout {
                    secs: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                warn!("Analysis call failed: {}", message);
                return Err(classify_provider_error(self.provider.name(), message));
            }
            Ok(Ok(response)) => response,
        };

        debug!(
            "Analysis: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        parse_report(&response.content)
    }
}

/// Resolve the LLM provider from config, falling back to the environment.
fn resolve_provider(config: &IngestConfig) -> Result<Arc<dyn LLMProvider>, IngestError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _) =
        ProviderFactory::from_env().map_err(|e| IngestError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!("No LLM provider auto-detected: {}", e),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, IngestError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        IngestError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn classify_provider_error(provider: &str, message: String) -> IngestError {
    let lower = message.to_ascii_lowercase();
    if message.contains("429") || lower.contains("rate limit") || lower.contains("ratelimit") {
        IngestError::RateLimited {
            provider: provider.to_string(),
        }
    } else {
        IngestError::AnalysisFailed { message }
    }
}

// ── Response parsing ─────────────────────────────────────────────────────────

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Parse the model's reply into a report.
///
/// Tolerates an outer ```` ```json ```` fence even though the prompt asks
/// for bare JSON.
pub fn parse_report(content: &str) -> Result<AnalysisReport, IngestError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(IngestError::AnalysisFailed {
            message: "Analysis engine failed to produce a report.".to_string(),
        });
    }
    let json = match RE_JSON_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => trimmed,
    };
    serde_json::from_str(json).map_err(|e| IngestError::MalformedReport {
        detail: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    pub(crate) const SAMPLE: &str = r#"{
        "atsScore": 78,
        "breakdown": {"skills": 80, "keywords": 70, "experience": 85, "format": 90, "grammar": 95},
        "matchingSkills": ["Rust", "tokio"],
        "missingSkills": ["Kubernetes"],
        "recommendations": ["Quantify impact"],
        "keywordAnalysis": [{"keyword": "async", "relevance": 90}],
        "summary": "Strong systems background.",
        "suggestedJobRoles": ["Backend Engineer"],
        "radarMetrics": [{"subject": "Leadership", "A": 60, "fullMark": 100}]
    }"#;

    #[test]
    fn parses_camel_case_report() {
        let report = parse_report(SAMPLE).unwrap();
        assert_eq!(report.ats_score, 78.0);
        assert_eq!(report.matching_skills, vec!["Rust", "tokio"]);
        assert_eq!(report.radar_metrics[0].a, 60.0);
        assert_eq!(report.radar_metrics[0].full_mark, 100.0);
    }

    #[test]
    fn serialises_with_wire_names() {
        let report = parse_report(SAMPLE).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("atsScore").is_some());
        assert!(json["radarMetrics"][0].get("A").is_some());
        assert!(json["radarMetrics"][0].get("fullMark").is_some());
    }

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        assert!(parse_report(&fenced).is_ok());
    }

    #[test]
    fn empty_reply_is_analysis_failure() {
        let err = parse_report("  \n").unwrap_err();
        assert!(matches!(err, IngestError::AnalysisFailed { .. }));
        assert_eq!(err.category(), ErrorCategory::Analysis);
    }

    #[test]
    fn malformed_reply_is_analysis_failure() {
        let err = parse_report("{\"atsScore\": 1}").unwrap_err();
        assert!(matches!(err, IngestError::MalformedReport { .. }));
        assert_eq!(err.category(), ErrorCategory::Analysis);
    }

    #[test]
    fn rate_limits_are_recognised() {
        let err = classify_provider_error("openai", "HTTP 429 Too Many Requests".into());
        assert!(matches!(err, IngestError::RateLimited { .. }));
        let err = classify_provider_error("gemini", "Rate limit exceeded".into());
        assert!(matches!(err, IngestError::RateLimited { .. }));
        let err = classify_provider_error("gemini", "bad gateway".into());
        assert!(matches!(err, IngestError::AnalysisFailed { .. }));
    }
}
