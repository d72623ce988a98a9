//! Configuration for extraction, refinement and analysis.
//!
//! All behaviour is controlled through [`IngestConfig`], built via its
//! [`IngestConfigBuilder`]. Keeping every knob in one struct makes it easy
//! to share a config between the CLI, a [`crate::session::Session`] and
//! tests, and to clone it per run with a different progress callback.

use crate::error::IngestError;
use crate::pipeline::refine::RefinementOptions;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Phase labels shown while an analysis call is in flight.
pub const DEFAULT_ANALYSIS_PHASES: [&str; 5] = [
    "Awakening Neural Correlates...",
    "Synthesizing Career Trajectories...",
    "Evaluating Semantic Alignment...",
    "Quantifying Market Relevance...",
    "Generating Strategic Intelligence...",
];

/// Configuration for the ingestion pipeline and the analysis collaborator.
///
/// Built via [`IngestConfig::builder()`] or using [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2text::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .max_file_bytes(5 * 1024 * 1024)
///     .ticker_interval_ms(2_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// PDF user password for encrypted documents.
    pub pdf_password: Option<String>,

    /// Explicit path to libpdfium. Falls back to `PDFIUM_LIB_PATH`, then to
    /// the system library search path.
    pub pdfium_library_path: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Largest accepted document in bytes. Default: 25 MiB.
    pub max_file_bytes: u64,

    /// Options used when the user applies refinement.
    pub refinement: RefinementOptions,

    /// Interval between decorative analysis phases. Default: 3000 ms.
    pub ticker_interval_ms: u64,

    /// Ordered phase labels for the analysis ticker.
    pub analysis_phases: Vec<String>,

    /// LLM model identifier. If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the analysis call. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the analysis may generate. Default: 4096.
    pub max_tokens: usize,

    /// Analysis call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Receives pipeline steps during extraction.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pdf_password: None,
            pdfium_library_path: None,
            download_timeout_secs: 120,
            max_file_bytes: 25 * 1024 * 1024,
            refinement: RefinementOptions::default(),
            ticker_interval_ms: 3_000,
            analysis_phases: DEFAULT_ANALYSIS_PHASES.iter().map(|s| s.to_string()).collect(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("pdf_password", &self.pdf_password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("refinement", &self.refinement)
            .field("ticker_interval_ms", &self.ticker_interval_ms)
            .field("analysis_phases", &self.analysis_phases.len())
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }

    /// A copy of this config reporting to `callback` instead.
    pub fn with_progress_callback(&self, callback: ProgressCallback) -> Self {
        Self {
            progress_callback: Some(callback),
            ..self.clone()
        }
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn pdf_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.pdf_password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn refinement(mut self, options: RefinementOptions) -> Self {
        self.config.refinement = options;
        self
    }

    pub fn ticker_interval_ms(mut self, ms: u64) -> Self {
        self.config.ticker_interval_ms = ms;
        self
    }

    pub fn analysis_phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.analysis_phases = phases.into_iter().map(Into::into).collect();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, IngestError> {
        let c = &self.config;
        if c.ticker_interval_ms == 0 {
            return Err(IngestError::InvalidConfig(
                "Ticker interval must be ≥ 1 ms".into(),
            ));
        }
        if c.analysis_phases.is_empty() {
            return Err(IngestError::InvalidConfig(
                "At least one analysis phase label is required".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(IngestError::InvalidConfig(
                "Maximum file size must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn defaults() {
        let c = IngestConfig::default();
        assert_eq!(c.ticker_interval_ms, 3_000);
        assert_eq!(c.analysis_phases.len(), 5);
        assert!(c.refinement.normalize_spacing);
        assert!(!c.refinement.remove_special_chars);
        assert!(c.refinement.strip_unwanted_formatting);
    }

    #[test]
    fn builder_rejects_zero_interval() {
        let err = IngestConfig::builder().ticker_interval_ms(0).build().unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfig(_)));
        assert_eq!(err.category(), ErrorCategory::Unknown);
    }

    #[test]
    fn builder_rejects_empty_phases() {
        let err = IngestConfig::builder()
            .analysis_phases(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("phase"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = IngestConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_password() {
        let c = IngestConfig::builder().pdf_password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
