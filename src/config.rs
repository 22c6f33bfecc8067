//! Configuration types for entity extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Every knob that used to be a
//! process-wide singleton (the OCR binary path, the completion endpoint, the
//! model name) lives here instead, so per-session and per-test overrides are
//! ordinary value construction rather than global mutation.

use crate::error::ExtractError;
use crate::pipeline::llm::CompletionClient;
use std::fmt;
use std::sync::Arc;

/// Default OpenAI-compatible endpoint (Ollama's local server).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1";

/// Default model served at the local endpoint.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Configuration for a document extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2fields::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(200)
///     .endpoint("http://localhost:11434/v1")
///     .model("llama3.1")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI used when rasterising pages for OCR. Range: 72–400. Default: 200.
    ///
    /// 200 DPI is enough for tesseract to read ordinary print reliably.
    /// Increase to 300 for small fonts; lower values blur glyphs and hurt
    /// recognition more than they save time.
    pub dpi: u32,

    /// DPI for the single-page preview render. Default: 150.
    ///
    /// The preview only needs to be legible on screen, so it renders cheaper
    /// than the OCR pass.
    pub preview_dpi: u32,

    /// OCR language passed to tesseract's `-l` flag. Default: "eng".
    pub ocr_lang: String,

    /// Command used to invoke the OCR engine. Default: "tesseract".
    ///
    /// May be a bare command resolved via PATH or an absolute path to the
    /// binary on systems where tesseract is installed outside PATH.
    pub tesseract_cmd: String,

    /// Base URL of the OpenAI-compatible completion endpoint (without the
    /// `/chat/completions` suffix). Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier sent with each completion request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature for the completion. Default: 0.2.
    ///
    /// Low temperature keeps the model close to the literal document text,
    /// which is what field extraction wants. Higher values invite invented
    /// values for fields that are not in the document.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 300.
    ///
    /// The reply is a four-key JSON object; 300 tokens is generous for that
    /// and bounds the damage when the model ignores the no-prose rule.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient completion failure. Default: 2.
    ///
    /// A single unreachable-endpoint blip should not fail the whole run, but
    /// a local endpoint that is down stays down; two bounded retries catch
    /// the transient case without stalling the user for long.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-completion-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Pre-constructed completion client. Takes precedence over
    /// `endpoint`/`model`/`api_timeout_secs`.
    ///
    /// The injection point for tests and embedders that need a stub or a
    /// wrapped client (caching, recording, rate-limiting).
    pub client: Option<Arc<dyn CompletionClient>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            preview_dpi: 150,
            ocr_lang: "eng".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 300,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
            client: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("preview_dpi", &self.preview_dpi)
            .field("ocr_lang", &self.ocr_lang)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn preview_dpi(mut self, dpi: u32) -> Self {
        self.config.preview_dpi = dpi.clamp(72, 400);
        self
    }

    pub fn ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_lang = lang.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
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

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(ExtractError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.endpoint.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "Completion endpoint must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.tesseract_cmd.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "tesseract command must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
