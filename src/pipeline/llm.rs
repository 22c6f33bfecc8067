//! Completion-endpoint interaction: build the chat request and call the model.
//!
//! All prompt text lives in [`crate::prompts`]; this module only owns
//! transport, retry, and the trait seam. [`CompletionClient`] exists so tests
//! and embedders can swap the HTTP client for a stub, the same override slot
//! the rest of the config offers for the OCR binary and the endpoint URL.
//!
//! ## Retry Strategy
//!
//! A local completion endpoint mostly fails in one of two ways: a transient
//! blip (model loading, socket churn) or it is simply not running. Bounded
//! exponential backoff (`retry_backoff_ms * 2^attempt`) recovers the first
//! without stalling long on the second: with the 500 ms base and 2 retries
//! the total back-off is 1.5 s. Only transport failures are retried; a
//! malformed reply is final.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// One chat-style completion request: system instruction plus user prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Object-safe completion client.
///
/// Implementations return the raw completion text; parsing it is the job of
/// [`crate::pipeline::parse`]. The boxed future keeps the trait usable as
/// `Arc<dyn CompletionClient>` inside [`ExtractionConfig`].
pub trait CompletionClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, ExtractError>>;
}

// ── Wire types (OpenAI-compatible /chat/completions) ─────────────────────

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ── HTTP implementation ──────────────────────────────────────────────────

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// No authentication: the endpoint is a locally hosted service
/// (Ollama, vLLM, LM Studio, …) addressed by URL only.
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpCompletionClient {
    /// Build a client from the endpoint/model/timeout fields of `config`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn unavailable(&self, reason: impl Into<String>) -> ExtractError {
        ExtractError::ServiceUnavailable {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, ExtractError>> {
        Box::pin(async move {
            let url = format!("{}/chat/completions", self.endpoint);
            let body = ChatRequestBody {
                model: &self.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: &request.system,
                    },
                    ChatMessage {
                        role: "user",
                        content: &request.user,
                    },
                ],
                temperature: request.temperature,
                max_tokens: request.max_tokens,
            };

            debug!("POST {} (model={})", url, self.model);

            let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
                if e.is_timeout() {
                    self.unavailable("request timed out")
                } else {
                    self.unavailable(e.to_string())
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(self.unavailable(format!("HTTP {status}")));
            }

            let parsed: ChatResponseBody = response
                .json()
                .await
                .map_err(|e| self.unavailable(format!("malformed response envelope: {e}")))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| self.unavailable("response contained no completion choices"))
        })
    }
}

// ── Retry loop ───────────────────────────────────────────────────────────

/// Call the completion client, retrying transient failures with backoff.
///
/// Returns the raw completion text and the number of retries actually taken.
pub async fn request_completion(
    client: &Arc<dyn CompletionClient>,
    request: &CompletionRequest,
    config: &ExtractionConfig,
) -> Result<(String, u32), ExtractError> {
    let mut last_err: Option<ExtractError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Completion retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match client.complete(request).await {
            Ok(text) => return Ok((text, attempt)),
            Err(e) if e.is_transient() => {
                warn!("Completion attempt {} failed: {}", attempt + 1, e);
                last_err = Some(e);
            }
            // Non-transient errors are final on the first occurrence.
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| ExtractError::Internal("retry loop exhausted".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl CompletionClient for FlakyClient {
        fn complete<'a>(
            &'a self,
            _request: &'a CompletionRequest,
        ) -> BoxFuture<'a, Result<String, ExtractError>> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                if n < self.fail_first {
                    Err(ExtractError::ServiceUnavailable {
                        endpoint: "stub".into(),
                        reason: "connection refused".into(),
                    })
                } else {
                    Ok("{}".to_string())
                }
            })
        }
    }

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            system: "sys".into(),
            user: "user".into(),
            temperature: 0.2,
            max_tokens: 300,
        }
    }

    fn fast_config() -> ExtractionConfig {
        ExtractionConfig::builder()
            .max_retries(2)
            .retry_backoff_ms(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let client: Arc<dyn CompletionClient> = Arc::new(FlakyClient {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });
        let (text, retries) = request_completion(&client, &sample_request(), &fast_config())
            .await
            .unwrap();
        assert_eq!(text, "{}");
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let client: Arc<dyn CompletionClient> = Arc::new(FlakyClient {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        });
        let err = request_completion(&client, &sample_request(), &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ServiceUnavailable { .. }));
    }

    struct ParseFailClient;

    impl CompletionClient for ParseFailClient {
        fn complete<'a>(
            &'a self,
            _request: &'a CompletionRequest,
        ) -> BoxFuture<'a, Result<String, ExtractError>> {
            Box::pin(async move {
                Err(ExtractError::ResponseParse {
                    detail: "nope".into(),
                    raw: String::new(),
                })
            })
        }
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let client: Arc<dyn CompletionClient> = Arc::new(ParseFailClient);
        let err = request_completion(&client, &sample_request(), &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ResponseParse { .. }));
    }
}
