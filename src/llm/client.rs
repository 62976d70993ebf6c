//! Chat-completion client used as a binary relevance classifier

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::errors::PostRagError;
use crate::errors::Result;

/// Seam for the relevance-classification call, mockable in tests
pub trait RelevanceClassifier: Send + Sync {
    /// Whether the classifier is configured; callers must check this
    /// before attempting a call
    fn is_available(&self) -> bool;

    /// Single chat-completion call returning the raw model response
    fn classify_relevance(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Parse the model's relevance verdict.
///
/// Legacy policy kept verbatim for compatibility: the uppercased response
/// must contain "RELEVANT" and must not contain "NOT". A reply like
/// "NOT RELEVANT BUT SOMEWHAT RELEVANT" is rejected under this rule.
/// Isolated here so it can be swapped for structured output later.
#[must_use]
pub fn parse_relevance_verdict(response: &str) -> bool {
    let upper = response.trim().to_uppercase();
    upper.contains("RELEVANT") && !upper.contains("NOT")
}

/// Stateless chat-completion client with a hard per-call timeout
pub struct LlmClient {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout_ms: u64,
    client: Client,
}

impl LlmClient {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PostRagError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: config.llm_endpoint().to_string(),
            api_key: config
                .llm
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(String::from),
            model: config.llm_model().to_string(),
            timeout_ms: config.llm_timeout_ms(),
            client,
        })
    }

    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or(PostRagError::LlmUnavailable)?;

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }

        #[derive(Serialize, Deserialize)]
        struct ChatMessage {
            role: String,
            content: String,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {}", url);

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": 0.7,
            "max_tokens": 1024,
        });

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send();

        // Dropping the request future on timeout aborts the in-flight
        // HTTP call; the response never arrives late
        let response = tokio::time::timeout(Duration::from_millis(self.timeout_ms), request)
            .await
            .map_err(|_| PostRagError::LlmTimeout(self.timeout_ms))?
            .map_err(|e| PostRagError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PostRagError::LlmProvider { status, body });
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| PostRagError::Http(format!("Failed to parse response: {e}")))?;

        Ok(result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl RelevanceClassifier for LlmClient {
    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn classify_relevance(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        self.chat_completion(system, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_accepts_relevant() {
        assert!(parse_relevance_verdict("RELEVANT"));
        assert!(parse_relevance_verdict("  relevant  "));
        assert!(parse_relevance_verdict("The posts are RELEVANT."));
    }

    #[test]
    fn test_verdict_rejects_not_relevant() {
        assert!(!parse_relevance_verdict("NOT_RELEVANT"));
        assert!(!parse_relevance_verdict("not relevant"));
        assert!(!parse_relevance_verdict(""));
        assert!(!parse_relevance_verdict("no idea"));
    }

    #[test]
    fn test_verdict_ambiguous_response_is_rejected() {
        // Any "NOT" anywhere wins under the legacy rule
        assert!(!parse_relevance_verdict("NOT RELEVANT BUT SOMEWHAT RELEVANT"));
    }

    #[test]
    fn test_unconfigured_client_is_unavailable() {
        let config = crate::config::AppConfig::default();
        let client = LlmClient::new(&config).unwrap();
        assert!(!client.is_available());
    }

    #[tokio::test]
    async fn test_unavailable_client_call_fails_fast() {
        let config = crate::config::AppConfig::default();
        let client = LlmClient::new(&config).unwrap();
        let err = client
            .classify_relevance("system", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, PostRagError::LlmUnavailable));
    }
}
