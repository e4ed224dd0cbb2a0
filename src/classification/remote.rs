// src/classification/remote.rs
//
// Layer 2 of the classifier: asks a hosted language model to label the
// business names the rules could not decide.
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::models::core::Confidence;
use crate::utils::config::RemoteClassifierConfig;

pub const PRIVATE_CLINIC: &str = "Private Clinic";

pub const CATEGORIES: [&str; 5] = [PRIVATE_CLINIC, "Hospital", "Medical Center", "Lab", "Pharmacy"];

pub const SYSTEM_PROMPT: &str = "You are a medical business classifier for Egypt.
Respond with a single valid JSON object only. No explanation, no markdown, no arrays.";

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request to classifier failed: {0}")]
    Transport(String),
    #[error("classifier rate limited the request")]
    RateLimited { retry_after: Option<Duration> },
    #[error("classifier server error: HTTP {status}")]
    Server { status: u16 },
    #[error("classifier rejected the request: HTTP {status}: {body}")]
    Client { status: u16, body: String },
    #[error("classifier returned an empty response")]
    EmptyResponse,
    #[error("malformed classifier response: {0}")]
    Parse(String),
}

impl RemoteError {
    /// Transport failures, rate limits and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Transport(_) | RemoteError::RateLimited { .. } | RemoteError::Server { .. }
        )
    }
}

/// Parsed answer from the remote model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteClassification {
    pub category: String,
    pub confidence: Confidence,
    pub reason: String,
    pub doctor_name: Option<String>,
}

impl RemoteClassification {
    /// Only the literal "Private Clinic" label is an accept.
    pub fn is_private_clinic(&self) -> bool {
        self.category == PRIVATE_CLINIC
    }
}

#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    /// Classifies a business by name alone.
    async fn classify_remote(&self, name: &str) -> Result<RemoteClassification, RemoteError>;
}

/// Attempt ceiling and exponential backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): base, 2x base, 4x base… capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt ceiling is reached. The last error is returned to the caller.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let mut wait = policy.backoff(attempt);
                if let RemoteError::RateLimited { retry_after: Some(hint) } = &e {
                    wait = wait.max(*hint).min(policy.max_delay);
                }
                warn!(
                    "[REMOTE] attempt {}/{} for '{}' failed: {}. Retrying in {:?}",
                    attempt, max_attempts, label, e, wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// The user instruction. Carries the business name only, never the address.
pub fn build_user_prompt(name: &str) -> String {
    format!(
        r#"Classify this Egyptian medical business name into ONE category.

Categories: {categories}

Rules:
- "center/مركز" in name → Medical Center (even if Dr. is present)
- "مصحة" in name → Hospital
- Named after a person + no center/hospital keyword → Private Clinic
- Ambiguous brand/wellness/counseling names → Private Clinic
- If still unsure → Private Clinic

Return ONLY: {{"category": "...", "confidence": "High|Medium|Low", "reason": "..."}}

Name: {name}"#,
        categories = CATEGORIES.join(", "),
        name = name.trim(),
    )
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn build_request<'a>(config: &'a RemoteClassifierConfig, name: &str) -> ChatRequest<'a> {
    ChatRequest {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: build_user_prompt(name),
            },
        ],
        temperature: config.temperature,
        response_format: ResponseFormat { kind: "json_object" },
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    doctor_name: Option<String>,
}

/// Parses the model's message content. It must be exactly one JSON object
/// with a non-empty `category`; anything else is a `Parse` error.
pub fn parse_classification(content: &str) -> Result<RemoteClassification, RemoteError> {
    let value: serde_json::Value =
        serde_json::from_str(content.trim()).map_err(|e| RemoteError::Parse(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(RemoteError::Parse(format!("expected a JSON object, got: {}", value)));
    }
    let raw: RawClassification =
        serde_json::from_value(value).map_err(|e| RemoteError::Parse(format!("unexpected field types: {}", e)))?;

    let category = raw
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| RemoteError::Parse("missing 'category' field".to_string()))?;

    Ok(RemoteClassification {
        category,
        confidence: Confidence::from_remote(raw.confidence.as_deref()),
        reason: raw.reason.unwrap_or_default(),
        doctor_name: raw.doctor_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    })
}

/// Groq's OpenAI-compatible chat-completions endpoint in JSON-object mode.
pub struct GroqClassifier {
    http_client: Client,
    config: RemoteClassifierConfig,
}

impl GroqClassifier {
    pub fn new(config: RemoteClassifierConfig) -> Result<Self, RemoteError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client, config })
    }

    /// One HTTP round trip. Returns the raw message content.
    async fn send_chat(&self, request: &ChatRequest<'_>) -> Result<String, RemoteError> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64);
            return Err(RemoteError::RateLimited { retry_after });
        }
        if status.is_server_error() {
            return Err(RemoteError::Server { status: status.as_u16() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Client {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Transport(format!("failed to read chat response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(RemoteError::EmptyResponse)
    }
}

#[async_trait]
impl RemoteClassifier for GroqClassifier {
    async fn classify_remote(&self, name: &str) -> Result<RemoteClassification, RemoteError> {
        let request = build_request(&self.config, name);
        let content = with_retries(&self.config.retry, name, || self.send_chat(&request)).await?;
        debug!("[REMOTE-RAW] '{}':\n{}", name, content);
        parse_classification(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(5));
        assert_eq!(policy.backoff(40), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicUsize::new(0);
        let result = with_retries(&fast_policy(), "Hayat Clinic", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(RemoteError::Server { status: 503 })
            } else {
                Ok("ok")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_final_failure_propagates_after_three_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), RemoteError> = with_retries(&fast_policy(), "Hayat Clinic", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::Transport("connection reset".to_string()))
        })
        .await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), RemoteError> = with_retries(&fast_policy(), "Hayat Clinic", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RemoteError::Client {
                status: 401,
                body: "invalid api key".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(RemoteError::Client { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let calls = AtomicUsize::new(0);
        let result = with_retries(&fast_policy(), "Hayat Clinic", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RemoteError::RateLimited {
                    retry_after: Some(Duration::from_millis(2)),
                })
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parse_well_formed_response() {
        let parsed = parse_classification(
            r#"{"category": "Private Clinic", "confidence": "Medium", "reason": "brand name"}"#,
        )
        .unwrap();
        assert_eq!(parsed.category, "Private Clinic");
        assert_eq!(parsed.confidence, Confidence::Medium);
        assert_eq!(parsed.reason, "brand name");
        assert_eq!(parsed.doctor_name, None);
        assert!(parsed.is_private_clinic());
    }

    #[test]
    fn test_parse_defaults_confidence_to_low() {
        let parsed = parse_classification(r#"{"category": "Hospital"}"#).unwrap();
        assert_eq!(parsed.confidence, Confidence::Low);
        assert!(!parsed.is_private_clinic());
    }

    #[test]
    fn test_parse_keeps_remote_doctor_name() {
        let parsed = parse_classification(
            r#"{"category": "Private Clinic", "confidence": "High", "reason": "", "doctor_name": " Mona Zaki "}"#,
        )
        .unwrap();
        assert_eq!(parsed.doctor_name.as_deref(), Some("Mona Zaki"));

        let parsed =
            parse_classification(r#"{"category": "Private Clinic", "doctor_name": ""}"#).unwrap();
        assert_eq!(parsed.doctor_name, None);
    }

    #[test]
    fn test_parse_rejects_malformed_responses() {
        for content in [
            "",
            "not json",
            r#"Sure! {"category": "Private Clinic"}"#,
            r#"["Private Clinic", "High", "reason"]"#,
            r#"{"confidence": "High"}"#,
            r#"{"category": "   "}"#,
            r#"{"category": 3}"#,
            r#"{"category": "Lab"} {"category": "Hospital"}"#,
        ] {
            assert!(
                matches!(parse_classification(content), Err(RemoteError::Parse(_))),
                "accepted {:?}",
                content
            );
        }
    }

    #[test]
    fn test_only_literal_private_clinic_accepts() {
        for category in ["Hospital", "Medical Center", "Lab", "Pharmacy", "private clinic", "Clinic"] {
            let parsed = parse_classification(&format!(r#"{{"category": "{}"}}"#, category)).unwrap();
            assert!(!parsed.is_private_clinic(), "{}", category);
        }
    }

    #[test]
    fn test_request_shape() {
        let config = RemoteClassifierConfig::new("gsk_test");
        let request = build_request(&config, "Hayat Clinic");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");

        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.ends_with("Name: Hayat Clinic"));
        for category in CATEGORIES {
            assert!(user.contains(category));
        }
        assert!(!user.contains("Address"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(RemoteError::Transport("timeout".into()).is_retryable());
        assert!(RemoteError::RateLimited { retry_after: None }.is_retryable());
        assert!(RemoteError::Server { status: 502 }.is_retryable());
        assert!(!RemoteError::Parse("bad".into()).is_retryable());
        assert!(!RemoteError::EmptyResponse.is_retryable());
    }
}
