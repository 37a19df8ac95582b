//! OpenAI-compatible chat-completions gateway.
//!
//! Works against the Hugging Face router, OpenAI and Ollama's `/v1` API.
//! One request per call, bounded by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyline_core::config::LlmConfig;
use tracing::{debug, warn};

use crate::llm::{Completion, CompletionGateway, GatewayError};

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug)]
pub struct HttpCompletionGateway {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl HttpCompletionGateway {
    pub fn from_config(config: &LlmConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GatewayError::Internal(error.to_string()))?;

        let base_url = config.effective_base_url().trim_end_matches('/');
        Ok(Self {
            client,
            endpoint: format!("{base_url}/chat/completions"),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, system_prompt: &'a str, user_text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_text },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn classify(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout(self.timeout_secs)
        } else if error.is_builder() {
            GatewayError::Internal(error.to_string())
        } else if error.is_decode() {
            GatewayError::MalformedResponse(error.to_string())
        } else {
            GatewayError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl CompletionGateway for HttpCompletionGateway {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Completion, GatewayError> {
        debug!(
            event_name = "gateway.request.sent",
            endpoint = %self.endpoint,
            model = %self.model,
            "sending completion request"
        );

        let mut request =
            self.client.post(&self.endpoint).json(&self.request_body(system_prompt, user_text));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| self.classify(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "gateway.response.status",
                status = status.as_u16(),
                "completion service returned non-success status"
            );
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response.text().await.map_err(|error| self.classify(error))?;
        parse_completion(&body)
    }
}

fn parse_completion(body: &str) -> Result<Completion, GatewayError> {
    let response = serde_json::from_str::<ChatResponse>(body)
        .map_err(|error| GatewayError::MalformedResponse(error.to_string()))?;

    if let Some(error) = response.error {
        return Err(GatewayError::Transport(format!("service reported error: {error}")));
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|text| Completion { text })
        .ok_or_else(|| {
            GatewayError::MalformedResponse("response has no choices[0].message.content".into())
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use skyline_core::config::{AppConfig, LlmProvider};

    use super::{parse_completion, HttpCompletionGateway};
    use crate::llm::{CompletionGateway, GatewayError};

    fn config_with_base_url(base_url: Option<&str>) -> skyline_core::config::LlmConfig {
        let mut config = AppConfig::default().llm;
        config.api_key = Some("hf-test".to_string().into());
        config.base_url = base_url.map(str::to_string);
        config
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let gateway = HttpCompletionGateway::from_config(&config_with_base_url(Some(
            "http://localhost:8080/v1/",
        )))
        .expect("gateway");
        assert_eq!(gateway.endpoint(), "http://localhost:8080/v1/chat/completions");

        let mut ollama = config_with_base_url(None);
        ollama.provider = LlmProvider::Ollama;
        let gateway = HttpCompletionGateway::from_config(&ollama).expect("gateway");
        assert_eq!(gateway.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn request_body_carries_system_and_user_messages() {
        let gateway =
            HttpCompletionGateway::from_config(&config_with_base_url(None)).expect("gateway");
        let body = serde_json::to_value(gateway.request_body("be precise", "tall buildings"))
            .expect("serialize");

        assert_eq!(body["model"], "deepseek-ai/DeepSeek-V3.2:novita");
        assert_eq!(body["max_tokens"], 250);
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "be precise"}));
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "tall buildings"}));
    }

    #[test]
    fn parses_first_choice_content() {
        let completion = parse_completion(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"filters\": []}"}}]}"#,
        )
        .expect("completion");
        assert_eq!(completion.text, "{\"filters\": []}");
    }

    #[test]
    fn service_error_object_is_a_transport_failure() {
        let error = parse_completion(r#"{"error": {"message": "model overloaded"}}"#)
            .expect_err("error body");
        assert!(error.is_transport());
    }

    #[test]
    fn missing_choices_is_malformed() {
        let error = parse_completion(r#"{"choices": []}"#).expect_err("no choices");
        assert!(matches!(error, GatewayError::MalformedResponse(_)));

        let error = parse_completion("<html>bad gateway</html>").expect_err("not json");
        assert!(matches!(error, GatewayError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_failure() {
        let mut config = config_with_base_url(Some("http://127.0.0.1:9/v1"));
        config.timeout_secs = 2;
        let gateway = HttpCompletionGateway::from_config(&config).expect("gateway");

        let error = gateway.complete("system", "user").await.expect_err("nothing listens");
        assert!(error.is_transport(), "unexpected error: {error:?}");
    }
}
