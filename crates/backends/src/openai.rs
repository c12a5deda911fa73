use crate::{
    parse_hints, user_payload, BackendError, ClassificationHints, ClassifyRequest, ModelBackend,
    SYSTEM_PROMPT,
};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Resolved API key; `None` or empty surfaces a credential error per call.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Remote hosted model. The last-resort tier: its failures are the
/// request's failures, so every error here is precise about its kind.
pub struct OpenAiBackend {
    client: Client,
    cfg: OpenAiConfig,
}

impl OpenAiBackend {
    pub fn new(cfg: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }
}

#[derive(Deserialize)]
struct ChatApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait::async_trait]
impl ModelBackend for OpenAiBackend {
    async fn classify(
        &self,
        request: &ClassifyRequest,
    ) -> Result<ClassificationHints, BackendError> {
        let key = self
            .cfg
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                BackendError::MissingCredential("no API key resolved for remote model".into())
            })?;

        #[derive(serde::Serialize)]
        struct ChatMessage<'a> {
            role: &'static str,
            content: &'a str,
        }
        #[derive(serde::Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
        }

        let user_content = user_payload(request).to_string();
        let body = ChatRequest {
            model: &self.cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.cfg.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BackendError::Transport(format!(
                "unexpected status {}",
                resp.status()
            )));
        }

        let parsed: ChatApiResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();
        parse_hints(content)
    }
}
