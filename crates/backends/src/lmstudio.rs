//! OpenAI-compatible local inference server (LM Studio and friends).
//!
//! The on-device tier: no credential, and a server that is not running is
//! reported as unavailable so the pipeline can fall through.

use crate::{
    parse_hints, user_payload, BackendError, ClassificationHints, ClassifyRequest, ModelBackend,
    SYSTEM_PROMPT,
};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct LmStudioConfig {
    pub base_url: String,
    pub model: String,
}

pub struct LmStudioBackend {
    client: Client,
    cfg: LmStudioConfig,
}

impl LmStudioBackend {
    pub fn new(cfg: LmStudioConfig) -> Self {
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
impl ModelBackend for LmStudioBackend {
    async fn classify(
        &self,
        request: &ClassifyRequest,
    ) -> Result<ClassificationHints, BackendError> {
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
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

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
