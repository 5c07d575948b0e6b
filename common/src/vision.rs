use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use serde_json::{Value, json};

use crate::{
    env_config::VisionConfig,
    error::{AppError, Res},
};

/// Instruction sent with every ticket photo.
pub const TICKET_PROMPT: &str = r#"Read this Penalty Charge Notice and reply with a JSON object using exactly these keys:
{
  "numberPlate": "vehicle registration",
  "pcnNumber": "PCN reference",
  "amount": "penalty amount in pounds, number only",
  "date": "date of the contravention",
  "location": "where the contravention happened",
  "contravention": "contravention description",
  "council": "issuing council or authority",
  "paymentDueDate": "payment due date"
}
After the JSON, transcribe all visible text on the notice, noting anything about
signage, timing, payment machines, accessibility or loading."#;

/// Boundary to the image-reading oracle. The reply is free text with no
/// guaranteed structure.
#[async_trait]
pub trait VisionOracle: Send + Sync {
    async fn describe(&self, image: &[u8], mime_type: &str, prompt: &str) -> Res<String>;
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiVision {
    http: reqwest::Client,
    config: VisionConfig,
}

impl OpenAiVision {
    pub fn new(config: VisionConfig) -> Self {
        OpenAiVision {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl VisionOracle for OpenAiVision {
    async fn describe(&self, image: &[u8], mime_type: &str, prompt: &str) -> Res<String> {
        let encoded = general_purpose::STANDARD.encode(image);
        let body = json!({
            "model": self.config.model,
            "max_tokens": 1000,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:{};base64,{}", mime_type, encoded) }
                    }
                ]
            }]
        });

        let response: Value = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Internal("Vision reply had no message content".to_string()))
    }
}
