use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::TranslateConfig;
use crate::error::Result;
use super::{BatchTranslator, TranslationReply, prompt::build_batch_prompt};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub block_reason_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    /// Concatenated text of every part of every candidate
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect()
    }

    /// Reason given by the provider when the prompt was refused
    pub fn block_reason(&self) -> Option<String> {
        if let Some(feedback) = &self.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Some(feedback.block_reason_message.clone().unwrap_or_else(|| reason.clone()));
            }
        }

        self.candidates
            .iter()
            .filter_map(|candidate| candidate.finish_reason.as_deref())
            .find(|reason| matches!(*reason, "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT"))
            .map(|reason| reason.to_string())
    }

    /// Map a decoded response onto a typed reply
    pub fn into_reply(self) -> TranslationReply {
        let text = self.text();
        if text.trim().is_empty() {
            if let Some(reason) = self.block_reason() {
                return TranslationReply::Blocked(reason);
            }
            return TranslationReply::Empty;
        }
        TranslationReply::from_text(&text)
    }
}

/// Translator backed by the Gemini `generateContent` endpoint
pub struct GeminiTranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl GeminiTranslator {
    pub fn new(config: TranslateConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn request(&self, prompt: String) -> std::result::Result<GenerateContentResponse, String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let url = self.url();
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(format!("Gemini API error {}: {}", status, message));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))
    }
}

#[async_trait]
impl BatchTranslator for GeminiTranslator {
    async fn translate_batch(
        &self,
        blocks: &[String],
        source_language: &str,
        target_language: &str,
    ) -> TranslationReply {
        let prompt = build_batch_prompt(blocks, source_language, target_language);
        debug!("Prompt:\n{}", prompt);

        let response = match self.request(prompt).await {
            Ok(response) => response,
            Err(message) => {
                error!("Gemini call failed: {}", message);
                return TranslationReply::Failed(message);
            }
        };

        debug!("Raw Gemini response: {}", response.text());

        let reply = response.into_reply();
        match &reply {
            TranslationReply::Blocked(reason) => warn!("Request blocked by Gemini: {}", reason),
            TranslationReply::Empty => warn!("Gemini response contained no text"),
            _ => {}
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some("hi".to_string()) }],
            }],
            generation_config: GenerationConfig { temperature: 0.7 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert!(value["generationConfig"]["temperature"].as_f64().unwrap() > 0.69);
    }

    #[test]
    fn test_text_reply() {
        let response = decode(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hola\n\n"},{"text":"Adiós"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(
            response.into_reply(),
            TranslationReply::Blocks(vec!["Hola".to_string(), "Adiós".to_string()])
        );
    }

    #[test]
    fn test_blocked_prompt() {
        let response = decode(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert_eq!(response.into_reply(), TranslationReply::Blocked("SAFETY".to_string()));
    }

    #[test]
    fn test_blocked_candidate() {
        let response = decode(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert_eq!(response.into_reply(), TranslationReply::Blocked("SAFETY".to_string()));
    }

    #[test]
    fn test_no_text() {
        let response = decode(r#"{"candidates":[{"content":{"parts":[]},"finishReason":"STOP"}]}"#);
        assert_eq!(response.into_reply(), TranslationReply::Empty);
        assert_eq!(decode("{}").into_reply(), TranslationReply::Empty);
    }

    #[test]
    fn test_url() {
        let mut config = TranslateConfig::default();
        config.endpoint = "http://localhost:8080/".to_string();
        let translator = GeminiTranslator::new(config, "key".to_string()).unwrap();
        assert_eq!(
            translator.url(),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades() {
        let mut config = TranslateConfig::default();
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let translator = GeminiTranslator::new(config, "key".to_string()).unwrap();

        let reply = translator.translate_batch(&["Hello".to_string()], "en", "es").await;
        assert!(matches!(reply, TranslationReply::Failed(_)));
    }
}
