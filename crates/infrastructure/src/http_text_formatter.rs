//! HTTP chat-completion adapter for the text formatter port.

use async_trait::async_trait;
use redressa_application::TextFormatter;
use redressa_core::{AppError, AppResult};
use serde_json::Value;

/// Calls an OpenAI-compatible chat-completion endpoint to reformat text.
///
/// Every failure maps to [`AppError::Upstream`] so the formatting service
/// can substitute its local template; no retries happen here.
pub struct HttpTextFormatter {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpTextFormatter {
    /// Creates a formatter adapter against the given endpoint and model.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextFormatter for HttpTextFormatter {
    async fn format(&self, prompt: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    }
                ],
            }))
            .send()
            .await
            .map_err(|error| {
                AppError::Upstream(format!("text formatter transport error: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "text formatter returned status {status}"
            )));
        }

        let payload: Value = response.json().await.map_err(|error| {
            AppError::Upstream(format!("text formatter returned invalid JSON: {error}"))
        })?;

        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Upstream("text formatter response missing message content".to_owned())
            })?;

        Ok(content.to_owned())
    }
}
