use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::{Error, Result};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat Completions transport for vision poem requests.
pub struct OpenAiHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiHttpClient {
    pub fn new(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("OpenAI rejected poem request ({}): {}", status, body);
            return Err(Error::Model(format!("OpenAI API error (status {})", status)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unreadable chat completion: {}\nBody: {}", e, body);
            Error::Model(format!("Failed to parse OpenAI response: {}", e))
        })
    }
}
