use super::client::OpenAiHttpClient;
use super::types::{
    ChatCompletionRequest, ChatMessage, ChatMessageContent, JsonSchema, MessagePart,
    ResponseFormat,
};
use crate::ai::PoemModel;
use crate::models::PoemRequest;
use crate::{prompts, Error, Result};
use async_trait::async_trait;

pub struct OpenAiPoemClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiPoemClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new(api_key, client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(&self, request: &PoemRequest) -> ChatCompletionRequest {
        let system_message = ChatMessage {
            role: "system".to_string(),
            content: Some(ChatMessageContent::Text(prompts::POEM_SYSTEM.to_string())),
            refusal: None,
        };

        let user_message = ChatMessage {
            role: "user".to_string(),
            content: Some(ChatMessageContent::Parts(vec![
                MessagePart::text(prompts::POEM_USER),
                MessagePart::image(request.photo_data_uri.as_str()),
            ])),
            refusal: None,
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![system_message, user_message],
            max_completion_tokens: 1000,
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchema {
                    name: "poem".to_string(),
                    schema: prompts::poem_output_schema(),
                    strict: true,
                },
            }),
        }
    }
}

#[async_trait]
impl PoemModel for OpenAiPoemClient {
    async fn complete(&self, request: &PoemRequest) -> Result<Option<String>> {
        tracing::debug!("Requesting poem from OpenAI (model: {})", self.model);

        let response = self.http.chat_completion(&self.build_request(request)).await?;

        let Some(choice) = response.choices.first() else {
            return Ok(None);
        };

        if let Some(refusal) = &choice.message.refusal {
            tracing::warn!("OpenAI refused to write a poem: {}", refusal);
            return Err(Error::Model(format!("Model refused the request: {}", refusal)));
        }

        Ok(match &choice.message.content {
            Some(ChatMessageContent::Text(text)) => Some(text.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedImage;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PoemRequest {
        PoemRequest::new(NormalizedImage::parse("data:image/png;base64,iVBORw0K").unwrap())
    }

    fn make_client(server: &MockServer) -> OpenAiPoemClient {
        OpenAiPoemClient::new("test-key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_complete_sends_image_and_schema() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_string_contains("\"model\":\"gpt-4o-mini\""))
            .and(body_string_contains("data:image/png;base64,iVBORw0K"))
            .and(body_string_contains("\"json_schema\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "{\"poem\":\"Line one\\nLine two\"}"
                    },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = make_client(&server).complete(&request()).await.unwrap();
        assert_eq!(output.as_deref(), Some("{\"poem\":\"Line one\\nLine two\"}"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_no_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let output = make_client(&server).complete(&request()).await.unwrap();
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_refusal_is_model_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": null, "refusal": "no" },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let err = make_client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }

    #[tokio::test]
    async fn test_api_error_returns_model_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = make_client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Model(_)));
        assert!(err.to_string().contains("429"));
    }
}
