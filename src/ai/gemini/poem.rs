use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::PoemModel;
use crate::models::PoemRequest;
use crate::{prompts, Result};
use async_trait::async_trait;

pub struct GeminiPoemClient {
    http: GeminiHttpClient,
}

impl GeminiPoemClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new(api_key, model, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(request: &PoemRequest) -> GenerateContentRequest {
        let image = &request.photo_data_uri;

        GenerateContentRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompts::POEM_SYSTEM.to_string(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.payload().to_string(),
                        },
                    },
                    Part::Text {
                        text: prompts::POEM_USER.to_string(),
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(1000),
                response_mime_type: Some("application/json".to_string()),
                // Gemini takes an OpenAPI-style subset without `additionalProperties`.
                response_schema: Some(serde_json::json!({
                    "type": "OBJECT",
                    "properties": {
                        "poem": {
                            "type": "STRING",
                            "description": "A poem inspired by the image."
                        }
                    },
                    "required": ["poem"]
                })),
            }),
        }
    }

    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let candidate = response.candidates.first()?;
        if let Some(reason) = &candidate.finish_reason {
            tracing::debug!("Gemini finish reason: {}", reason);
        }

        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect();

        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl PoemModel for GeminiPoemClient {
    async fn complete(&self, request: &PoemRequest) -> Result<Option<String>> {
        tracing::debug!("Requesting poem from Gemini (model: {})", self.http.model());

        let response = self
            .http
            .generate_content(&Self::build_request(request))
            .await?;

        Ok(Self::extract_text(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedImage;
    use crate::Error;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PoemRequest {
        PoemRequest::new(NormalizedImage::parse("data:image/jpeg;base64,/9j/").unwrap())
    }

    fn make_client(server: &MockServer) -> GeminiPoemClient {
        GeminiPoemClient::new("test-key".to_string(), "gemini-2.0-flash".to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_complete_sends_inline_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("\"inlineData\""))
            .and(body_string_contains("\"mimeType\":\"image/jpeg\""))
            .and(body_string_contains("\"data\":\"/9j/\""))
            .and(body_string_contains("\"responseSchema\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "{\"poem\": \"Amber hush\"}" }]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = make_client(&server).complete(&request()).await.unwrap();
        assert_eq!(output.as_deref(), Some("{\"poem\": \"Amber hush\"}"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_no_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let output = make_client(&server).complete(&request()).await.unwrap();
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_api_error_returns_model_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let err = make_client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}
