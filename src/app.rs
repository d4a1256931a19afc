//! Application orchestration for turning a submitted image into a poem.

use crate::ai::{GeminiPoemClient, OpenAiPoemClient, PoemGenerator, PoemModel};
use crate::image::{self, HttpImageFetcher, ImageFetcher};
use crate::models::{
    AiProvider, Config, GenerationOutcome, ImageSource, PoemInput, PoemRequest, PoemResult,
};
use crate::validate::validate_input;
use crate::{Error, Result};
use tracing::{error, info, warn};

const INVALID_INPUT: &str = "Invalid input.";
const NO_IMAGE: &str = "No image provided.";
const GENERIC_FAILURE: &str = "Failed to generate poem.";

/// Validates, normalizes and hands images to the model, one request at a time.
pub struct App {
    fetcher: Box<dyn ImageFetcher>,
    generator: PoemGenerator,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub fetcher: Box<dyn ImageFetcher>,
    pub model: Box<dyn PoemModel>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            fetcher: services.fetcher,
            generator: PoemGenerator::new(services.model),
        }
    }

    /// Construct an app talking to the configured provider.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool for image fetches and model calls.
        let http_client = reqwest::Client::new();

        let model: Box<dyn PoemModel> = match config.provider {
            AiProvider::OpenAi => Box::new(OpenAiPoemClient::new_with_client(
                config.api_key.clone(),
                config.model.clone(),
                http_client.clone(),
            )),
            AiProvider::Gemini => Box::new(GeminiPoemClient::new_with_client(
                config.api_key.clone(),
                config.model.clone(),
                http_client.clone(),
            )),
        };
        info!("Poem provider: {} (model: {})", config.provider, config.model);

        Self::with_services(AppServices {
            fetcher: Box::new(HttpImageFetcher::new_with_client(http_client)),
            model,
        })
    }

    /// Run one generation request. Never fails: every error becomes a
    /// [`GenerationOutcome::Failure`] carrying a user-facing message.
    pub async fn generate(&self, input: &PoemInput) -> GenerationOutcome {
        match self.run(input).await {
            Ok(result) => {
                info!("Poem generated ({} chars)", result.poem.len());
                result.into()
            }
            Err(e) => {
                error!("Poem generation failed: {}", e);
                GenerationOutcome::failure(failure_message(&e))
            }
        }
    }

    async fn run(&self, input: &PoemInput) -> Result<PoemResult> {
        let source = validate_input(input).map_err(|e| {
            warn!("Rejected generation input: {}", e);
            Error::Validation(INVALID_INPUT.to_string())
        })?;

        if let ImageSource::Remote(url) = &source {
            info!("Resolving image from {}", url);
        }
        let image = image::normalize(source, self.fetcher.as_ref()).await?;

        if image.is_empty() {
            return Err(Error::Validation(NO_IMAGE.to_string()));
        }

        self.generator.generate(PoemRequest::new(image)).await
    }
}

fn failure_message(error: &Error) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockPoemModel;
    use crate::image::MockImageFetcher;

    #[test]
    fn test_failure_message_falls_back_when_blank() {
        assert_eq!(
            failure_message(&Error::Model(String::new())),
            "Failed to generate poem."
        );
        assert_eq!(
            failure_message(&Error::Model("Model returned no output.".to_string())),
            "Model returned no output."
        );
    }

    #[tokio::test]
    async fn test_empty_inline_payload_is_no_image() {
        let model = MockPoemModel::new();
        let app = App::with_services(AppServices {
            fetcher: Box::new(MockImageFetcher::new()),
            model: Box::new(model.clone()),
        });

        let outcome = app
            .generate(&PoemInput::inline("data:image/png;base64,"))
            .await;

        assert_eq!(outcome, GenerationOutcome::failure("No image provided."));
        assert_eq!(model.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_remote_body_is_no_image() {
        let model = MockPoemModel::new();
        let app = App::with_services(AppServices {
            fetcher: Box::new(MockImageFetcher::new().with_body(Vec::new())),
            model: Box::new(model.clone()),
        });

        let outcome = app.generate(&PoemInput::url("https://x/empty.png")).await;

        assert_eq!(outcome, GenerationOutcome::failure("No image provided."));
        assert_eq!(model.get_call_count(), 0);
    }

    #[test]
    fn test_from_config_builds_each_provider() {
        for provider in [AiProvider::OpenAi, AiProvider::Gemini] {
            let config = Config {
                provider,
                model: provider.default_model().to_string(),
                api_key: "key".to_string(),
                history_dir: std::path::PathBuf::from("unused"),
            };
            let _app = App::from_config(&config);
        }
    }
}
