//! AI service integration for poem generation
//!
//! The model is reached through the [`PoemModel`] capability so providers
//! (OpenAI, Gemini) and test doubles are interchangeable. [`PoemGenerator`]
//! owns the prompt/schema contract and turns raw model output into a poem.

pub mod gemini;
pub mod invoker;
pub mod mock;
pub mod openai;

pub use gemini::GeminiPoemClient;
pub use invoker::PoemGenerator;
pub use mock::MockPoemModel;
pub use openai::OpenAiPoemClient;

use crate::models::PoemRequest;
use crate::Result;
use async_trait::async_trait;

/// "Given an image data URI, return poem text."
///
/// Implementations return the raw structured output text (a JSON object with a
/// `poem` field), or `None` when the provider produced no output at all.
#[async_trait]
pub trait PoemModel: Send + Sync {
    async fn complete(&self, request: &PoemRequest) -> Result<Option<String>>;
}
