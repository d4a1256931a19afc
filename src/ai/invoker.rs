use super::PoemModel;
use crate::models::{PoemOutput, PoemRequest, PoemResult};
use crate::{Error, Result};

/// Invokes the model for one normalized image and enforces its output contract.
pub struct PoemGenerator {
    model: Box<dyn PoemModel>,
}

impl PoemGenerator {
    pub fn new(model: Box<dyn PoemModel>) -> Self {
        Self { model }
    }

    pub async fn generate(&self, request: PoemRequest) -> Result<PoemResult> {
        tracing::debug!(
            "Requesting poem for {} image ({} base64 chars)",
            request.photo_data_uri.mime_type(),
            request.photo_data_uri.payload().len()
        );

        let output = self.model.complete(&request).await.map_err(|e| match e {
            Error::Model(_) => e,
            other => Error::Model(format!("Model request failed: {}", other)),
        })?;

        let text = output.ok_or_else(|| Error::Model("Model returned no output.".to_string()))?;
        let poem = parse_poem(&text)?;

        tracing::info!("Generated poem with {} lines", poem.lines().count());

        Ok(PoemResult {
            poem,
            image: request.photo_data_uri,
        })
    }
}

/// Decode `{ "poem": "..." }`, tolerating a Markdown code fence around it.
fn parse_poem(text: &str) -> Result<String> {
    let json = strip_code_fence(text.trim());

    let output: PoemOutput = serde_json::from_str(json).map_err(|e| {
        tracing::error!("Failed to parse model output: {}\nOutput: {}", e, text);
        Error::Model(format!("Model returned malformed output: {}", e))
    })?;

    match output.poem {
        Some(poem) if !poem.trim().is_empty() => Ok(poem),
        _ => Err(Error::Model("Model returned an empty poem.".to_string())),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
