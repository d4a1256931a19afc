//! Data models and structures
//!
//! Defines the values flowing through the poem pipeline (caller input,
//! normalized images, model request/response shapes, outcomes), the history
//! entries persisted by the front end, and runtime configuration.

use crate::{Error, Result};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Caller-supplied request: an inline data URI, a remote URL, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemInput {
    #[serde(default, alias = "imageDataUri", skip_serializing_if = "Option::is_none")]
    pub inline_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PoemInput {
    pub fn inline(data_uri: impl Into<String>) -> Self {
        Self {
            inline_image: Some(data_uri.into()),
            image_url: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            inline_image: None,
            image_url: Some(url.into()),
        }
    }
}

/// An image as a `data:<mime>;base64,<payload>` URI whose MIME type is `image/*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedImage {
    uri: String,
    payload_start: usize,
}

impl NormalizedImage {
    /// Parse an existing data URI, rejecting anything that is not a base64
    /// encoded `image/*` payload.
    pub fn parse(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();

        let rest = uri
            .strip_prefix(DATA_PREFIX)
            .ok_or_else(|| Error::Validation("Image is not a data URI".to_string()))?;
        let marker = rest
            .find(BASE64_MARKER)
            .ok_or_else(|| Error::Validation("Image data URI is not base64 encoded".to_string()))?;

        if !is_image_media_type(&rest[..marker]) {
            return Err(Error::Validation(format!(
                "Unsupported media type in data URI: {}",
                &rest[..marker]
            )));
        }

        let payload_start = DATA_PREFIX.len() + marker + BASE64_MARKER.len();
        if !uri[payload_start..]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        {
            return Err(Error::Validation(
                "Image data URI payload is not valid base64".to_string(),
            ));
        }

        Ok(Self { uri, payload_start })
    }

    /// Build a data URI from raw bytes and the declared content type.
    ///
    /// The content type is embedded verbatim, parameters included.
    pub fn from_bytes(content_type: &str, bytes: &[u8]) -> Result<Self> {
        if !is_image_media_type(content_type) {
            return Err(Error::UnsupportedMedia);
        }

        use base64::Engine as _;
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        let uri = format!("{}{}{}{}", DATA_PREFIX, content_type, BASE64_MARKER, payload);
        let payload_start = uri.len() - payload.len();

        Ok(Self { uri, payload_start })
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Full media type as written in the URI, including any parameters.
    pub fn media_type(&self) -> &str {
        &self.uri[DATA_PREFIX.len()..self.payload_start - BASE64_MARKER.len()]
    }

    /// MIME type without parameters, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        self.media_type()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// The base64 payload following the `;base64,` marker.
    pub fn payload(&self) -> &str {
        &self.uri[self.payload_start..]
    }

    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }

    pub fn into_string(self) -> String {
        self.uri
    }
}

/// The one rule deciding whether a declared type is an image: an exact,
/// case-sensitive `image/` prefix.
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

impl TryFrom<String> for NormalizedImage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<NormalizedImage> for String {
    fn from(image: NormalizedImage) -> Self {
        image.uri
    }
}

impl fmt::Display for NormalizedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Validated image input, before any network access.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Inline(NormalizedImage),
    Remote(reqwest::Url),
}

/// Input contract of the model call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoemRequest {
    pub photo_data_uri: NormalizedImage,
}

impl PoemRequest {
    pub fn new(photo_data_uri: NormalizedImage) -> Self {
        Self { photo_data_uri }
    }
}

/// Output contract of the model call.
#[derive(Debug, Clone, Deserialize)]
pub struct PoemOutput {
    pub poem: Option<String>,
}

/// A generated poem together with the exact image it was generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct PoemResult {
    pub poem: String,
    pub image: NormalizedImage,
}

/// What the front end receives from one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success { poem: String, image: NormalizedImage },
    Failure { error: String },
}

impl GenerationOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<PoemResult> for GenerationOutcome {
    fn from(result: PoemResult) -> Self {
        Self::Success {
            poem: result.poem,
            image: result.image,
        }
    }
}

#[derive(Serialize)]
struct OutcomeWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    poem: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for GenerationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success { poem, image } => OutcomeWire {
                success: true,
                poem: Some(poem),
                image: Some(image.as_str()),
                error: None,
            },
            Self::Failure { error } => OutcomeWire {
                success: false,
                poem: None,
                image: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

/// One saved generation, newest entries first in the history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub image: String,
    pub poem: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
}

impl AiProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Gemini => "gemini-2.0-flash",
        }
    }
}

impl FromStr for AiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "gemini" | "googleai" => Ok(AiProvider::Gemini),
            other => Err(Error::Config(format!(
                "Unknown AI_PROVIDER '{}'. Expected 'openai' or 'gemini'",
                other
            ))),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::OpenAi => f.write_str("OpenAI"),
            AiProvider::Gemini => f.write_str("Gemini"),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: AiProvider,
    pub model: String,
    pub api_key: String,
    pub history_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        env_file_loaded(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("AI_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::Gemini,
        };

        let key_name = match provider {
            AiProvider::OpenAi => "OPENAI_API_KEY",
            AiProvider::Gemini => "GEMINI_API_KEY",
        };
        let api_key =
            var(key_name).ok_or_else(|| Error::Config(format!("{} not set", key_name)))?;

        Ok(Self {
            provider,
            model: var("AI_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            api_key,
            history_dir: history_dir_from_lookup(&lookup),
        })
    }

    /// History location alone, for commands that never call a model.
    pub fn history_dir_from_env() -> Result<PathBuf> {
        env_file_loaded(dotenvy::dotenv())?;
        Ok(history_dir_from_lookup(|key| std::env::var(key).ok()))
    }
}

/// A missing `.env` is fine; one that exists but cannot be read or parsed is not.
fn env_file_loaded<T>(loaded: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn history_dir_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("HISTORY_DIR")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".picture-poet"))
}
