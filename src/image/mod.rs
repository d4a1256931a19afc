//! Image acquisition and normalization
//!
//! Turns caller-supplied images (inline data URIs, remote URLs, local files)
//! into [`NormalizedImage`](crate::models::NormalizedImage) data URIs that can
//! be handed to a model.

pub mod fetcher;
pub mod mime;
pub mod mock;
pub mod normalizer;

pub use fetcher::HttpImageFetcher;
pub use mock::MockImageFetcher;
pub use normalizer::{normalize, normalize_file, normalize_remote};

use crate::Result;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};

/// Raw HTTP response for an image URL, before any content checks.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedImage {
    /// Reason phrase for the status, falling back to the numeric code.
    pub fn status_text(&self) -> String {
        self.status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| self.status.as_u16().to_string())
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage>;
}
