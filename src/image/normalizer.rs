use super::{mime, ImageFetcher};
use crate::models::{is_image_media_type, ImageSource, NormalizedImage};
use crate::{Error, Result};
use reqwest::Url;
use std::path::Path;

/// Resolve a validated source into a data URI.
///
/// Inline images are returned untouched; only remote sources hit the network.
pub async fn normalize(source: ImageSource, fetcher: &dyn ImageFetcher) -> Result<NormalizedImage> {
    match source {
        ImageSource::Inline(image) => Ok(image),
        ImageSource::Remote(url) => normalize_remote(&url, fetcher).await,
    }
}

/// Download an image and embed it as `data:<content-type>;base64,<payload>`.
pub async fn normalize_remote(url: &Url, fetcher: &dyn ImageFetcher) -> Result<NormalizedImage> {
    let fetched = fetcher.fetch(url).await?;

    if !fetched.status.is_success() {
        tracing::warn!("Image fetch for {} returned {}", url, fetched.status);
        return Err(Error::Fetch(fetched.status_text()));
    }

    let content_type = match fetched.content_type.as_deref() {
        Some(content_type) if is_image_media_type(content_type) => content_type,
        other => {
            tracing::warn!("Image URL {} served content type {:?}", url, other);
            return Err(Error::UnsupportedMedia);
        }
    };

    NormalizedImage::from_bytes(content_type, &fetched.body)
}

/// Read a local image file, sniffing its type from the leading bytes.
pub async fn normalize_file(path: &Path) -> Result<NormalizedImage> {
    let bytes = tokio::fs::read(path).await?;
    let mime = mime::detect_image_mime(&bytes).ok_or(Error::UnsupportedMedia)?;

    tracing::debug!(
        "Read {} ({}, {} bytes)",
        path.display(),
        mime,
        bytes.len()
    );

    NormalizedImage::from_bytes(mime, &bytes)
}
