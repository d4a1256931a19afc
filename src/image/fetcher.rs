use super::{FetchedImage, ImageFetcher};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::time::Duration;

pub struct HttpImageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage> {
        tracing::debug!("Fetching image from {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch image from {}: {}", url, e);
                Error::Fetch(e.to_string())
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // Error bodies are never used, skip downloading them.
        let body = if status.is_success() {
            response
                .bytes()
                .await
                .map_err(|e| Error::Fetch(e.to_string()))?
                .to_vec()
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Fetched {} ({}, {:?}, {} bytes)",
            url,
            status,
            content_type,
            body.len()
        );

        Ok(FetchedImage {
            status,
            content_type,
            body,
        })
    }
}
