use super::{FetchedImage, ImageFetcher};
use crate::Result;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::sync::{Arc, Mutex};

/// Canned fetcher that records every requested URL.
#[derive(Clone)]
pub struct MockImageFetcher {
    response: Arc<Mutex<FetchedImage>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockImageFetcher {
    /// Defaults to a 200 response carrying a tiny PNG.
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(FetchedImage {
                status: StatusCode::OK,
                content_type: Some("image/png".to_string()),
                body: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            })),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_status(self, status: StatusCode) -> Self {
        self.response.lock().unwrap().status = status;
        self
    }

    pub fn with_content_type(self, content_type: Option<&str>) -> Self {
        self.response.lock().unwrap().content_type = content_type.map(str::to_string);
        self
    }

    pub fn with_body(self, body: Vec<u8>) -> Self {
        self.response.lock().unwrap().body = body;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn get_requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Default for MockImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for MockImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedImage> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(self.response.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_records_urls() {
        let fetcher = MockImageFetcher::new();
        let url = Url::parse("https://x/y.png").unwrap();

        assert_eq!(fetcher.get_call_count(), 0);
        let fetched = fetcher.fetch(&url).await.unwrap();

        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetcher.get_call_count(), 1);
        assert_eq!(fetcher.get_requested_urls(), vec!["https://x/y.png"]);
    }

    #[tokio::test]
    async fn test_mock_fetcher_custom_response() {
        let fetcher = MockImageFetcher::new()
            .with_status(StatusCode::IM_A_TEAPOT)
            .with_content_type(None)
            .with_body(b"short and stout".to_vec());

        let fetched = fetcher
            .fetch(&Url::parse("https://x/teapot").unwrap())
            .await
            .unwrap();

        assert_eq!(fetched.status, StatusCode::IM_A_TEAPOT);
        assert!(fetched.content_type.is_none());
        assert_eq!(fetched.body, b"short and stout");
    }
}
