use super::PoemModel;
use crate::models::PoemRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted model: replays queued outputs in order, cycling once exhausted.
#[derive(Clone)]
pub struct MockPoemModel {
    responses: Arc<Mutex<Vec<Option<String>>>>,
    failure: Arc<Mutex<Option<String>>>,
    requests: Arc<Mutex<Vec<PoemRequest>>>,
}

impl MockPoemModel {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a well-formed `{ "poem": ... }` output.
    pub fn with_poem(self, poem: &str) -> Self {
        let output = serde_json::json!({ "poem": poem }).to_string();
        self.with_response(Some(output))
    }

    /// Queue a raw output exactly as a provider would return it.
    pub fn with_response(self, response: Option<String>) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<PoemRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockPoemModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoemModel for MockPoemModel {
    async fn complete(&self, request: &PoemRequest) -> Result<Option<String>> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Model(message));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response
            Ok(Some(
                serde_json::json!({ "poem": "A quiet frame,\nA borrowed light." }).to_string(),
            ))
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
