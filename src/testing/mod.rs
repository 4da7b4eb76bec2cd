use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ConsoleError;
use crate::http::{ApiRequest, ApiResponse, Transport};

/// Transport that answers with a fixed sequence of responses and records
/// every request it was given.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ConsoleError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| panic!("no scripted response left for {} {}", request.method, request.path)))
    }
}
