//! Mock Text Generator for testing.
//!
//! Configurable implementation of the TextGenerator port so the pipeline
//! and orchestrator can run without a real language model.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Echo fallback once the queue is empty
//! - Simulated delays
//! - Error injection
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let generator = MockTextGenerator::new()
//!     .with_response("Hello, I'm the assistant!")
//!     .with_error(GenerationError::EmptyResponse);
//!
//! assert_eq!(generator.generate(request).await?, "Hello, I'm the assistant!");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{GenerationError, GenerationRequest, TextGenerator};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Error(GenerationError),
}

/// Mock text generator.
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Reply with "<mode>: <message>" when the queue is empty.
    echo: bool,
    delay: Duration,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockTextGenerator {
    /// Creates a mock that answers "Mock response" once its queue is empty.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            echo: false,
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock that echoes mode and message once its queue is empty.
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.responses).push_back(MockResponse::Success(content.into()));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: GenerationError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this generator.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_response(&self, request: &GenerationRequest) -> MockResponse {
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            if self.echo {
                MockResponse::Success(format!("{}: {}", request.mode, request.message))
            } else {
                MockResponse::Success("Mock response".to_string())
            }
        })
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        lock(&self.calls).push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response(&request) {
            MockResponse::Success(content) => Ok(content),
            MockResponse::Error(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ConversationMode;

    fn request(message: &str) -> GenerationRequest {
        GenerationRequest::new(ConversationMode::Consult, "system", message)
    }

    #[tokio::test]
    async fn returns_queued_responses_in_order() {
        let generator = MockTextGenerator::new()
            .with_response("first")
            .with_response("second");

        assert_eq!(generator.generate(request("a")).await.unwrap(), "first");
        assert_eq!(generator.generate(request("b")).await.unwrap(), "second");
        assert_eq!(generator.generate(request("c")).await.unwrap(), "Mock response");
    }

    #[tokio::test]
    async fn returns_injected_error() {
        let generator = MockTextGenerator::new().with_error(GenerationError::unavailable("down"));

        let result = generator.generate(request("a")).await;

        assert_eq!(result, Err(GenerationError::unavailable("down")));
    }

    #[tokio::test]
    async fn echo_fallback_includes_mode_and_message() {
        let generator = MockTextGenerator::echo();
        assert_eq!(generator.generate(request("hi")).await.unwrap(), "consult: hi");
    }

    #[tokio::test]
    async fn tracks_calls() {
        let generator = MockTextGenerator::new();
        generator.generate(request("one")).await.unwrap();
        generator.generate(request("two")).await.unwrap();

        assert_eq!(generator.call_count(), 2);
        assert_eq!(generator.get_calls()[1].message, "two");

        generator.clear_calls();
        assert_eq!(generator.call_count(), 0);
    }
}
