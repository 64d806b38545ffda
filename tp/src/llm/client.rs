//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless completion client - each call is independent (fresh context)
///
/// This is the planner's only external collaborator. Every stage of the
/// pipeline issues one independent request/response call; no conversation
/// state is kept between calls, so any two invocations may run concurrently.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (suspends until complete)
    ///
    /// Transport, auth, and service failures surface as [`LlmError`].
    /// An empty response body is a valid result, not an error.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::llm::{StopReason, TokenUsage};
    use std::sync::Mutex;
    use tracing::debug;

    /// Scripted outcome for one mock completion call
    pub enum MockReply {
        /// Successful completion with the given text
        Text(String),
        /// Successful completion with no content at all
        Empty,
        /// Upstream API failure
        ApiFailure { status: u16, message: String },
    }

    impl MockReply {
        pub fn text(s: impl Into<String>) -> Self {
            MockReply::Text(s.into())
        }

        pub fn failure(status: u16, message: impl Into<String>) -> Self {
            MockReply::ApiFailure {
                status,
                message: message.into(),
            }
        }
    }

    /// Mock LLM client for unit tests
    ///
    /// Replays scripted replies in order and captures every request so
    /// tests can assert on prompt contents and sampling parameters.
    pub struct MockLlmClient {
        replies: Vec<MockReply>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        pub fn new(replies: Vec<MockReply>) -> Self {
            debug!(reply_count = %replies.len(), "MockLlmClient::new: called");
            Self {
                replies,
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Number of completion calls issued so far
        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Copies of every request received, in call order
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let idx = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request);
                requests.len() - 1
            };
            debug!(%idx, "MockLlmClient::complete: called");

            match self.replies.get(idx) {
                Some(MockReply::Text(text)) => Ok(CompletionResponse {
                    content: Some(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                }),
                Some(MockReply::Empty) => Ok(CompletionResponse {
                    content: None,
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                }),
                Some(MockReply::ApiFailure { status, message }) => Err(LlmError::ApiError {
                    status: *status,
                    message: message.clone(),
                }),
                None => {
                    debug!("MockLlmClient::complete: no more mock replies");
                    Err(LlmError::InvalidResponse("No more mock replies".to_string()))
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::llm::Message;

        fn make_request(text: &str) -> CompletionRequest {
            CompletionRequest {
                system_prompt: "Test".to_string(),
                messages: vec![Message::user(text)],
                temperature: 0.5,
                json_output: false,
                max_tokens: 1000,
            }
        }

        #[tokio::test]
        async fn test_mock_client_replays_in_order() {
            let client = MockLlmClient::new(vec![MockReply::text("Reply 1"), MockReply::text("Reply 2")]);

            let resp1 = client.complete(make_request("one")).await.unwrap();
            assert_eq!(resp1.content, Some("Reply 1".to_string()));

            let resp2 = client.complete(make_request("two")).await.unwrap();
            assert_eq!(resp2.content, Some("Reply 2".to_string()));

            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_captures_requests() {
            let client = MockLlmClient::new(vec![MockReply::Empty]);

            client.complete(make_request("captured text")).await.unwrap();

            let requests = client.requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].messages[0].content, "captured text");
            assert!((requests[0].temperature - 0.5).abs() < f32::EPSILON);
        }

        #[tokio::test]
        async fn test_mock_client_scripted_failure() {
            let client = MockLlmClient::new(vec![MockReply::failure(500, "kaboom")]);

            let err = client.complete(make_request("boom")).await.unwrap_err();
            match err {
                LlmError::ApiError { status, message } => {
                    assert_eq!(status, 500);
                    assert_eq!(message, "kaboom");
                }
                other => panic!("Expected ApiError, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);

            let result = client.complete(make_request("no script")).await;
            assert!(result.is_err());
        }
    }
}
