//! HTTP client for the backend REST API.
//!
//! This module provides a typed client for the consultation and research
//! services. Non-success statuses are always surfaced as errors.

use async_trait::async_trait;
use lexora_core::{ConversationKind, Message, SessionId};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, Url};

use crate::backend::ConversationBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::{
    ApiErrorResponse, ConversationResponse, CreateSessionResponse, HealthResponse,
    HistoryResponse, SendMessageRequest,
};

/// Client for the conversational REST API.
#[derive(Debug, Clone)]
pub struct SessionClient {
    client: Client,
    base_url: String,
}

impl SessionClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the versioned API (e.g., `https://backend.lexora.uz/api/v1`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client from configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.normalized_base_url())
    }

    /// Create a client with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Headers sent with every request.
    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// URL of a per-session resource. The token is percent-encoded as a
    /// single path segment.
    fn session_url(
        &self,
        kind: ConversationKind,
        session_id: &SessionId,
        suffix: &[&str],
    ) -> Result<Url> {
        let mut url = Url::parse(&self.url(kind.path()))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?
            .push(session_id.as_str())
            .extend(suffix);
        Ok(url)
    }

    /// Turn a non-success response into an error.
    async fn handle_error(response: Response, operation: &'static str) -> ClientError {
        let status = response.status();
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(err) => err.message(),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };
        tracing::warn!(operation, status = status.as_u16(), %message, "Backend request failed");
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Create a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the body has no usable `session_id`.
    pub async fn create_session(&self, kind: ConversationKind) -> Result<SessionId> {
        let url = self.url(&format!("{}/new-session", kind.path()));
        tracing::debug!(?kind, %url, "Creating session");

        let response = self
            .client
            .post(&url)
            .headers(Self::json_headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response, "create_session").await);
        }

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        tracing::info!(?kind, session_id = %body.session_id, "Session created");
        Ok(body.session_id)
    }

    /// Send messages for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the body cannot be decoded.
    pub async fn send_message(
        &self,
        kind: ConversationKind,
        messages: &[Message],
        session_id: &SessionId,
    ) -> Result<ConversationResponse> {
        let url = self.url(kind.path());
        tracing::debug!(?kind, %session_id, count = messages.len(), "Sending messages");

        let request = SendMessageRequest {
            messages,
            session_id,
        };

        let response = self
            .client
            .post(&url)
            .headers(Self::json_headers())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response, "send_message").await);
        }

        let body: ConversationResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        tracing::debug!(
            ?kind,
            %session_id,
            replies = body.messages.len(),
            interrupt = ?body.interrupt_type,
            "Received reply"
        );
        Ok(body)
    }

    /// Fetch the stored history of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the body cannot be decoded.
    pub async fn get_history(
        &self,
        kind: ConversationKind,
        session_id: &SessionId,
    ) -> Result<Vec<Message>> {
        let url = self.session_url(kind, session_id, &["history"])?;

        let response = self
            .client
            .get(url)
            .headers(Self::json_headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response, "get_history").await);
        }

        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(body.messages)
    }

    /// Clear the stored history of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    pub async fn clear_history(&self, kind: ConversationKind, session_id: &SessionId) -> Result<()> {
        let url = self.session_url(kind, session_id, &[])?;

        let response = self
            .client
            .delete(url)
            .headers(Self::json_headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response, "clear_history").await);
        }

        tracing::info!(?kind, %session_id, "History cleared");
        Ok(())
    }

    /// Probe a service's health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the body cannot be decoded.
    pub async fn health(&self, kind: ConversationKind) -> Result<HealthResponse> {
        let url = self.url(&format!("{}/health", kind.service_path()));

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response, "health").await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    // =========================================================================
    // Utility
    // =========================================================================

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ConversationBackend for SessionClient {
    async fn create_session(&self, kind: ConversationKind) -> Result<SessionId> {
        SessionClient::create_session(self, kind).await
    }

    async fn send_message(
        &self,
        kind: ConversationKind,
        messages: &[Message],
        session_id: &SessionId,
    ) -> Result<ConversationResponse> {
        SessionClient::send_message(self, kind, messages, session_id).await
    }

    async fn get_history(
        &self,
        kind: ConversationKind,
        session_id: &SessionId,
    ) -> Result<Vec<Message>> {
        SessionClient::get_history(self, kind, session_id).await
    }

    async fn clear_history(&self, kind: ConversationKind, session_id: &SessionId) -> Result<()> {
        SessionClient::clear_history(self, kind, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexora_core::InterruptKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(id: &str) -> SessionId {
        SessionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn create_chat_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat/new-session"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "chat-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let id = client.create_session(ConversationKind::Chat).await.unwrap();
        assert_eq!(id, session("chat-1"));
    }

    #[tokio::test]
    async fn create_research_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/research/chat/new-session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "res-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(format!("{}/", server.uri()));
        let id = client.create_session(ConversationKind::Research).await.unwrap();
        assert_eq!(id.as_str(), "res-1");
    }

    #[tokio::test]
    async fn create_session_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat/new-session"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let err = client.create_session(ConversationKind::Chat).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn create_session_with_blank_id_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat/new-session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "" })))
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let err = client.create_session(ConversationKind::Chat).await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn send_chat_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "messages": [{ "role": "user", "content": "Can I break a lease early?" }],
                "session_id": "chat-1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{ "role": "assistant", "content": "Under article 544..." }],
                "session_id": "chat-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let response = client
            .send_message(
                ConversationKind::Chat,
                &[Message::user("Can I break a lease early?")],
                &session("chat-1"),
            )
            .await
            .unwrap();

        assert_eq!(response.messages, [Message::assistant("Under article 544...")]);
        assert!(response.interrupt_type.is_none());
    }

    #[tokio::test]
    async fn send_research_message_with_interrupt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/research/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{ "role": "assistant", "content": "I found 2 sources." }],
                "session_id": "res-1",
                "interrupt_type": "source_approval",
                "interrupt_data": {
                    "sources": [
                        {
                            "document_id": "doc-1",
                            "title": "Civil Code",
                            "relevance_score": 0.91,
                            "reasoning": "Directly on point",
                            "url": "https://lex.uz/docs/111181"
                        },
                        {
                            "document_id": "doc-2",
                            "title": "Land Code",
                            "relevance_score": 0.64,
                            "reasoning": "Related",
                            "url": ""
                        }
                    ],
                    "total_sources": 2,
                    "question": "lease termination"
                },
                "interrupt_id": "int-7"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let response = client
            .send_message(
                ConversationKind::Research,
                &[Message::user("lease termination")],
                &session("res-1"),
            )
            .await
            .unwrap();

        let (messages, interrupt) = response.into_parts();
        assert_eq!(messages.len(), 1);
        let interrupt = interrupt.unwrap();
        assert_eq!(interrupt.kind, InterruptKind::SourceApproval);
        assert_eq!(interrupt.id, "int-7");
        assert_eq!(interrupt.data.sources.len(), 2);
        assert_eq!(interrupt.data.sources[1].document_id, "doc-2");
        assert_eq!(interrupt.data.total_sources, Some(2));
    }

    #[tokio::test]
    async fn send_message_server_error_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "detail": "Error processing chat: boom" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let err = client
            .send_message(ConversationKind::Chat, &[Message::user("hi")], &session("c"))
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Error processing chat: boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_message_invalid_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let err = client
            .send_message(ConversationKind::Chat, &[Message::user("hi")], &session("c"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn history_defaults_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/research/chat/res-1/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "res-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let history = client
            .get_history(ConversationKind::Research, &session("res-1"))
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn history_returns_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/qna/chat/chat-1/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "chat-1",
                "messages": [
                    { "role": "user", "content": "q" },
                    { "role": "assistant", "content": "a" }
                ]
            })))
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let history = client
            .get_history(ConversationKind::Chat, &session("chat-1"))
            .await
            .unwrap();
        assert_eq!(history, [Message::user("q"), Message::assistant("a")]);
    }

    #[tokio::test]
    async fn clear_history_uses_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/qna/chat/chat-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": "Session chat-1 cleared successfully" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        client
            .clear_history(ConversationKind::Chat, &session("chat-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn clear_history_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/research/chat/res-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let err = client
            .clear_history(ConversationKind::Research, &session("res-1"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn health_check_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/research/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "healthy", "service": "research" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let health = client.health(ConversationKind::Research).await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.service.as_deref(), Some("research"));
    }

    #[tokio::test]
    async fn trait_object_delegates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/qna/chat/new-session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "t-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let backend: Box<dyn ConversationBackend> = Box::new(SessionClient::new(server.uri()));
        let id = backend.create_session(ConversationKind::Chat).await.unwrap();
        assert_eq!(id.as_str(), "t-1");
    }

    #[tokio::test]
    async fn session_token_is_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/qna/chat/a%2Fb%3Fc%23d/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/qna/chat/a%2Fb%3Fc%23d"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri());
        let odd = session("a/b?c#d");
        client.get_history(ConversationKind::Chat, &odd).await.unwrap();
        client.clear_history(ConversationKind::Chat, &odd).await.unwrap();
    }

    #[tokio::test]
    async fn unusable_base_url_is_reported() {
        let client = SessionClient::new("not a url");
        let err = client
            .get_history(ConversationKind::Chat, &session("s"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn from_config_trims_base_url() {
        let client = SessionClient::from_config(&ClientConfig::new("http://localhost:8000/api/v1/"));
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }
}
