use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use anyhow::{Context, Result, anyhow};

use crate::attachment::Attachment;

/// Relative path of the generation endpoint
pub const GENERATE_PATH: &str = "/chat/generate";

/// One chat submission, encoded as multipart form data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub user_id: String,
    pub user_query: String,
    pub file: Option<Attachment>,
}

impl ChatRequest {
    /// `user_id` and `user_query` are always present; `file` only when a
    /// file was selected.
    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new()
            .text("user_id", self.user_id)
            .text("user_query", self.user_query);

        if let Some(file) = self.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .context("Invalid attachment MIME type")?;
            form = form.part("file", part);
        }

        Ok(form)
    }
}

/// Successful reply from the generation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Deserialize)]
struct RootResponse {
    message: String,
}

/// HTTP client bound to the backend base address
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the request to `/chat/generate`.
    ///
    /// Network errors, non-2xx statuses and malformed bodies all come back
    /// as `Err`; nothing is retried.
    pub async fn generate(&self, request: ChatRequest) -> Result<ChatReply> {
        let url = format!("{}{}", self.base_url, GENERATE_PATH);
        let has_file = request.file.is_some();
        tracing::debug!(%url, has_file, "sending chat request");

        let form = request.into_form()?;

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Could not reach {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Chat request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatReply = response
            .json()
            .await
            .context("Malformed chat response")?;
        Ok(reply)
    }

    /// Fetch the greeting from the backend root, to check it is reachable.
    pub async fn ping(&self) -> Result<String> {
        let url = format!("{}/", self.base_url);

        let response = self.client.get(&url).send().await
            .with_context(|| format!("Could not reach {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Backend root returned status: {}", response.status()));
        }

        let root: RootResponse = response.json().await
            .context("Malformed root response")?;
        Ok(root.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_request() -> ChatRequest {
        ChatRequest {
            user_id: "td-7".into(),
            user_query: "Summarize this".into(),
            file: None,
        }
    }

    async fn received_body(server: &MockServer) -> String {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        String::from_utf8_lossy(&requests[0].body).into_owned()
    }

    #[tokio::test]
    async fn generate_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "Here is a summary",
                "id": 12,
                "file_name": null
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let reply = client.generate(text_request()).await.unwrap();

        assert_eq!(reply.response, "Here is a summary");
        assert_eq!(reply.id, Some(12));
        assert_eq!(reply.file_name, None);
    }

    #[tokio::test]
    async fn generate_sends_text_fields_without_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "ok"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        client.generate(text_request()).await.unwrap();

        let body = received_body(&server).await;
        assert!(body.contains("name=\"user_id\""), "got: {body}");
        assert!(body.contains("td-7"));
        assert!(body.contains("name=\"user_query\""));
        assert!(body.contains("Summarize this"));
        assert!(!body.contains("name=\"file\""));
    }

    #[tokio::test]
    async fn generate_sends_file_with_name_and_mime() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "ok",
                "file_name": "notes.txt"
            })))
            .mount(&server)
            .await;

        let mut request = text_request();
        request.file = Some(Attachment::new("notes.txt", b"line one".to_vec()));

        let client = ApiClient::new(&server.uri());
        let reply = client.generate(request).await.unwrap();
        assert_eq!(reply.file_name.as_deref(), Some("notes.txt"));

        let body = received_body(&server).await;
        assert!(body.contains("name=\"user_id\""));
        assert!(body.contains("name=\"user_query\""));
        assert!(body.contains("name=\"file\"; filename=\"notes.txt\""), "got: {body}");
        assert!(body.contains("text/plain"));
        assert!(body.contains("line one"));
    }

    #[tokio::test]
    async fn generate_fails_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let err = client.generate(text_request()).await.unwrap_err();
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn generate_fails_on_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "wrong field"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        assert!(client.generate(text_request()).await.is_err());
    }

    #[tokio::test]
    async fn generate_fails_when_unreachable() {
        // Port 9 (discard) is not expected to run an HTTP server
        let client = ApiClient::new("http://127.0.0.1:9");
        assert!(client.generate(text_request()).await.is_err());
    }

    #[tokio::test]
    async fn ping_reads_root_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Hello from FastAPI!"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/", server.uri()));
        assert_eq!(client.base_url(), server.uri());
        assert_eq!(client.ping().await.unwrap(), "Hello from FastAPI!");
    }
}
