use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::types::{GenerateRequest, GenerateResponse};
use crate::{AgentError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

// ─── ClientConfig ─────────────────────────────────────────────────────────

/// Where and how to reach the `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    /// Model resource name including the `models/` prefix.
    pub model: String,
    pub api_key: Option<String>,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

// ─── GeminiClient ─────────────────────────────────────────────────────────

/// Thin async wrapper over one `reqwest::Client`.
///
/// No retry happens here; see [`crate::ProjectAgent`] for that.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{base_url}/{model}:generateContent`, without the key.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model.trim_start_matches('/')
        )
    }

    /// POST `request` and decode the JSON reply. Any non-200 status is an
    /// [`AgentError::Status`].
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self.send_ok(request).await?;
        Ok(response.json::<GenerateResponse>().await?)
    }

    /// POST `request` and return the raw body of a 200 reply, undecoded.
    pub async fn generate_raw(&self, request: &GenerateRequest) -> Result<String> {
        let response = self.send_ok(request).await?;
        Ok(response.text().await?)
    }

    async fn send_ok(&self, request: &GenerateRequest) -> Result<reqwest::Response> {
        let response = self.send(request).await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send(&self, request: &GenerateRequest) -> Result<reqwest::Response> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(AgentError::MissingApiKey)?;
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", key)])
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenerationConfig;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard, key: Option<&str>) -> GeminiClient {
        GeminiClient::new(ClientConfig {
            base_url: format!("{}/v1beta", server.url()),
            api_key: key.map(str::to_string),
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let client = GeminiClient::new(ClientConfig {
            base_url: "https://example.test/v1beta/".into(),
            model: "models/gemini-2.5-pro".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn generate_posts_prompt_and_reads_first_candidate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "k-123".into()))
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"parts": [{"text": "hello"}]}],
                "generationConfig": {"maxOutputTokens": 2048, "topK": 40}
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("k-123"));
        let request = GenerateRequest::from_prompt("hello", Some(GenerationConfig::default()));
        let response = client.generate(&request).await.unwrap();

        assert_eq!(response.reply_text(), r#"{"a":1}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = client_for(&server, Some("k"));
        let err = client
            .generate(&GenerateRequest::from_prompt("x", None))
            .await
            .unwrap_err();
        match err {
            AgentError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn raw_body_of_error_status_is_not_returned() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("k"));
        let err = client
            .generate_raw(&GenerateRequest::from_prompt("x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server, None);
        let err = client
            .generate(&GenerateRequest::from_prompt("x", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey));
    }
}
