use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};

use super::messages;
use super::models::{LabelDelta, Message, Thread};
use super::threads;
use super::transport::MailboxTransport;

const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com";

/// Gmail REST client bound to one access token.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: GMAIL_API_BASE_URL.to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn with_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.http.get(url).bearer_auth(&self.access_token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        self.parse_json_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.http.post(url).bearer_auth(&self.access_token);
        request = match body {
            Some(body) => request.json(body),
            None => request.header(reqwest::header::CONTENT_LENGTH, 0),
        };

        let response = request.send().await?;
        self.parse_json_response(response).await
    }

    fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(endpoint.trim_start_matches('/'));
        Ok(url)
    }

    async fn parse_json_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }
}

#[async_trait]
impl MailboxTransport for GmailClient {
    async fn modify_thread_labels(&self, thread_id: &str, delta: &LabelDelta) -> AppResult<Thread> {
        let endpoint = threads::modify_endpoint(thread_id);
        self.post_json(&endpoint, Some(delta)).await
    }

    async fn trash_message(&self, message_id: &str) -> AppResult<Message> {
        let endpoint = messages::trash_endpoint(message_id);
        self.post_json::<_, ()>(&endpoint, None).await
    }

    async fn trash_thread(&self, thread_id: &str) -> AppResult<Thread> {
        let endpoint = threads::trash_endpoint(thread_id);
        self.post_json::<_, ()>(&endpoint, None).await
    }

    async fn get_thread(&self, thread_id: &str) -> AppResult<Thread> {
        let endpoint = threads::thread_endpoint(thread_id);
        let query = threads::minimal_query();
        self.get_json(&endpoint, Some(&query)).await
    }

    async fn get_message(&self, message_id: &str) -> AppResult<Message> {
        let endpoint = messages::message_endpoint(message_id);
        let query = threads::minimal_query();
        self.get_json(&endpoint, Some(&query)).await
    }
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorEnvelope {
    error: GmailApiError,
}

#[derive(Debug, Deserialize)]
struct GmailApiError {
    code: Option<u16>,
    status: Option<String>,
    message: Option<String>,
    errors: Option<Vec<GmailApiErrorDetail>>,
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorDetail {
    reason: Option<String>,
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "gmail api authorization failed ({status}): {message}"
        ));
    }

    AppError::Api(format!("gmail api request failed ({status}): {message}"))
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<GmailApiErrorEnvelope>(body).ok()?;
    let mut parts = Vec::new();

    if let Some(message) = envelope.error.message {
        parts.push(message);
    }

    if let Some(status) = envelope.error.status {
        parts.push(format!("status={status}"));
    }

    if let Some(code) = envelope.error.code {
        parts.push(format!("code={code}"));
    }

    if let Some(reason) = envelope
        .error
        .errors
        .and_then(|errors| errors.into_iter().find_map(|detail| detail.reason))
    {
        parts.push(format!("reason={reason}"));
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        );

        match error {
            AppError::Auth(message) => {
                assert!(message.contains("invalid authentication credentials"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_not_found_as_api_error() {
        let error = map_api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND","errors":[{"reason":"notFound"}]}}"#,
        );

        match error {
            AppError::Api(message) => {
                assert!(message.contains("Requested entity was not found"));
                assert!(message.contains("reason=notFound"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_error_body_is_kept_verbatim() {
        let error = map_api_error(StatusCode::BAD_GATEWAY, "  upstream down ");
        assert!(error.to_string().contains("upstream down"));
    }

    #[test]
    fn endpoint_url_respects_custom_base() {
        let client = GmailClient::new("token").with_api_base("http://127.0.0.1:9000");
        let url = client
            .endpoint_url(&threads::modify_endpoint("T1"))
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/gmail/v1/users/me/threads/T1/modify"
        );
    }
}
