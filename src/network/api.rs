use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;

use crate::common::ChatMessage;

use super::error::{ApiError, ApiResult};

const MESSAGES_PATH: &str = "chat/messages";
const SEND_PATH: &str = "chat/send";
const CLEAR_PATH: &str = "chat/messages/clear";

/// The chat backend as seen by the poller and the coordinator.
///
/// An implementation carries its own credentials, so handing one to the
/// poller at start is how the poller receives the session token.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Full message list, in whatever order the backend keeps it.
    async fn fetch_messages(&self) -> ApiResult<Vec<ChatMessage>>;

    /// Posts a message and returns the stored copy with its server id and time.
    async fn send_message(&self, body: &str) -> ApiResult<ChatMessage>;

    async fn clear_messages(&self) -> ApiResult<()>;
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
}

/// `ChatApi` over the REST backend, authenticated with a bearer token.
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpChatApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &str,
    ) -> ApiResult<reqwest::Response> {
        if self.token.is_empty() {
            return Err(ApiError::MissingToken);
        }

        log::debug!("Making {method} request to: {url}");
        let mut request = request.bearer_auth(&self.token).build()?;
        // `.json()` bodies already carry it.
        request
            .headers_mut()
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));
        let response = self.client.execute(request).await?;

        let status = response.status();
        log::debug!("Received {} from: {url}", status.as_u16());

        match ApiError::from_status(status) {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_messages(&self) -> ApiResult<Vec<ChatMessage>> {
        let url = self.endpoint(MESSAGES_PATH);
        let response = self.execute(self.client.get(&url), "GET", &url).await?;
        // The backend answers `null` for an empty room.
        let messages: Option<Vec<ChatMessage>> = response.json().await?;
        Ok(messages.unwrap_or_default())
    }

    async fn send_message(&self, body: &str) -> ApiResult<ChatMessage> {
        let url = self.endpoint(SEND_PATH);
        let request = self
            .client
            .post(&url)
            .json(&SendMessageRequest { message: body });
        let response = self.execute(request, "POST", &url).await?;
        Ok(response.json().await?)
    }

    async fn clear_messages(&self) -> ApiResult<()> {
        let url = self.endpoint(CLEAR_PATH);
        self.execute(self.client.delete(&url), "DELETE", &url).await?;
        Ok(())
    }
}
