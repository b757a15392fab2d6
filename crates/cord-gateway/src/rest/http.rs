//! HTTP REST client
//!
//! `reqwest` implementation of [`RestApi`].

use super::{DmChannel, RestApi, RestError};
use crate::events::UserPayload;
use crate::protocol::GatewayInfo;
use async_trait::async_trait;
use cord_common::ClientConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client sending the configured authorization and user agent on every call
#[derive(Debug, Clone)]
pub struct HttpRestClient {
    client: reqwest::Client,
    base: String,
}

impl HttpRestClient {
    /// Build a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, RestError> {
        let mut authorization = HeaderValue::from_str(&config.authorization())?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = self.url(endpoint);
        tracing::trace!(method = %method, url = %url, "REST request");
        self.client.request(method, url)
    }

    async fn checked(response: Response) -> Result<Response, RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RestError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RestError> {
        let bytes = Self::checked(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RestApi for HttpRestClient {
    async fn current_user(&self) -> Result<UserPayload, RestError> {
        let response = self.request(Method::GET, "/users/@me").send().await?;
        Self::decode(response).await
    }

    async fn gateway_info(&self, bot: bool) -> Result<GatewayInfo, RestError> {
        let endpoint = if bot { "/gateway/bot" } else { "/gateway" };
        let response = self.request(Method::GET, endpoint).send().await?;
        Self::decode(response).await
    }

    async fn create_message(&self, channel_id: &str, content: &str) -> Result<(), RestError> {
        let response = self
            .request(Method::POST, &format!("/channels/{channel_id}/messages"))
            .json(&json!({ "content": content }))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), RestError> {
        let response = self
            .request(Method::DELETE, &format!("/channels/{channel_id}"))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn create_dm_channel(&self, recipient_id: &str) -> Result<DmChannel, RestError> {
        let response = self
            .request(Method::POST, "/users/@me/channels")
            .json(&json!({ "recipient_id": recipient_id }))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn channel_messages(&self, channel_id: &str) -> Result<Vec<Value>, RestError> {
        let response = self
            .request(Method::GET, &format!("/channels/{channel_id}/messages"))
            .send()
            .await?;
        Self::decode(response).await
    }
}
