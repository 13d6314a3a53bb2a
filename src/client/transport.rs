use std::future::Future;

use log::debug;
use serde_json::Value;

use crate::client::ClientError;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-2xx reply into [`ClientError::Status`].
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Status {
                status: self.status,
                reason: self.status_text,
            })
        }
    }
}

/// The HTTP seam the star and chat clients talk through.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpReply, ClientError>> + Send;

    fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<HttpReply, ClientError>> + Send;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("exosky-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn finish(response: reqwest::Response) -> Result<HttpReply, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        Ok(HttpReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, ClientError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        Self::finish(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, ClientError> {
        debug!("POST {url}");
        let response = self.client.post(url).json(body).send().await?;
        Self::finish(response).await
    }
}
