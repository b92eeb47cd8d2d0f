//! Outcome request transport

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};

use crate::{create_http_client, HttpConfig, TransportError};

/// Content type of every outcome request
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Longest response excerpt kept in a status error
const MAX_ERROR_BODY: usize = 512;

/// A signed outcome POST, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Consumer's outcome service URL
    pub url: String,
    /// `Authorization` header value
    pub authorization: String,
    /// XML body, byte-identical to what was hashed for the signature
    pub body: String,
}

/// Sends outcome requests to a Tool Consumer
#[async_trait]
pub trait OutcomeTransport: Send + Sync {
    /// POST the request once and return the raw response body.
    ///
    /// Non-2xx responses and timeouts are errors.
    async fn post(&self, request: &OutboundRequest) -> Result<Vec<u8>, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = create_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl OutcomeTransport for HttpTransport {
    async fn post(&self, request: &OutboundRequest) -> Result<Vec<u8>, TransportError> {
        debug!("POST outcome request to {}", request.url);

        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .header(AUTHORIZATION, request.authorization.as_str())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Outcome service {} returned status: {}", request.url, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!("Outcome service returned {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl HttpTransport {
    fn classify(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.config.timeout_secs)
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::Request(e)
        }
    }
}
