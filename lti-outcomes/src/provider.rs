//! Tool Provider
//!
//! Each send returns its own [`OutcomeResult`]; the provider keeps no
//! per-call state, so one instance can serve concurrent tasks.

use tracing::{debug, info, warn};

use lti_core::{
    build_result_auth, parse_response, ConfigurationError, Envelope, HttpRequestContext,
    InboundRequest, OutcomeAction, OutcomeError, OutcomeRequest, OutcomeResult, OutcomeTarget,
    Parameters, ResultError, Score, SignatureVerifier, SigningContext,
};
use lti_http::{HttpConfig, HttpTransport, OutboundRequest, OutcomeTransport, TransportError};

/// Tool Provider bound to one consumer key/secret
pub struct ToolProvider<T = HttpTransport> {
    verifier: SignatureVerifier,
    transport: T,
}

impl ToolProvider<HttpTransport> {
    /// Provider sending over HTTP with the given client configuration
    pub fn with_http(ctx: SigningContext, config: HttpConfig) -> Result<Self, TransportError> {
        Ok(Self::new(ctx, HttpTransport::new(config)?))
    }
}

impl<T: OutcomeTransport> ToolProvider<T> {
    pub fn new(ctx: SigningContext, transport: T) -> Self {
        Self {
            verifier: SignatureVerifier::new(ctx),
            transport,
        }
    }

    pub fn context(&self) -> &SigningContext {
        self.verifier.context()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Verify an inbound request's OAuth1 signature
    pub fn verify(&self, request: &InboundRequest) -> Result<bool, ConfigurationError> {
        self.verifier.verify(request)
    }

    /// Verify the HTTP request currently being served
    pub fn verify_request(&self, http: &HttpRequestContext) -> Result<bool, ConfigurationError> {
        self.verifier.verify_request(http)
    }

    /// Build an outcome request body from untyped input
    pub fn build_result_body(
        &self,
        sourced_id: &str,
        action: &str,
        score: Option<&str>,
    ) -> Result<String, OutcomeError> {
        let request = OutcomeRequest::parse(sourced_id, action, score)?;
        Ok(Envelope::new(&request).to_xml()?)
    }

    /// `Authorization` header value for POSTing `body` to `url`
    pub fn build_result_auth(&self, url: &str, body: &str) -> Result<String, ConfigurationError> {
        Ok(build_result_auth(self.context(), url, body)?.authorization)
    }

    /// Send one outcome request using the consumer's launch parameters.
    ///
    /// `params` must carry `lis_outcome_service_url` and `lis_result_sourcedid`.
    /// A `failure` status from the consumer is `Ok` with `success == false`.
    pub async fn send_result(
        &self,
        params: &Parameters,
        action: OutcomeAction,
        score: Option<Score>,
    ) -> Result<OutcomeResult, OutcomeError> {
        let target = OutcomeTarget::from_params(params)?;
        let request = OutcomeRequest::new(target.sourced_id.as_str(), action, score)?;
        self.send(&target.service_url, &request).await
    }

    /// Send a validated request to an outcome service
    pub async fn send(
        &self,
        service_url: &str,
        request: &OutcomeRequest,
    ) -> Result<OutcomeResult, OutcomeError> {
        let envelope = Envelope::new(request);
        let body = envelope.to_xml()?;
        let signed = build_result_auth(self.context(), service_url, &body)?;

        debug!(
            "Sending {} for {} (message {})",
            request.action(),
            request.sourced_id(),
            envelope.message_identifier()
        );

        let outbound = OutboundRequest {
            url: service_url.to_string(),
            authorization: signed.authorization,
            body,
        };

        let bytes = self.transport.post(&outbound).await.map_err(|e| {
            warn!("Outcome {} to {} failed: {}", request.action(), service_url, e);
            ResultError::Transport(e.to_string())
        })?;

        let result = parse_response(&bytes, request.action())?;

        if result.success {
            info!("Outcome {} for {} succeeded", request.action(), request.sourced_id());
        } else {
            warn!(
                "Outcome {} for {} reported {}: {}",
                request.action(),
                request.sourced_id(),
                result.code_major.as_deref().unwrap_or("no status"),
                result.description.as_deref().unwrap_or("")
            );
        }

        Ok(result)
    }

    /// Read the grade for the launch being served
    pub async fn send_read(&self, http: &HttpRequestContext) -> Result<OutcomeResult, OutcomeError> {
        self.send_result(&http.form, OutcomeAction::Read, None).await
    }

    /// Replace the grade for the launch being served
    pub async fn send_replace(
        &self,
        http: &HttpRequestContext,
        score: Score,
    ) -> Result<OutcomeResult, OutcomeError> {
        self.send_result(&http.form, OutcomeAction::Replace, Some(score)).await
    }

    /// Delete the grade for the launch being served
    pub async fn send_delete(&self, http: &HttpRequestContext) -> Result<OutcomeResult, OutcomeError> {
        self.send_result(&http.form, OutcomeAction::Delete, None).await
    }
}
