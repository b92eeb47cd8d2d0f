//! Inbound OAuth1 signature verification

use tracing::debug;

use crate::oauth::{base_string, signature_matches};
use crate::{ConfigurationError, HttpRequestContext, InboundRequest, SigningContext, OAUTH_SIGNATURE_PARAM};

/// Verifies requests signed by a Tool Consumer with the shared key/secret
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    ctx: SigningContext,
}

impl SignatureVerifier {
    pub fn new(ctx: SigningContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SigningContext {
        &self.ctx
    }

    /// Check the request's `oauth_signature` against a recomputed one.
    ///
    /// A mismatch is `Ok(false)`. Only a request with nothing to compare
    /// against is an error.
    pub fn verify(&self, request: &InboundRequest) -> Result<bool, ConfigurationError> {
        let supplied = request
            .parameters
            .get(OAUTH_SIGNATURE_PARAM)
            .ok_or(ConfigurationError::MissingSignature)?;

        let base = match base_string(&request.method, &request.url, &request.parameters) {
            Ok(base) => base,
            Err(e) => {
                debug!("Cannot rebuild signature base string: {}", e);
                return Ok(false);
            }
        };

        let valid = signature_matches(&self.ctx, &base, supplied);
        if !valid {
            debug!("Signature mismatch for {} {}", request.method, request.url);
        }
        Ok(valid)
    }

    /// Verify the request currently being served
    pub fn verify_request(&self, http: &HttpRequestContext) -> Result<bool, ConfigurationError> {
        self.verify(&http.to_inbound())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::{protocol_parameters, sign};
    use crate::Parameters;

    const URL: &str = "https://tool.test/lti/outcomes";

    fn signed_request(ctx: &SigningContext) -> InboundRequest {
        let mut params = protocol_parameters(ctx);
        params.insert("lis_result_sourcedid".to_string(), "abc-123".to_string());
        params.insert("custom_note".to_string(), "grade & go".to_string());

        let signed = sign(ctx, URL, "POST", &params).unwrap();
        params.insert(OAUTH_SIGNATURE_PARAM.to_string(), signed.signature);

        InboundRequest::new(URL, "POST", params)
    }

    #[test]
    fn test_verify_valid_signature() {
        let ctx = SigningContext::new("key", "secret");
        let verifier = SignatureVerifier::new(ctx.clone());
        assert_eq!(verifier.verify(&signed_request(&ctx)), Ok(true));
    }

    #[test]
    fn test_verify_detects_any_mutation() {
        let ctx = SigningContext::new("key", "secret");
        let verifier = SignatureVerifier::new(ctx.clone());
        let request = signed_request(&ctx);

        for key in request.parameters.keys() {
            let mut tampered = request.clone();
            tampered
                .parameters
                .entry(key.clone())
                .and_modify(|v| v.push('x'));
            assert_eq!(verifier.verify(&tampered), Ok(false), "mutating {} should fail", key);
        }

        let mut tampered = request.clone();
        tampered.url = "https://tool.test/lti/other".to_string();
        assert_eq!(verifier.verify(&tampered), Ok(false));

        let mut tampered = request;
        tampered.method = "GET".to_string();
        assert_eq!(verifier.verify(&tampered), Ok(false));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let ctx = SigningContext::new("key", "secret");
        let verifier = SignatureVerifier::new(SigningContext::new("key", "other"));
        assert_eq!(verifier.verify(&signed_request(&ctx)), Ok(false));
    }

    #[test]
    fn test_verify_missing_signature_is_error() {
        let verifier = SignatureVerifier::new(SigningContext::new("key", "secret"));
        let request = InboundRequest::new(URL, "POST", Parameters::new());
        assert_eq!(verifier.verify(&request), Err(ConfigurationError::MissingSignature));
    }

    #[test]
    fn test_verify_empty_signature_is_mismatch() {
        let verifier = SignatureVerifier::new(SigningContext::new("key", "secret"));
        let mut params = Parameters::new();
        params.insert(OAUTH_SIGNATURE_PARAM.to_string(), String::new());
        assert_eq!(verifier.verify(&InboundRequest::new(URL, "POST", params)), Ok(false));
    }

    #[test]
    fn test_verify_unparsable_url_is_mismatch() {
        let verifier = SignatureVerifier::new(SigningContext::new("key", "secret"));
        let mut params = Parameters::new();
        params.insert(OAUTH_SIGNATURE_PARAM.to_string(), "c2ln".to_string());
        assert_eq!(verifier.verify(&InboundRequest::new("::", "POST", params)), Ok(false));
    }
}
