//! OAuth 1.0a HMAC-SHA1 signing
//!
//! Stateless functions: every input (key, secret, URL, method, parameters)
//! is passed explicitly, so there is no signer object to reset between calls.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha1::{Digest, Sha1};
use url::Url;

use crate::{ConfigurationError, Parameters, SigningContext, OAUTH_SIGNATURE_PARAM};

type HmacSha1 = Hmac<Sha1>;

/// Only supported signature method
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// OAuth protocol version sent with every request
pub const OAUTH_VERSION: &str = "1.0";

/// Parameter binding a signature to the request body
pub const BODY_HASH_PARAM: &str = "oauth_body_hash";

const NONCE_LENGTH: usize = 32;

/// Signature and the matching `Authorization` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Base64-encoded HMAC-SHA1 signature
    pub signature: String,
    /// Header value, e.g. `OAuth oauth_body_hash="...", ...`
    pub authorization: String,
}

impl SignedRequest {
    /// The full `Authorization: ...` header line
    pub fn header_line(&self) -> String {
        format!("Authorization: {}", self.authorization)
    }
}

/// RFC 3986 percent-encoding (unreserved: `A-Z a-z 0-9 - . _ ~`)
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Split a URL into its signature base URL and its query parameters.
///
/// Scheme and host are lower-cased, default ports dropped, query and fragment removed.
pub fn normalize_url(url: &str) -> Result<(String, Vec<(String, String)>), ConfigurationError> {
    let parsed = Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ConfigurationError::InvalidUrl(format!("{}: missing host", url)))?;

    let mut base = format!("{}://{}", parsed.scheme(), host.to_lowercase());
    // Url::port() is None for the scheme's default port
    if let Some(port) = parsed.port() {
        base.push_str(&format!(":{}", port));
    }
    base.push_str(parsed.path());

    let query = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok((base, query))
}

/// Build the signature base string for a request.
///
/// Query parameters from `url` join `params`; on a key collision the explicit
/// parameter wins. `oauth_signature` is never part of the base string.
pub fn base_string(method: &str, url: &str, params: &Parameters) -> Result<String, ConfigurationError> {
    let (base_url, query) = normalize_url(url)?;

    let mut merged: Parameters = query.into_iter().collect();
    for (key, value) in params {
        merged.insert(key.clone(), value.clone());
    }

    let mut pairs: Vec<(String, String)> = merged
        .iter()
        .filter(|(key, _)| key.as_str() != OAUTH_SIGNATURE_PARAM)
        .map(|(key, value)| (percent_encode(key), percent_encode(value)))
        .collect();
    pairs.sort();

    let normalized = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_url),
        percent_encode(&normalized)
    ))
}

fn mac(ctx: &SigningContext, base_string: &str) -> HmacSha1 {
    // No token secret in two-legged LTI exchanges
    let key = format!("{}&", percent_encode(ctx.consumer_secret()));
    // HMAC pads or hashes the key to the block size, so no length is rejected
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base_string.as_bytes());
    mac
}

/// Compute the base64 signature of a base string
pub fn compute_signature(ctx: &SigningContext, base_string: &str) -> String {
    STANDARD.encode(mac(ctx, base_string).finalize().into_bytes())
}

/// Check a supplied base64 signature against a base string in constant time.
///
/// A signature that is not valid base64 is a mismatch.
pub fn signature_matches(ctx: &SigningContext, base_string: &str, supplied: &str) -> bool {
    match STANDARD.decode(supplied) {
        Ok(bytes) => mac(ctx, base_string).verify_slice(&bytes).is_ok(),
        Err(_) => false,
    }
}

/// Sign a request and format its `Authorization` header.
///
/// `params` must already carry the protocol parameters (see [`protocol_parameters`]).
pub fn sign(
    ctx: &SigningContext,
    url: &str,
    method: &str,
    params: &Parameters,
) -> Result<SignedRequest, ConfigurationError> {
    let base = base_string(method, url, params)?;
    let signature = compute_signature(ctx, &base);
    let authorization = authorization_header(params, &signature);

    Ok(SignedRequest {
        signature,
        authorization,
    })
}

fn authorization_header(params: &Parameters, signature: &str) -> String {
    let mut fields: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, _)| key.starts_with("oauth_") && key.as_str() != OAUTH_SIGNATURE_PARAM)
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    fields.push((OAUTH_SIGNATURE_PARAM, signature));
    fields.sort();

    let joined = fields
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", joined)
}

/// Fresh protocol parameters for one outbound request
pub fn protocol_parameters(ctx: &SigningContext) -> Parameters {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect();

    let mut params = Parameters::new();
    params.insert("oauth_consumer_key".to_string(), ctx.consumer_key().to_string());
    params.insert("oauth_nonce".to_string(), nonce);
    params.insert("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string());
    params.insert("oauth_timestamp".to_string(), chrono::Utc::now().timestamp().to_string());
    params.insert("oauth_version".to_string(), OAUTH_VERSION.to_string());
    params
}

/// Base64-encoded SHA-1 digest of the exact body bytes
pub fn body_hash(body: &[u8]) -> String {
    STANDARD.encode(Sha1::digest(body))
}

/// Sign an outbound outcome POST, binding the signature to `body`.
pub fn build_result_auth(
    ctx: &SigningContext,
    url: &str,
    body: &str,
) -> Result<SignedRequest, ConfigurationError> {
    sign_body(ctx, url, body, protocol_parameters(ctx))
}

pub(crate) fn sign_body(
    ctx: &SigningContext,
    url: &str,
    body: &str,
    mut params: Parameters,
) -> Result<SignedRequest, ConfigurationError> {
    params.insert(BODY_HASH_PARAM.to_string(), body_hash(body.as_bytes()));
    sign(ctx, url, "POST", &params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_params() -> Parameters {
        let mut params = Parameters::new();
        params.insert("oauth_consumer_key".to_string(), "key".to_string());
        params.insert("oauth_nonce".to_string(), "abc123".to_string());
        params.insert("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string());
        params.insert("oauth_timestamp".to_string(), "1700000000".to_string());
        params.insert("oauth_version".to_string(), OAUTH_VERSION.to_string());
        params
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a b&c=d~e.f_g-h"), "a%20b%26c%3Dd~e.f_g-h");
        assert_eq!(percent_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_normalize_url() {
        let (base, query) = normalize_url("HTTP://LMS.Example.com:80/grade?b=2&a=1#frag").unwrap();
        assert_eq!(base, "http://lms.example.com/grade");
        assert_eq!(query, vec![("b".to_string(), "2".to_string()), ("a".to_string(), "1".to_string())]);

        let (base, _) = normalize_url("https://lms.example.com:8443/grade").unwrap();
        assert_eq!(base, "https://lms.example.com:8443/grade");

        let (base, _) = normalize_url("https://lms.example.com:443/grade").unwrap();
        assert_eq!(base, "https://lms.example.com/grade");

        assert!(matches!(normalize_url("not a url"), Err(ConfigurationError::InvalidUrl(_))));
    }

    #[test]
    fn test_base_string() {
        let mut params = Parameters::new();
        params.insert("z".to_string(), "last one".to_string());
        params.insert("a".to_string(), "1".to_string());
        params.insert(OAUTH_SIGNATURE_PARAM.to_string(), "ignored".to_string());

        let base = base_string("post", "https://lms.test/outcomes?c=3", &params).unwrap();
        assert_eq!(
            base,
            "POST&https%3A%2F%2Flms.test%2Foutcomes&a%3D1%26c%3D3%26z%3Dlast%2520one"
        );
    }

    #[test]
    fn test_known_signature() {
        let ctx = SigningContext::new("key", "secret");
        let signed = sign(&ctx, "https://lms.test/outcomes", "POST", &fixed_params()).unwrap();
        assert_eq!(signed.signature, "D8eRZdRNTxHY+0o/Sg3Wk+v+hT4=");

        let base = base_string("POST", "https://lms.test/outcomes", &fixed_params()).unwrap();
        assert!(signature_matches(&ctx, &base, &signed.signature));
    }

    #[test]
    fn test_signature_matches_rejects_garbage() {
        let ctx = SigningContext::new("key", "secret");
        let base = "POST&x&y";
        assert!(!signature_matches(&ctx, base, "not base64!"));
        assert!(!signature_matches(&ctx, base, ""));
        let other = SigningContext::new("key", "other");
        assert!(!signature_matches(&other, base, &compute_signature(&ctx, base)));
    }

    #[test]
    fn test_sign_header_format() {
        let ctx = SigningContext::new("key", "secret");
        let signed = sign(&ctx, "https://lms.test/outcomes", "POST", &fixed_params()).unwrap();

        assert!(signed.authorization.starts_with("OAuth oauth_consumer_key=\"key\", "));
        assert!(signed
            .authorization
            .contains(&format!("oauth_signature=\"{}\"", percent_encode(&signed.signature))));
        assert!(signed.header_line().starts_with("Authorization: OAuth "));
    }

    #[test]
    fn test_body_hash() {
        // SHA-1 of the empty string
        assert_eq!(body_hash(b""), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
    }

    #[test]
    fn test_signature_bound_to_body() {
        let ctx = SigningContext::new("key", "secret");
        let url = "https://lms.test/outcomes";
        let a = sign_body(&ctx, url, "<xml>0.5</xml>", fixed_params()).unwrap();
        let b = sign_body(&ctx, url, "<xml>0.6</xml>", fixed_params()).unwrap();
        let again = sign_body(&ctx, url, "<xml>0.5</xml>", fixed_params()).unwrap();

        assert_ne!(a.signature, b.signature);
        assert_eq!(a, again);
    }

    #[test]
    fn test_build_result_auth_carries_body_hash() {
        let ctx = SigningContext::new("key", "secret");
        let body = "<imsx_POXEnvelopeRequest/>";
        let signed = build_result_auth(&ctx, "https://lms.test/outcomes", body).unwrap();

        let expected = format!("oauth_body_hash=\"{}\"", percent_encode(&body_hash(body.as_bytes())));
        assert!(signed.authorization.contains(&expected));
        assert!(signed.authorization.contains("oauth_nonce="));
        assert!(signed.authorization.contains("oauth_signature_method=\"HMAC-SHA1\""));
    }

    #[test]
    fn test_protocol_parameters_are_fresh() {
        let ctx = SigningContext::new("key", "secret");
        let a = protocol_parameters(&ctx);
        let b = protocol_parameters(&ctx);
        assert_eq!(a["oauth_nonce"].len(), NONCE_LENGTH);
        assert_ne!(a["oauth_nonce"], b["oauth_nonce"]);
        assert_eq!(a["oauth_consumer_key"], "key");
    }
}
