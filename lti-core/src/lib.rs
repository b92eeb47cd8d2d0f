//! LTI Outcomes Core - signing, verification and XML for grade passback
//!
//! This crate provides the Tool Provider primitives:
//! - OAuth1 HMAC-SHA1 request signing and body hashing
//! - Inbound signature verification
//! - Basic Outcomes request envelopes (read/replace/delete)
//! - Response field extraction
//!
//! Nothing here performs I/O; the HTTP boundary lives in `lti-http`.

pub mod context;
pub mod envelope;
pub mod error;
pub mod oauth;
pub mod response;
pub mod types;
pub mod verifier;

pub use context::*;
pub use envelope::*;
pub use error::*;
pub use oauth::{body_hash, build_result_auth, sign, SignedRequest};
pub use response::*;
pub use types::*;
pub use verifier::*;

/// IMS Basic Outcomes XML namespace
pub const OUTCOMES_NAMESPACE: &str = "http://www.imsglobal.org/services/ltiv1p1/xsd/imsoms_v1p0";

/// Protocol version carried in every request header
pub const OUTCOMES_VERSION: &str = "V1.0";

/// Launch parameter naming the consumer's outcome service
pub const OUTCOME_SERVICE_URL_PARAM: &str = "lis_outcome_service_url";

/// Launch parameter naming the gradable item/learner association
pub const RESULT_SOURCEDID_PARAM: &str = "lis_result_sourcedid";

/// Parameter carrying the inbound OAuth1 signature
pub const OAUTH_SIGNATURE_PARAM: &str = "oauth_signature";

/// Status code reported by a consumer on success
pub const CODE_MAJOR_SUCCESS: &str = "success";
