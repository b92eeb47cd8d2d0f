//! LTI Tool Provider
//!
//! Ties the signing primitives of `lti-core` to the transport of `lti-http`:
//! - Verify signed requests arriving from a Tool Consumer
//! - Read, replace and delete grades on the consumer's outcome service

pub mod provider;

pub use provider::*;

pub use lti_core::{
    ConfigurationError, HttpRequestContext, InboundRequest, OutcomeAction, OutcomeError,
    OutcomeRequest, OutcomeResult, OutcomeTarget, Parameters, ResultError, Score,
    SigningContext,
};
pub use lti_http::{HttpConfig, HttpTransport, OutboundRequest, OutcomeTransport, TransportError};
