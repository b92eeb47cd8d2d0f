//! LTI Outcomes HTTP Layer
//!
//! Provides the outbound boundary for grade passback:
//! - Timeout-bounded HTTP client construction
//! - The [`OutcomeTransport`] seam used by the provider
//! - A reqwest-backed transport issuing one POST per call, never retrying

pub mod client;
pub mod transport;

pub use client::*;
pub use transport::*;
