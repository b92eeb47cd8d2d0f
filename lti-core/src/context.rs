//! Adapter from the HTTP request being served to an [`InboundRequest`]

use crate::{InboundRequest, Parameters};

/// The parts of a live HTTP request needed for verification and grade passback.
///
/// Filled in by whatever web layer hosts the provider; `form` also serves as
/// the launch-parameter source for the send wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestContext {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub form: Parameters,
}

impl HttpRequestContext {
    pub fn new(scheme: &str, host: &str, path: &str) -> Self {
        Self {
            scheme: scheme.to_lowercase(),
            host: host.to_string(),
            port: None,
            path: path.to_string(),
            form: Parameters::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_form(mut self, form: Parameters) -> Self {
        self.form = form;
        self
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.form.insert(key.to_string(), value.to_string());
        self
    }

    fn default_port(&self) -> Option<u16> {
        match self.scheme.as_str() {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        }
    }

    /// Request URL: scheme, host, non-default port and path
    pub fn url(&self) -> String {
        let mut url = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port.filter(|p| Some(*p) != self.default_port()) {
            url.push_str(&format!(":{}", port));
        }
        if !self.path.starts_with('/') {
            url.push('/');
        }
        url.push_str(&self.path);
        url
    }

    /// Signed launches and callbacks are always form POSTs
    pub fn to_inbound(&self) -> InboundRequest {
        InboundRequest::new(self.url(), "POST", self.form.clone())
    }
}
