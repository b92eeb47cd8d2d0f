//! Data model for outcome exchanges
//!
//! Protocol parameters arrive as loosely-typed string maps; everything past
//! the boundary works with the validated types defined here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{ConfigurationError, OUTCOME_SERVICE_URL_PARAM, RESULT_SOURCEDID_PARAM};

/// String-keyed request or launch parameters
pub type Parameters = BTreeMap<String, String>;

/// Consumer key/secret pair shared with the Tool Consumer
#[derive(Clone, PartialEq, Eq)]
pub struct SigningContext {
    consumer_key: String,
    consumer_secret: String,
}

impl SigningContext {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }
}

impl fmt::Debug for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningContext")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// A signed request received from a Tool Consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub url: String,
    pub method: String,
    pub parameters: Parameters,
}

impl InboundRequest {
    pub fn new(url: impl Into<String>, method: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            parameters,
        }
    }
}

/// Basic Outcomes operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeAction {
    Read,
    Replace,
    Delete,
}

impl OutcomeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeAction::Read => "read",
            OutcomeAction::Replace => "replace",
            OutcomeAction::Delete => "delete",
        }
    }

    /// Element name of the request node, e.g. `replaceResultRequest`
    pub fn request_element(&self) -> String {
        format!("{}ResultRequest", self.as_str())
    }
}

impl fmt::Display for OutcomeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeAction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(OutcomeAction::Read),
            "replace" => Ok(OutcomeAction::Replace),
            "delete" => Ok(OutcomeAction::Delete),
            other => Err(ConfigurationError::InvalidAction(other.to_string())),
        }
    }
}

/// A grade in the closed interval [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, ConfigurationError> {
        if value.is_nan() {
            return Err(ConfigurationError::ScoreNotANumber(value.to_string()));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigurationError::ScoreOutOfRange(value));
        }
        // -0.0 would otherwise print as "-0"
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    /// Parse a score from untyped input
    pub fn parse(input: &str) -> Result<Self, ConfigurationError> {
        let value: f64 = input
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::ScoreNotANumber(input.to_string()))?;
        Self::new(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Score {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<f64> for Score {
    type Error = ConfigurationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A validated outcome request: a score is present iff the action is replace
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRequest {
    sourced_id: String,
    action: OutcomeAction,
    score: Option<Score>,
}

impl OutcomeRequest {
    pub fn new(
        sourced_id: impl Into<String>,
        action: OutcomeAction,
        score: Option<Score>,
    ) -> Result<Self, ConfigurationError> {
        match (action, score) {
            (OutcomeAction::Replace, None) => return Err(ConfigurationError::MissingScore),
            (OutcomeAction::Read | OutcomeAction::Delete, Some(_)) => {
                return Err(ConfigurationError::UnexpectedScore(action.to_string()))
            }
            _ => {}
        }

        Ok(Self {
            sourced_id: sourced_id.into(),
            action,
            score,
        })
    }

    /// Validate a request given as strings, e.g. straight from a form
    pub fn parse(
        sourced_id: &str,
        action: &str,
        score: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let action: OutcomeAction = action.parse()?;
        let score = score.map(Score::parse).transpose()?;
        Self::new(sourced_id, action, score)
    }

    pub fn read(sourced_id: impl Into<String>) -> Self {
        Self {
            sourced_id: sourced_id.into(),
            action: OutcomeAction::Read,
            score: None,
        }
    }

    pub fn replace(sourced_id: impl Into<String>, score: Score) -> Self {
        Self {
            sourced_id: sourced_id.into(),
            action: OutcomeAction::Replace,
            score: Some(score),
        }
    }

    pub fn delete(sourced_id: impl Into<String>) -> Self {
        Self {
            sourced_id: sourced_id.into(),
            action: OutcomeAction::Delete,
            score: None,
        }
    }

    pub fn sourced_id(&self) -> &str {
        &self.sourced_id
    }

    pub fn action(&self) -> OutcomeAction {
        self.action
    }

    pub fn score(&self) -> Option<Score> {
        self.score
    }
}

/// Where an outcome is sent, taken from the consumer's launch parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeTarget {
    pub service_url: String,
    pub sourced_id: String,
}

impl OutcomeTarget {
    /// Extract the target from launch parameters. Blank values count as missing;
    /// others are passed on unchanged.
    pub fn from_params(params: &Parameters) -> Result<Self, ConfigurationError> {
        let service_url = non_empty(params, OUTCOME_SERVICE_URL_PARAM)
            .ok_or(ConfigurationError::MissingOutcomeServiceUrl)?;
        let sourced_id = non_empty(params, RESULT_SOURCEDID_PARAM)
            .ok_or(ConfigurationError::MissingSourcedId)?;

        Ok(Self {
            service_url: service_url.to_string(),
            sourced_id: sourced_id.to_string(),
        })
    }
}

fn non_empty<'a>(params: &'a Parameters, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

/// Result of one outcome exchange
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeResult {
    /// Whether the consumer reported `success`
    pub success: bool,
    /// Raw `imsx_codeMajor` value
    pub code_major: Option<String>,
    /// `imsx_severity` value (status, warning, error)
    pub severity: Option<String>,
    /// Human-readable `imsx_description`
    pub description: Option<String>,
    /// Message identifier of the request this response answers
    pub message_ref_identifier: Option<String>,
    /// Score reported by a read response
    pub score: Option<f64>,
}
