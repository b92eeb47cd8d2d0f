//! Basic Outcomes response parsing
//!
//! Field extraction is best-effort: a missing node leaves the field `None`.
//! Only a document that is not well-formed XML is an error.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::{OutcomeAction, OutcomeResult, ResultError, CODE_MAJOR_SUCCESS};

const STATUS_INFO_PATH: &[&str] = &["imsx_POXHeader", "imsx_POXResponseHeaderInfo", "imsx_statusInfo"];
const READ_SCORE_PATH: &[&str] = &["imsx_POXBody", "readResultResponse", "result", "resultScore", "textString"];

/// Raw fields pulled out of a response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFields {
    pub code_major: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub message_ref_identifier: Option<String>,
    pub score_text: Option<String>,
}

impl ResponseFields {
    fn capture(&mut self, path: &[String], text: &str) {
        let slot = if let Some(field) = status_field(path) {
            match field {
                "imsx_codeMajor" => &mut self.code_major,
                "imsx_severity" => &mut self.severity,
                "imsx_description" => &mut self.description,
                "imsx_messageRefIdentifier" => &mut self.message_ref_identifier,
                _ => return,
            }
        } else if ends_with(path, READ_SCORE_PATH) {
            &mut self.score_text
        } else {
            return;
        };

        slot.get_or_insert_with(String::new).push_str(text);
    }
}

fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

fn status_field(path: &[String]) -> Option<&str> {
    let (last, parent) = path.split_last()?;
    ends_with(parent, STATUS_INFO_PATH).then_some(last.as_str())
}

fn invalid(e: impl std::fmt::Display) -> ResultError {
    ResultError::InvalidXml(e.to_string())
}

fn local_name(name: &[u8]) -> Result<String, ResultError> {
    std::str::from_utf8(name).map(str::to_string).map_err(invalid)
}

/// Parse a response document, failing only if it is not well-formed.
///
/// Field text is kept raw, with text and CDATA sections concatenated as-is.
pub fn parse_response_fields(bytes: &[u8]) -> Result<ResponseFields, ResultError> {
    let mut reader = Reader::from_reader(bytes);

    let mut fields = ResponseFields::default();
    let mut path: Vec<String> = Vec::new();
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(invalid)? {
            Event::Start(e) => {
                if path.is_empty() && seen_root {
                    return Err(invalid("multiple root elements"));
                }
                seen_root = true;
                path.push(local_name(e.local_name().as_ref())?);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Empty(_) => {
                if path.is_empty() && seen_root {
                    return Err(invalid("multiple root elements"));
                }
                seen_root = true;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(invalid)?;
                if !path.is_empty() {
                    fields.capture(&path, &text);
                } else if !text.trim().is_empty() {
                    return Err(invalid("text outside the root element"));
                }
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(&e).map_err(invalid)?.to_string();
                if path.is_empty() {
                    return Err(invalid("character data outside the root element"));
                }
                fields.capture(&path, &text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(invalid("document has no root element"));
    }
    if let Some(open) = path.last() {
        return Err(invalid(format!("unexpected end of document inside <{}>", open)));
    }

    Ok(fields)
}

/// Parse a consumer's response into an [`OutcomeResult`].
///
/// The score is only read for `read` responses, and only when non-empty.
pub fn parse_response(bytes: &[u8], action: OutcomeAction) -> Result<OutcomeResult, ResultError> {
    let fields = parse_response_fields(bytes)?;

    let score = match (action, trimmed(fields.score_text)) {
        (OutcomeAction::Read, Some(text)) => match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                warn!("Ignoring non-numeric score in read response: {}", text);
                None
            }
        },
        _ => None,
    };

    let code_major = trimmed(fields.code_major);

    Ok(OutcomeResult {
        success: code_major.as_deref() == Some(CODE_MAJOR_SUCCESS),
        code_major,
        severity: trimmed(fields.severity),
        description: trimmed(fields.description),
        message_ref_identifier: trimmed(fields.message_ref_identifier),
        score,
    })
}

fn trimmed(raw: Option<String>) -> Option<String> {
    raw.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
