//! Basic Outcomes request envelopes
//!
//! The outbound document is a small typed tree rather than a generic XML
//! DOM, so only the shapes the protocol allows can be built:
//!
//! ```text
//! imsx_POXEnvelopeRequest
//! ├── imsx_POXHeader/imsx_POXRequestHeaderInfo
//! │   ├── imsx_version
//! │   └── imsx_messageIdentifier
//! └── imsx_POXBody/<action>ResultRequest/resultRecord
//!     ├── sourcedGUID/sourcedId
//!     └── result/resultScore/{language, textString}   (replace only)
//! ```

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use uuid::Uuid;

use crate::{OutcomeAction, OutcomeRequest, ResultError, Score, OUTCOMES_NAMESPACE, OUTCOMES_VERSION};

/// Language tag of every reported score
pub const SCORE_LANGUAGE: &str = "en";

/// A complete `imsx_POXEnvelopeRequest`
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub header: EnvelopeHeader,
    pub body: EnvelopeBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub version: String,
    pub message_identifier: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeBody {
    pub action: OutcomeAction,
    pub record: ResultRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub sourced_id: String,
    pub result: Option<ResultScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultScore {
    pub language: String,
    pub score: Score,
}

/// Generate a message identifier unique across calls
pub fn new_message_identifier() -> String {
    Uuid::new_v4().to_string()
}

impl Envelope {
    /// Envelope for a validated request with a fresh message identifier
    pub fn new(request: &OutcomeRequest) -> Self {
        Self {
            header: EnvelopeHeader {
                version: OUTCOMES_VERSION.to_string(),
                message_identifier: new_message_identifier(),
            },
            body: EnvelopeBody {
                action: request.action(),
                record: ResultRecord {
                    sourced_id: request.sourced_id().to_string(),
                    result: request.score().map(|score| ResultScore {
                        language: SCORE_LANGUAGE.to_string(),
                        score,
                    }),
                },
            },
        }
    }

    pub fn message_identifier(&self) -> &str {
        &self.header.message_identifier
    }

    /// Serialize as pretty-printed, UTF-8 declared XML
    pub fn to_xml(&self) -> Result<String, ResultError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(encode_error)?;

        let root = BytesStart::new("imsx_POXEnvelopeRequest").with_attributes([("xmlns", OUTCOMES_NAMESPACE)]);
        writer.write_event(Event::Start(root)).map_err(encode_error)?;
        self.header.write(&mut writer)?;
        self.body.write(&mut writer)?;
        end(&mut writer, "imsx_POXEnvelopeRequest")?;

        String::from_utf8(writer.into_inner()).map_err(encode_error)
    }
}

impl EnvelopeHeader {
    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), ResultError> {
        start(writer, "imsx_POXHeader")?;
        start(writer, "imsx_POXRequestHeaderInfo")?;
        text_element(writer, "imsx_version", &self.version)?;
        text_element(writer, "imsx_messageIdentifier", &self.message_identifier)?;
        end(writer, "imsx_POXRequestHeaderInfo")?;
        end(writer, "imsx_POXHeader")
    }
}

impl EnvelopeBody {
    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), ResultError> {
        let request = self.action.request_element();

        start(writer, "imsx_POXBody")?;
        start(writer, &request)?;
        start(writer, "resultRecord")?;

        start(writer, "sourcedGUID")?;
        text_element(writer, "sourcedId", &self.record.sourced_id)?;
        end(writer, "sourcedGUID")?;

        if let Some(result) = &self.record.result {
            start(writer, "result")?;
            start(writer, "resultScore")?;
            text_element(writer, "language", &result.language)?;
            text_element(writer, "textString", &result.score.to_string())?;
            end(writer, "resultScore")?;
            end(writer, "result")?;
        }

        end(writer, "resultRecord")?;
        end(writer, &request)?;
        end(writer, "imsx_POXBody")
    }
}

fn encode_error(e: impl Display) -> ResultError {
    ResultError::Encode(e.to_string())
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ResultError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(encode_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ResultError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(encode_error)
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), ResultError> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(encode_error)?;
    end(writer, name)
}

/// Build the request body for a validated outcome request
pub fn build_result_body(request: &OutcomeRequest) -> Result<String, ResultError> {
    Envelope::new(request).to_xml()
}
