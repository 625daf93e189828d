//! XML encoding and decoding of wire documents.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DecodeError, ParseError};

/// Root element of every request and response document.
pub const ROOT: &str = "xml";

/// Serializes a wire record as `<xml>...</xml>`.
///
/// # Errors
///
/// Returns [`quick_xml::SeError`] if the record cannot be serialized.
pub fn encode<T: Serialize>(record: &T) -> Result<String, quick_xml::SeError> {
    quick_xml::se::to_string_with_root(ROOT, record)
}

/// Parses a wire document. Unknown elements are ignored.
///
/// # Errors
///
/// Returns [`ParseError`] carrying the raw body if the body is not UTF-8,
/// the document is not well-formed, or it lacks a mandatory element.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ParseError> {
    let parse_error = |source: DecodeError| ParseError {
        raw_body: String::from_utf8_lossy(body).into_owned(),
        source,
    };
    let text = std::str::from_utf8(body).map_err(|e| parse_error(e.into()))?;
    quick_xml::de::from_str(text).map_err(|e| parse_error(e.into()))
}
