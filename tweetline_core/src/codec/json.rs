use crate::error::ParseError;
use bytes::Bytes;

pub(crate) const CONTENT_TYPE: &str = "application/json";

pub(crate) fn decode(body: &Bytes) -> Result<serde_json::Value, ParseError> {
    serde_json::from_slice(body).map_err(|source| ParseError {
        source,
        body: crate::codec::format_bytes_for_debug(crate::codec::Format::Text, body, 8 * 1024),
    })
}
