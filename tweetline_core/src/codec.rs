use crate::error::ParseError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

pub(crate) mod form;
pub(crate) mod json;

/// Structured response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    /// `application/json` body.
    Json(serde_json::Value),
    /// URL-encoded key/value pairs from a form-encoded (OAuth token) endpoint.
    Form(BTreeMap<String, String>),
    /// Anything else, untouched.
    Text(String),
}

impl ResponseData {
    #[inline]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_form(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ResponseData::Form(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the decoded body into `T`. Form pairs map to a JSON object, text to a JSON string.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ParseError> {
        let value = self.into_json_value();
        let preview = truncate_for_debug(&value.to_string(), 8 * 1024);
        serde_json::from_value(value).map_err(|source| ParseError {
            source,
            body: preview,
        })
    }

    pub fn into_json_value(self) -> serde_json::Value {
        match self {
            ResponseData::Json(v) => v,
            ResponseData::Form(m) => serde_json::Value::Object(
                m.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect(),
            ),
            ResponseData::Text(s) => serde_json::Value::String(s),
        }
    }

    /// Bounded rendering for diagnostics.
    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            ResponseData::Json(v) => truncate_for_debug(&v.to_string(), max_chars),
            ResponseData::Form(m) => truncate_for_debug(&format!("{m:?}"), max_chars),
            ResponseData::Text(s) => truncate_for_debug(s, max_chars),
        }
    }
}

/// Decodes an accumulated body.
///
/// Priority: non-empty body with a JSON content-type, then form-encoded endpoints, then raw text.
/// The body itself is never sniffed.
pub fn decode_response(
    body: &Bytes,
    content_type: Option<&str>,
    form_encoded_endpoint: bool,
) -> Result<ResponseData, ParseError> {
    let is_json = content_type.is_some_and(|ct| ct.contains(json::CONTENT_TYPE));
    if !body.is_empty() && is_json {
        return json::decode(body).map(ResponseData::Json);
    }
    if form_encoded_endpoint {
        return Ok(ResponseData::Form(form::decode(body)));
    }
    Ok(ResponseData::Text(String::from_utf8_lossy(body).into_owned()))
}

pub(crate) fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    Binary,
    Text,
}

impl Format {
    pub fn from_content_type(ct: Option<&str>) -> Format {
        match ct {
            None => Format::Text,
            Some(ct)
                if ct.starts_with("text/")
                    || ct.contains(json::CONTENT_TYPE)
                    || ct.contains(form::CONTENT_TYPE) =>
            {
                Format::Text
            }
            Some(_) => Format::Binary,
        }
    }
}

pub(crate) fn format_bytes_for_debug(format: Format, bytes: &[u8], max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    match format {
        Format::Text => {
            // Worst case UTF-8 expansion for lossy preview: cap by ~4 bytes per char.
            let max_bytes = max_chars.saturating_mul(4).max(1);
            let slice_len = bytes.len().min(max_bytes);
            let s0 = String::from_utf8_lossy(&bytes[..slice_len]).to_string();
            let mut s = truncate_for_debug(&s0, max_chars);
            if slice_len < bytes.len() && !s.ends_with('…') {
                s.push('…');
            }
            s
        }
        Format::Binary => {
            // base64 expands 3 bytes -> 4 chars.
            let max_bytes = max_chars.saturating_mul(3).div_ceil(4).max(1);
            let slice_len = bytes.len().min(max_bytes);
            let s0 = STANDARD_NO_PAD.encode(&bytes[..slice_len]);
            let mut s = truncate_for_debug(&s0, max_chars);
            if slice_len < bytes.len() && !s.ends_with('…') {
                s.push('…');
            }
            s
        }
    }
}

pub(crate) fn truncate_for_debug(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let mut it = s.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        match it.next() {
            Some(c) => out.push(c),
            None => return out,
        }
    }
    if it.next().is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_content_type_is_parsed() {
        let body = Bytes::from_static(br#"{"data":[1,2],"meta":{"result_count":2}}"#);
        let out = decode_response(&body, Some("application/json; charset=utf-8"), false).unwrap();
        assert_eq!(
            out,
            ResponseData::Json(json!({"data":[1,2],"meta":{"result_count":2}}))
        );
    }

    #[test]
    fn malformed_json_is_an_error_not_text() {
        let body = Bytes::from_static(b"{\"data\":");
        let err = decode_response(&body, Some("application/json"), false).unwrap_err();
        assert_eq!(err.body, "{\"data\":");
    }

    #[test]
    fn empty_json_body_falls_through() {
        let body = Bytes::new();
        let out = decode_response(&body, Some("application/json"), false).unwrap();
        assert_eq!(out, ResponseData::Text(String::new()));

        let out = decode_response(&body, Some("application/json"), true).unwrap();
        assert_eq!(out, ResponseData::Form(BTreeMap::new()));
    }

    #[test]
    fn form_endpoint_yields_flat_pairs() {
        let body = Bytes::from_static(b"a=1&b=2");
        let out = decode_response(&body, None, true).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), "1".to_string());
        expected.insert("b".to_string(), "2".to_string());
        assert_eq!(out, ResponseData::Form(expected));
    }

    #[test]
    fn json_wins_over_form_endpoint() {
        let body = Bytes::from_static(br#"{"a":"1"}"#);
        let out = decode_response(&body, Some("application/json"), true).unwrap();
        assert_eq!(out.as_json(), Some(&json!({"a":"1"})));
    }

    #[test]
    fn other_content_is_raw_text() {
        let body = Bytes::from_static(b"a=1&b=2");
        let out = decode_response(&body, Some("text/html"), false).unwrap();
        assert_eq!(out.as_text(), Some("a=1&b=2"));
    }

    #[test]
    fn form_deserializes_into_struct() {
        #[derive(serde::Deserialize)]
        struct Token {
            oauth_token: String,
            oauth_callback_confirmed: String,
        }
        let body = Bytes::from_static(b"oauth_token=abc&oauth_callback_confirmed=true");
        let t: Token = decode_response(&body, None, true)
            .unwrap()
            .deserialize()
            .unwrap();
        assert_eq!(t.oauth_token, "abc");
        assert_eq!(t.oauth_callback_confirmed, "true");
    }

    #[test]
    fn debug_previews_are_bounded() {
        assert_eq!(truncate_for_debug("abcdef", 3), "abc…");
        assert_eq!(truncate_for_debug("abc", 3), "abc");
        assert_eq!(format_bytes_for_debug(Format::Binary, &[0, 1, 2], 64), "AAEC");
        assert_eq!(format_bytes_for_debug(Format::Text, b"hello world", 5), "hello…");
        assert_eq!(Format::from_content_type(Some("image/png")), Format::Binary);
        assert_eq!(
            Format::from_content_type(Some("application/x-www-form-urlencoded")),
            Format::Text
        );
    }
}
