use crate::codec::ResponseData;
use crate::debug::Diagnostics;
use crate::rate_limit::RateLimit;
use crate::transport::{RequestDescriptor, TransportError};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use thiserror::Error;

pub type FxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiClientError {
    /// No HTTP response ever existed (DNS, connect, socket).
    #[error(transparent)]
    Request(Box<RequestError>),

    /// A response arrived with status >= 400.
    #[error(transparent)]
    Response(Box<ResponseError>),

    /// The body claimed to be JSON (or had to match a typed shape) and did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("build url error: {0}")]
    BuildUrl(#[from] url::ParseError),

    #[error("pagination: {0}")]
    Pagination(Cow<'static, str>),
    #[error("pagination limit reached: {0}")]
    PaginationLimit(Cow<'static, str>),
}

impl ApiClientError {
    /// HTTP status of the failed exchange, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiClientError::Response(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn rate_limit(&self) -> Option<&RateLimit> {
        match self {
            ApiClientError::Response(e) => e.rate_limit.as_ref(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_response_error(&self) -> Option<&ResponseError> {
        match self {
            ApiClientError::Response(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            ApiClientError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RequestError> for ApiClientError {
    fn from(e: RequestError) -> Self {
        ApiClientError::Request(Box::new(e))
    }
}

impl From<ResponseError> for ApiClientError {
    fn from(e: ResponseError) -> Self {
        ApiClientError::Response(Box::new(e))
    }
}

#[derive(Error, Debug)]
#[error("request failed: {source}")]
pub struct RequestError {
    pub request: RequestDescriptor,
    #[source]
    pub source: TransportError,
}

#[derive(Error, Debug)]
#[error("{message}")]
pub struct ResponseError {
    pub message: String,
    pub status: StatusCode,
    pub data: ResponseData,
    pub headers: HeaderMap,
    pub rate_limit: Option<RateLimit>,
    pub request: RequestDescriptor,
}

impl ResponseError {
    /// API error list carried by the body, when it has one of the known shapes.
    pub fn payload(&self) -> Option<ErrorPayload> {
        ErrorPayload::from_data(&self.data)
    }
}

#[derive(Error, Debug)]
#[error("invalid JSON body: {source}")]
pub struct ParseError {
    #[source]
    pub source: serde_json::Error,
    /// Bounded preview of the offending body.
    pub body: String,
}

/// `{code, message}` element of a v1-style `errors` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyError {
    pub code: serde_json::Value,
    #[serde(default)]
    pub message: String,
}

impl LegacyError {
    /// Lenient read of one list element: a missing `code` becomes `null`, a missing or `null`
    /// `message` becomes empty, any other message value is rendered as JSON.
    pub fn from_value(v: &serde_json::Value) -> LegacyError {
        let message = match v.get("message") {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        LegacyError {
            code: v.get("code").cloned().unwrap_or(serde_json::Value::Null),
            message,
        }
    }
}

/// Single `{title, detail, type}` error of the v2 API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorPayload {
    Legacy(Vec<LegacyError>),
    Structured(StructuredError),
}

impl ErrorPayload {
    /// Shape dispatch: a non-empty `errors` list whose first element has `code` is legacy,
    /// any other non-empty list (or a top-level `title`) is a structured error read from the
    /// top level of the body.
    pub fn from_data(data: &ResponseData) -> Option<ErrorPayload> {
        let obj = data.as_json()?.as_object()?;
        let errors = obj
            .get("errors")
            .and_then(|e| e.as_array())
            .filter(|e| !e.is_empty());

        match errors {
            Some(list) if list[0].get("code").is_some() => {
                let legacy = list.iter().map(LegacyError::from_value).collect();
                Some(ErrorPayload::Legacy(legacy))
            }
            Some(_) => Some(ErrorPayload::Structured(structured_from(obj))),
            None if obj.contains_key("title") => {
                Some(ErrorPayload::Structured(structured_from(obj)))
            }
            None => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ErrorPayload::Legacy(errors) => errors
                .iter()
                .map(|e| format!("{} (Twitter code {})", e.message, code_text(&e.code)))
                .collect::<Vec<_>>()
                .join(", "),
            ErrorPayload::Structured(e) => format!("{}: {} (see {})", e.title, e.detail, e.kind),
        }
    }
}

fn structured_from(obj: &serde_json::Map<String, serde_json::Value>) -> StructuredError {
    let text = |key: &str| {
        obj.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    StructuredError {
        title: text("title"),
        detail: text("detail"),
        kind: text("type"),
    }
}

fn code_text(code: &serde_json::Value) -> String {
    match code {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Human readable summary for a failed status.
pub fn response_error_message(status: StatusCode, data: &ResponseData) -> String {
    let mut message = format!("Request failed with code {}", status.as_u16());
    if let Some(payload) = ErrorPayload::from_data(data) {
        message.push_str(" - ");
        message.push_str(&payload.describe());
    }
    message
}

/// Error classifier: turns a failed attempt into its typed error.
pub(crate) struct Classifier<'a> {
    diagnostics: &'a Diagnostics,
}

impl<'a> Classifier<'a> {
    #[inline]
    pub(crate) fn new(diagnostics: &'a Diagnostics) -> Self {
        Self { diagnostics }
    }

    pub(crate) fn request_error(
        &self,
        request: RequestDescriptor,
        source: TransportError,
    ) -> RequestError {
        self.diagnostics.network_error(&request, &source);
        RequestError { request, source }
    }

    pub(crate) fn response_error(
        &self,
        request: RequestDescriptor,
        status: StatusCode,
        data: ResponseData,
        headers: HeaderMap,
        rate_limit: Option<RateLimit>,
    ) -> ResponseError {
        self.diagnostics
            .response_error(&request, status, &data, &headers);
        ResponseError {
            message: response_error_message(status, &data),
            status,
            data,
            headers,
            rate_limit,
            request,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_errors_are_joined() {
        let data = ResponseData::Json(json!({
            "errors": [
                {"code": 88, "message": "Rate limit exceeded"},
                {"code": "32", "message": "Could not authenticate you"}
            ]
        }));
        let msg = response_error_message(StatusCode::TOO_MANY_REQUESTS, &data);
        assert_eq!(
            msg,
            "Request failed with code 429 - Rate limit exceeded (Twitter code 88), \
             Could not authenticate you (Twitter code 32)"
        );
    }

    #[test]
    fn every_legacy_element_is_described() {
        let data = ResponseData::Json(json!({
            "errors": [
                {"code": 88, "message": "Rate limit exceeded"},
                {"message": "second without code"},
                {"code": 32, "message": null},
                "not an object"
            ]
        }));
        let msg = response_error_message(StatusCode::TOO_MANY_REQUESTS, &data);
        assert_eq!(
            msg,
            "Request failed with code 429 - Rate limit exceeded (Twitter code 88), \
             second without code (Twitter code null),  (Twitter code 32),  (Twitter code null)"
        );
    }

    #[test]
    fn structured_error_from_code_less_list() {
        let data = ResponseData::Json(json!({
            "errors": [{"message": "x", "parameters": {}}],
            "title": "Invalid Request",
            "detail": "One or more parameters to your request was invalid.",
            "type": "https://api.twitter.com/2/problems/invalid-request"
        }));
        let msg = response_error_message(StatusCode::BAD_REQUEST, &data);
        assert!(msg.ends_with(
            "Invalid Request: One or more parameters to your request was invalid. \
             (see https://api.twitter.com/2/problems/invalid-request)"
        ));
    }

    #[test]
    fn structured_error_from_top_level_title() {
        let data = ResponseData::Json(json!({
            "title": "Not Found", "detail": "User not found", "type": "https://x/404"
        }));
        let msg = response_error_message(StatusCode::NOT_FOUND, &data);
        assert!(msg.contains("Not Found: User not found (see https://x/404)"));
    }

    #[test]
    fn plain_message_without_error_list() {
        let data = ResponseData::Text("upstream exploded".into());
        assert_eq!(
            response_error_message(StatusCode::BAD_GATEWAY, &data),
            "Request failed with code 502"
        );
        let data = ResponseData::Json(json!({"errors": []}));
        assert_eq!(
            response_error_message(StatusCode::FORBIDDEN, &data),
            "Request failed with code 403"
        );
    }
}
