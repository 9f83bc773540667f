use crate::codec::{self, Format, ResponseData};
use crate::transport::{RequestDescriptor, TransportError};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use std::io::{self, Write};
use std::sync::Arc;

const MAX_BODY_CHARS: usize = 32 * 1024;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
#[derive(Default)]
pub enum DebugLevel {
    #[default]
    None = 0,
    V = 1,
    VV = 2,
}

impl DebugLevel {
    #[inline]
    pub fn is_enabled(self) -> bool {
        self != DebugLevel::None
    }

    #[inline]
    pub fn is_verbose(self) -> bool {
        self >= DebugLevel::V
    }

    #[inline]
    pub fn is_very_verbose(self) -> bool {
        self >= DebugLevel::VV
    }
}

impl core::fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DebugLevel::None => f.write_str("none"),
            DebugLevel::V => f.write_str("v"),
            DebugLevel::VV => f.write_str("vv"),
        }
    }
}

/// How a response was settled, as reported to the sink.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Ok,
    Error,
    Stream,
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Outcome::Ok => f.write_str("ok"),
            Outcome::Error => f.write_str("error"),
            Outcome::Stream => f.write_str("starting stream"),
        }
    }
}

/// Receives diagnostic events. Implementations must not panic; nothing they do feeds back
/// into the request lifecycle.
pub trait DebugSink: Send + Sync + 'static {
    fn request_start(&self, dbg: DebugLevel, method: &Method, target: &str);
    fn request_params(&self, dbg: DebugLevel, params: &[(String, String)]);
    fn request_headers(&self, dbg: DebugLevel, headers: &HeaderMap);
    fn request_body(&self, dbg: DebugLevel, body: &Bytes, format: Format, max_chars: usize);

    fn network_error(&self, dbg: DebugLevel, method: &Method, target: &str, error: &TransportError);
    fn response_status(
        &self,
        dbg: DebugLevel,
        method: &Method,
        target: &str,
        status: StatusCode,
        outcome: Outcome,
    );
    fn response_headers(&self, dbg: DebugLevel, headers: &HeaderMap);
    fn response_body(&self, dbg: DebugLevel, body: &ResponseData, max_chars: usize);
}

#[derive(Default)]
pub struct NoopDebugSink;
impl DebugSink for NoopDebugSink {
    #[inline]
    fn request_start(&self, _: DebugLevel, _: &Method, _: &str) {}
    #[inline]
    fn request_params(&self, _: DebugLevel, _: &[(String, String)]) {}
    #[inline]
    fn request_headers(&self, _: DebugLevel, _: &HeaderMap) {}
    #[inline]
    fn request_body(&self, _: DebugLevel, _: &Bytes, _: Format, _: usize) {}
    #[inline]
    fn network_error(&self, _: DebugLevel, _: &Method, _: &str, _: &TransportError) {}
    #[inline]
    fn response_status(&self, _: DebugLevel, _: &Method, _: &str, _: StatusCode, _: Outcome) {}
    #[inline]
    fn response_headers(&self, _: DebugLevel, _: &HeaderMap) {}
    #[inline]
    fn response_body(&self, _: DebugLevel, _: &ResponseData, _: usize) {}
}

/// Plain-text sink on stderr. Write failures are swallowed.
pub struct StderrDebugSink;

impl StderrDebugSink {
    fn emit(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        emit_to(&mut io::stderr().lock(), f);
    }
}

fn emit_to(w: &mut dyn Write, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
    let _ = f(w);
}

impl DebugSink for StderrDebugSink {
    fn request_start(&self, dbg: DebugLevel, method: &Method, target: &str) {
        self.emit(|w| writeln!(w, "[tweetline:{}] -> [{} {}]", dbg, method, target));
    }
    fn request_params(&self, dbg: DebugLevel, params: &[(String, String)]) {
        self.emit(|w| {
            writeln!(w, "[tweetline:{}] request parameters:", dbg)?;
            for (k, v) in params {
                writeln!(w, "  {}: {}", k, v)?;
            }
            Ok(())
        });
    }
    fn request_headers(&self, dbg: DebugLevel, headers: &HeaderMap) {
        self.emit(|w| write_headers(w, dbg, "request", headers));
    }
    fn request_body(&self, dbg: DebugLevel, body: &Bytes, format: Format, max_chars: usize) {
        let preview = codec::format_bytes_for_debug(format, body.as_ref(), max_chars);
        self.emit(|w| {
            writeln!(
                w,
                "[tweetline:{}] request body ({} bytes): {}",
                dbg,
                body.len(),
                preview
            )
        });
    }

    fn network_error(&self, dbg: DebugLevel, method: &Method, target: &str, error: &TransportError) {
        self.emit(|w| {
            writeln!(
                w,
                "[tweetline:{}] <- [{} {}] network error: {}",
                dbg, method, target, error
            )
        });
    }
    fn response_status(
        &self,
        dbg: DebugLevel,
        method: &Method,
        target: &str,
        status: StatusCode,
        outcome: Outcome,
    ) {
        self.emit(|w| {
            writeln!(
                w,
                "[tweetline:{}] <- [{} {}] {} ({})",
                dbg,
                method,
                target,
                status.as_u16(),
                outcome
            )
        });
    }
    fn response_headers(&self, dbg: DebugLevel, headers: &HeaderMap) {
        self.emit(|w| write_headers(w, dbg, "response", headers));
    }
    fn response_body(&self, dbg: DebugLevel, body: &ResponseData, max_chars: usize) {
        self.emit(|w| {
            writeln!(
                w,
                "[tweetline:{}] response body: {}",
                dbg,
                body.preview(max_chars)
            )
        });
    }
}

fn write_headers(
    w: &mut dyn Write,
    dbg: DebugLevel,
    side: &str,
    headers: &HeaderMap,
) -> io::Result<()> {
    writeln!(w, "[tweetline:{}] {} headers:", dbg, side)?;
    for (k, v) in headers.iter() {
        writeln!(w, "  {}: {}", k, header_value_for_debug(k, v))?;
    }
    Ok(())
}

/// Emits every event through `tracing` under the `tweetline` target.
pub struct TracingDebugSink;
impl DebugSink for TracingDebugSink {
    fn request_start(&self, dbg: DebugLevel, method: &Method, target: &str) {
        tracing::debug!(target: "tweetline", dbg = %dbg, %method, url = target, "request");
    }
    fn request_params(&self, dbg: DebugLevel, params: &[(String, String)]) {
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        tracing::debug!(target: "tweetline", dbg = %dbg, params = ?rendered, "request parameters");
    }
    fn request_headers(&self, dbg: DebugLevel, headers: &HeaderMap) {
        for (k, v) in headers.iter() {
            tracing::trace!(
                target: "tweetline",
                dbg = %dbg,
                header = %k,
                value = %header_value_for_debug(k, v),
                "request header"
            );
        }
    }
    fn request_body(&self, dbg: DebugLevel, body: &Bytes, format: Format, max_chars: usize) {
        let preview = codec::format_bytes_for_debug(format, body.as_ref(), max_chars);
        tracing::debug!(target: "tweetline", dbg = %dbg, bytes = body.len(), body = %preview, "request body");
    }

    fn network_error(&self, dbg: DebugLevel, method: &Method, target: &str, error: &TransportError) {
        tracing::warn!(target: "tweetline", dbg = %dbg, %method, url = target, %error, "network error");
    }
    fn response_status(
        &self,
        dbg: DebugLevel,
        method: &Method,
        target: &str,
        status: StatusCode,
        outcome: Outcome,
    ) {
        match outcome {
            Outcome::Error => tracing::warn!(
                target: "tweetline",
                dbg = %dbg,
                %method,
                url = target,
                status = status.as_u16(),
                "request failed"
            ),
            _ => tracing::debug!(
                target: "tweetline",
                dbg = %dbg,
                %method,
                url = target,
                status = status.as_u16(),
                %outcome,
                "request succeeded"
            ),
        }
    }
    fn response_headers(&self, dbg: DebugLevel, headers: &HeaderMap) {
        for (k, v) in headers.iter() {
            tracing::trace!(
                target: "tweetline",
                dbg = %dbg,
                header = %k,
                value = %header_value_for_debug(k, v),
                "response header"
            );
        }
    }
    fn response_body(&self, dbg: DebugLevel, body: &ResponseData, max_chars: usize) {
        tracing::debug!(target: "tweetline", dbg = %dbg, body = %body.preview(max_chars), "response body");
    }
}

/// Level + sink pair handed to the executor and the classifier.
#[derive(Clone)]
pub struct Diagnostics {
    level: DebugLevel,
    sink: Arc<dyn DebugSink>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DebugLevel::None, Arc::new(NoopDebugSink))
    }
}

impl core::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl Diagnostics {
    #[inline]
    pub fn new(level: DebugLevel, sink: Arc<dyn DebugSink>) -> Self {
        Self { level, sink }
    }

    #[inline]
    pub fn level(&self) -> DebugLevel {
        self.level
    }

    #[inline]
    pub fn with_level(&self, level: DebugLevel) -> Self {
        Self {
            level,
            sink: self.sink.clone(),
        }
    }

    pub(crate) fn request(&self, req: &RequestDescriptor) {
        let dbg = self.level;
        if !dbg.is_verbose() {
            return;
        }
        self.sink.request_start(dbg, &req.method, &req.host_path());
        if !dbg.is_very_verbose() {
            return;
        }
        let params: Vec<(String, String)> = req
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if !params.is_empty() {
            self.sink.request_params(dbg, &params);
        }
        self.sink.request_headers(dbg, &req.headers);
        if let Some(body) = req.body.as_ref() {
            let format = Format::from_content_type(codec::content_type(&req.headers));
            self.sink.request_body(dbg, body, format, MAX_BODY_CHARS);
        }
    }

    pub(crate) fn network_error(&self, req: &RequestDescriptor, error: &TransportError) {
        if self.level.is_verbose() {
            self.sink
                .network_error(self.level, &req.method, &req.host_path(), error);
        }
    }

    pub(crate) fn response_error(
        &self,
        req: &RequestDescriptor,
        status: StatusCode,
        data: &ResponseData,
        headers: &HeaderMap,
    ) {
        let dbg = self.level;
        if !dbg.is_verbose() {
            return;
        }
        self.sink
            .response_status(dbg, &req.method, &req.host_path(), status, Outcome::Error);
        self.sink.response_body(dbg, data, MAX_BODY_CHARS);
        if dbg.is_very_verbose() {
            self.sink.response_headers(dbg, headers);
        }
    }

    pub(crate) fn response_ok(
        &self,
        req: &RequestDescriptor,
        status: StatusCode,
        data: &ResponseData,
        headers: &HeaderMap,
    ) {
        let dbg = self.level;
        if !dbg.is_verbose() {
            return;
        }
        self.sink
            .response_status(dbg, &req.method, &req.host_path(), status, Outcome::Ok);
        if dbg.is_very_verbose() {
            self.sink.response_headers(dbg, headers);
            self.sink.response_body(dbg, data, MAX_BODY_CHARS);
        }
    }

    pub(crate) fn stream_start(&self, req: &RequestDescriptor, status: StatusCode) {
        if self.level.is_verbose() {
            self.sink.response_status(
                self.level,
                &req.method,
                &req.host_path(),
                status,
                Outcome::Stream,
            );
        }
    }
}

fn is_sensitive_header_name(name: &HeaderName) -> bool {
    // HeaderName::as_str() is normalized to lowercase.
    let n = name.as_str();
    matches!(n, "authorization" | "proxy-authorization" | "cookie" | "set-cookie")
        || n.contains("token")
        || n.contains("secret")
        || n.contains("api-key")
        || n.contains("apikey")
        || n.ends_with("-key")
}

fn header_value_for_debug(name: &HeaderName, value: &HeaderValue) -> String {
    if is_sensitive_header_name(name) {
        "<redacted>".to_string()
    } else {
        value.to_str().unwrap_or("<non-utf8>").to_string()
    }
}
