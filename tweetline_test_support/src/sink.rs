use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::sync::{Arc, Mutex};
use tweetline_core::prelude::{DebugLevel, DebugSink, Format, Outcome, ResponseData};
use tweetline_core::transport::TransportError;

/// Debug sink that keeps every line it receives, tagged with the event kind.
#[derive(Clone, Default)]
pub struct RecordingDebugSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingDebugSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl DebugSink for RecordingDebugSink {
    fn request_start(&self, _: DebugLevel, method: &Method, target: &str) {
        self.push(format!("request {method} {target}"));
    }

    fn request_params(&self, _: DebugLevel, params: &[(String, String)]) {
        self.push(format!("params {params:?}"));
    }

    fn request_headers(&self, _: DebugLevel, headers: &HeaderMap) {
        self.push(format!("request_headers {}", headers.len()));
    }

    fn request_body(&self, _: DebugLevel, body: &Bytes, _: Format, _: usize) {
        self.push(format!("request_body {}", body.len()));
    }

    fn network_error(&self, _: DebugLevel, method: &Method, target: &str, error: &TransportError) {
        self.push(format!("network_error {method} {target} {error}"));
    }

    fn response_status(
        &self,
        _: DebugLevel,
        method: &Method,
        target: &str,
        status: StatusCode,
        outcome: Outcome,
    ) {
        self.push(format!(
            "status {method} {target} {} ({outcome})",
            status.as_u16()
        ));
    }

    fn response_headers(&self, _: DebugLevel, headers: &HeaderMap) {
        self.push(format!("response_headers {}", headers.len()));
    }

    fn response_body(&self, _: DebugLevel, body: &ResponseData, max_chars: usize) {
        self.push(format!("response_body {}", body.preview(max_chars)));
    }
}
