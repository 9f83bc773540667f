use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tweetline_core::transport::*;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: url::Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
enum Script {
    Reply {
        status: StatusCode,
        headers: HeaderMap,
        chunks: Vec<Bytes>,
        fail_after_chunks: bool,
    },
    NetworkError(String),
}

#[derive(Clone, Debug)]
pub struct MockReply {
    script: Script,
}

impl MockReply {
    fn reply(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static(ct),
            );
        }
        Self {
            script: Script::Reply {
                status,
                headers,
                chunks: vec![body],
                fail_after_chunks: false,
            },
        }
    }

    pub fn ok_json(body: Bytes) -> Self {
        Self::reply(StatusCode::OK, Some("application/json; charset=utf-8"), body)
    }

    pub fn json(status: StatusCode, body: Bytes) -> Self {
        Self::reply(status, Some("application/json; charset=utf-8"), body)
    }

    pub fn ok_text(body: Bytes) -> Self {
        Self::reply(StatusCode::OK, Some("text/plain"), body)
    }

    pub fn ok_form(body: Bytes) -> Self {
        Self::reply(StatusCode::OK, Some("application/x-www-form-urlencoded"), body)
    }

    /// Body with no content-type, as OAuth token endpoints send it.
    pub fn ok_untyped(body: Bytes) -> Self {
        Self::reply(StatusCode::OK, None, body)
    }

    pub fn status(status: StatusCode) -> Self {
        Self::reply(status, None, Bytes::new())
    }

    /// Transport failure before any response exists.
    pub fn network_error(msg: impl Into<String>) -> Self {
        Self {
            script: Script::NetworkError(msg.into()),
        }
    }

    pub fn with_header(mut self, name: http::header::HeaderName, value: http::HeaderValue) -> Self {
        if let Script::Reply { headers, .. } = &mut self.script {
            headers.insert(name, value);
        }
        self
    }

    pub fn with_rate_limit(self, limit: u64, remaining: u64, reset: u64) -> Self {
        self.with_header(
            http::header::HeaderName::from_static("x-rate-limit-limit"),
            http::HeaderValue::from(limit),
        )
        .with_header(
            http::header::HeaderName::from_static("x-rate-limit-remaining"),
            http::HeaderValue::from(remaining),
        )
        .with_header(
            http::header::HeaderName::from_static("x-rate-limit-reset"),
            http::HeaderValue::from(reset),
        )
    }

    /// Splits the body into chunks delivered one `next_chunk` call at a time.
    pub fn chunked(mut self, sizes: &[usize]) -> Self {
        if let Script::Reply { chunks, .. } = &mut self.script {
            let mut whole: Bytes = chunks.iter().flat_map(|c| c.iter().copied()).collect();
            let mut out = Vec::new();
            for &n in sizes {
                let n = n.min(whole.len());
                out.push(whole.split_to(n));
            }
            if !whole.is_empty() {
                out.push(whole);
            }
            *chunks = out;
        }
        self
    }

    /// The connection drops after the scripted chunks were delivered.
    pub fn fail_mid_body(mut self) -> Self {
        if let Script::Reply {
            fail_after_chunks, ..
        } = &mut self.script
        {
            *fail_after_chunks = true;
        }
        self
    }
}

struct ScriptedBody {
    chunks: VecDeque<Bytes>,
    fail_at_end: bool,
    reads: Arc<AtomicUsize>,
}

impl TransportBody for ScriptedBody {
    fn next_chunk<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match self.chunks.pop_front() {
                Some(c) => Ok(Some(c)),
                None if self.fail_at_end => Err(TransportError::message("connection reset")),
                None => Ok(None),
            }
        })
    }
}

#[derive(Debug)]
struct MockState {
    recorded: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<VecDeque<MockReply>>,
    body_reads: Mutex<Vec<Arc<AtomicUsize>>>,
}

#[derive(Clone)]
pub struct MockTransport {
    st: Arc<MockState>,
}

pub struct MockHandle {
    st: Arc<MockState>,
    finished: bool,
}

#[derive(Default)]
pub struct MockBuilder {
    replies: Vec<MockReply>,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self {
            replies: Vec::new(),
        }
    }

    pub fn reply(mut self, r: MockReply) -> Self {
        self.replies.push(r);
        self
    }

    pub fn replies(mut self, rs: impl IntoIterator<Item = MockReply>) -> Self {
        self.replies.extend(rs);
        self
    }

    pub fn build(self) -> (MockTransport, MockHandle) {
        let st = Arc::new(MockState {
            recorded: Mutex::new(Vec::new()),
            replies: Mutex::new(self.replies.into_iter().collect()),
            body_reads: Mutex::new(Vec::new()),
        });
        (
            MockTransport { st: st.clone() },
            MockHandle {
                st,
                finished: false,
            },
        )
    }
}

pub fn mock() -> MockBuilder {
    MockBuilder::new()
}

impl MockHandle {
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.st.recorded.lock().unwrap().clone()
    }

    pub fn recorded_len(&self) -> usize {
        self.st.recorded.lock().unwrap().len()
    }

    pub fn assert_recorded_len(&self, expected: usize) {
        let got = self.recorded_len();
        if got != expected {
            let reqs = self.recorded();
            panic!(
                "recorded request count mismatch\n  expected: {expected}\n  got: {got}\n  recorded:\n{:#?}",
                reqs
            );
        }
    }

    /// `next_chunk` calls made against the body of the `index`-th response.
    pub fn body_reads(&self, index: usize) -> usize {
        let reads = self.st.body_reads.lock().unwrap();
        match reads.get(index) {
            Some(r) => r.load(Ordering::SeqCst),
            None => panic!("no response body at index {index} (got {})", reads.len()),
        }
    }

    pub fn remaining_replies(&self) -> usize {
        self.st.replies.lock().unwrap().len()
    }

    pub fn assert_no_remaining_replies(&self) {
        let left = self.remaining_replies();
        if left != 0 {
            panic!("mock replies not fully consumed: remaining={left}");
        }
    }

    pub fn finish(mut self) {
        self.assert_no_remaining_replies();
        self.finished = true;
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            return;
        }
        let left = self.st.replies.lock().unwrap().len();
        if left != 0 {
            panic!("mock replies not fully consumed (drop): remaining={left}");
        }
    }
}

impl Transport for MockTransport {
    fn send<'a>(
        &'a self,
        req: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>> {
        let st = self.st.clone();
        Box::pin(async move {
            st.recorded.lock().unwrap().push(RecordedRequest {
                method: req.method.clone(),
                url: req.url.clone(),
                headers: req.headers.clone(),
                body: req.body.clone(),
                timeout: req.timeout,
            });

            let reply = {
                let mut g = st.replies.lock().unwrap();
                g.pop_front().unwrap_or_else(|| {
                    panic!(
                        "MockTransport: no more scripted replies, but send() was called.\nlast_request={:#?}",
                        req
                    );
                })
            };

            match reply.script {
                Script::NetworkError(msg) => Err(TransportError::message(msg)),
                Script::Reply {
                    status,
                    headers,
                    chunks,
                    fail_after_chunks,
                } => {
                    let reads = Arc::new(AtomicUsize::new(0));
                    st.body_reads.lock().unwrap().push(reads.clone());
                    let content_length = chunks.iter().map(|c| c.len() as u64).sum();
                    Ok(TransportResponse {
                        status,
                        headers,
                        content_length: Some(content_length),
                        body: Box::new(ScriptedBody {
                            chunks: chunks.into_iter().collect(),
                            fail_at_end: fail_after_chunks,
                            reads,
                        }),
                    })
                }
            }
        })
    }
}
