use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// A fully prepared request: everything the transport needs to put it on the wire.
///
/// URL, auth headers and body encoding are decided by the caller; the executor only reads it.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    #[inline]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    #[inline]
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    #[inline]
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    #[inline]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[inline]
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        for (k, v) in headers.iter() {
            self.headers.insert(k.clone(), v.clone());
        }
        self
    }

    #[inline]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host + path`, the short form used in diagnostics.
    pub fn host_path(&self) -> String {
        format!("{}{}", self.url.host_str().unwrap_or(""), self.url.path())
    }
}

#[derive(Debug)]
pub struct TransportError(crate::error::FxError);

impl TransportError {
    #[inline]
    pub fn new(e: impl Error + Send + Sync + 'static) -> Self {
        Self(Box::new(e))
    }

    #[inline]
    pub fn from_boxed(e: crate::error::FxError) -> Self {
        Self(e)
    }

    /// Builds an error from a plain message (connection refused, reset, ...).
    pub fn message(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        Self(msg.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e)
    }
}

/// Incremental body reader: `Some(chunk)` while data arrives, `None` once the body ended.
pub trait TransportBody: Send + 'static {
    fn next_chunk<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>>;
}

/// Response whose headers arrived; the body has not been read yet.
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub content_length: Option<u64>,
    pub body: Box<dyn TransportBody>,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Injectable transport layer.
///
/// Contract:
/// - Must write `body` (when present) and signal end-of-request before awaiting the response.
/// - Must resolve as soon as response headers are known; the body stays unread in `TransportResponse::body`.
/// - Any failure before headers arrive is a `TransportError`.
pub trait Transport: Send + Sync + 'static {
    fn send<'a>(
        &'a self,
        req: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[inline]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    #[inline]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

struct ReqwestBody {
    resp: reqwest::Response,
}

impl TransportBody for ReqwestBody {
    fn next_chunk<'a>(
        &'a mut self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>> {
        Box::pin(async move { self.resp.chunk().await.map_err(TransportError::from) })
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        req: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let mut rb = self
                .client
                .request(req.method.clone(), req.url.clone())
                .headers(req.headers.clone());
            if let Some(b) = req.body.clone() {
                rb = rb.body(b);
            }
            if let Some(t) = req.timeout {
                rb = rb.timeout(t);
            }
            let resp = rb.send().await.map_err(TransportError::from)?;
            Ok(TransportResponse {
                status: resp.status(),
                headers: resp.headers().clone(),
                content_length: resp.content_length(),
                body: Box::new(ReqwestBody { resp }),
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn host_path_drops_scheme_and_query() {
        let url = Url::parse("https://api.twitter.com/2/users/12/followers?max_results=5").unwrap();
        let req = RequestDescriptor::get(url);
        assert_eq!(req.host_path(), "api.twitter.com/2/users/12/followers");
    }

    #[test]
    fn with_headers_overrides_existing_names() {
        let url = Url::parse("https://example.com/").unwrap();
        let mut defaults = HeaderMap::new();
        defaults.insert(http::header::USER_AGENT, HeaderValue::from_static("b"));
        let req = RequestDescriptor::get(url)
            .with_header(http::header::USER_AGENT, HeaderValue::from_static("a"))
            .with_headers(&defaults);
        assert_eq!(req.headers.get(http::header::USER_AGENT).unwrap(), "b");
        assert_eq!(req.headers.len(), 1);
    }
}
