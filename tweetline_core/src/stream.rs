use crate::rate_limit::RateLimit;
use crate::transport::{RequestDescriptor, TransportError, TransportResponse};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// A successful response whose body belongs to the caller.
///
/// The executor never reads from `response.body` once this value exists; the stream consumer
/// (event parser, line splitter, ...) drives it from here.
#[derive(Debug)]
pub struct StreamHandle {
    request: RequestDescriptor,
    response: TransportResponse,
    rate_limit: Option<RateLimit>,
}

impl StreamHandle {
    #[inline]
    pub(crate) fn new(
        request: RequestDescriptor,
        response: TransportResponse,
        rate_limit: Option<RateLimit>,
    ) -> Self {
        Self {
            request,
            response,
            rate_limit,
        }
    }

    #[inline]
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.response.headers
    }

    #[inline]
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.rate_limit.as_ref()
    }

    /// Next raw chunk of the live body, `None` once the server closed it.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.response.body.next_chunk().await
    }

    pub fn into_parts(self) -> (RequestDescriptor, TransportResponse) {
        (self.request, self.response)
    }
}
