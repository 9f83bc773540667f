//! Request lifecycle as a chain of owned states.
//!
//! ```text
//! Built --send--> Receiving --complete--> ResolvedResponse
//!   |                 |            \----> ResponseError / ParseError / RequestError
//!   |                 \--into_stream--> StreamHandle (status < 400)
//!   \--> RequestError (no response)
//! ```
//!
//! Every transition consumes its state, so one invocation settles exactly once.

use crate::codec::{self, ResponseData};
use crate::debug::Diagnostics;
use crate::error::{ApiClientError, Classifier, ParseError, RequestError, ResponseError};
use crate::rate_limit::RateLimit;
use crate::stream::StreamHandle;
use crate::transport::{RequestDescriptor, Transport, TransportBody, TransportError, TransportResponse};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// Decoded body plus the response metadata it arrived with.
#[derive(Clone, Debug)]
pub struct ResolvedResponse<T> {
    pub status: StatusCode,
    pub data: T,
    pub headers: HeaderMap,
    pub rate_limit: Option<RateLimit>,
}

impl<T> ResolvedResponse<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResolvedResponse<U> {
        ResolvedResponse {
            status: self.status,
            data: f(self.data),
            headers: self.headers,
            rate_limit: self.rate_limit,
        }
    }
}

impl ResolvedResponse<ResponseData> {
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<ResolvedResponse<T>, ParseError> {
        Ok(ResolvedResponse {
            status: self.status,
            data: self.data.deserialize()?,
            headers: self.headers,
            rate_limit: self.rate_limit,
        })
    }
}

#[inline]
pub(crate) fn is_failure(status: StatusCode) -> bool {
    status.as_u16() >= 400
}

pub(crate) struct Built<'a, T: Transport> {
    transport: &'a T,
    diagnostics: &'a Diagnostics,
    form_encoded: bool,
    request: RequestDescriptor,
}

impl<'a, T: Transport> Built<'a, T> {
    pub(crate) fn new(
        transport: &'a T,
        diagnostics: &'a Diagnostics,
        form_encoded: bool,
        request: RequestDescriptor,
    ) -> Self {
        diagnostics.request(&request);
        Self {
            transport,
            diagnostics,
            form_encoded,
            request,
        }
    }

    /// Writes the request and waits for response headers.
    pub(crate) async fn send(self) -> Result<Receiving<'a>, RequestError> {
        let sent = self.transport.send(&self.request).await;
        match sent {
            Ok(response) => Ok(Receiving {
                diagnostics: self.diagnostics,
                form_encoded: self.form_encoded,
                rate_limit: RateLimit::from_headers(&response.headers),
                request: self.request,
                response,
            }),
            Err(e) => Err(Classifier::new(self.diagnostics).request_error(self.request, e)),
        }
    }
}

/// Headers are in; the body has not been touched.
pub(crate) struct Receiving<'a> {
    diagnostics: &'a Diagnostics,
    form_encoded: bool,
    request: RequestDescriptor,
    response: TransportResponse,
    rate_limit: Option<RateLimit>,
}

impl<'a> Receiving<'a> {
    #[inline]
    pub(crate) fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Blocking path: accumulate, decode, then settle on the status code.
    pub(crate) async fn complete(self) -> Result<ResolvedResponse<ResponseData>, ApiClientError> {
        self.read_to_end().await?.settle()
    }

    /// Streaming path: hands the unread body over on success; failures take the blocking path.
    pub(crate) async fn into_stream(self) -> Result<StreamHandle, ApiClientError> {
        if is_failure(self.status()) {
            let completed = self.read_to_end().await?;
            return Err(completed.into_response_error().into());
        }
        self.diagnostics.stream_start(&self.request, self.status());
        Ok(StreamHandle::new(self.request, self.response, self.rate_limit))
    }

    async fn read_to_end(self) -> Result<Completed<'a>, ApiClientError> {
        let Receiving {
            diagnostics,
            form_encoded,
            request,
            response,
            rate_limit,
        } = self;
        let TransportResponse {
            status,
            headers,
            content_length,
            mut body,
        } = response;

        let bytes = match read_body_all(body.as_mut(), content_length).await {
            Ok(b) => b,
            Err(e) => return Err(Classifier::new(diagnostics).request_error(request, e).into()),
        };
        let data = codec::decode_response(&bytes, codec::content_type(&headers), form_encoded)?;
        Ok(Completed {
            diagnostics,
            request,
            status,
            headers,
            rate_limit,
            data,
        })
    }
}

/// Body fully received and decoded; only the status decision is left.
struct Completed<'a> {
    diagnostics: &'a Diagnostics,
    request: RequestDescriptor,
    status: StatusCode,
    headers: HeaderMap,
    rate_limit: Option<RateLimit>,
    data: ResponseData,
}

impl Completed<'_> {
    fn settle(self) -> Result<ResolvedResponse<ResponseData>, ApiClientError> {
        if is_failure(self.status) {
            return Err(self.into_response_error().into());
        }
        self.diagnostics
            .response_ok(&self.request, self.status, &self.data, &self.headers);
        Ok(ResolvedResponse {
            status: self.status,
            data: self.data,
            headers: self.headers,
            rate_limit: self.rate_limit,
        })
    }

    fn into_response_error(self) -> ResponseError {
        Classifier::new(self.diagnostics).response_error(
            self.request,
            self.status,
            self.data,
            self.headers,
            self.rate_limit,
        )
    }
}

async fn read_body_all(
    body: &mut dyn TransportBody,
    content_length: Option<u64>,
) -> Result<Bytes, TransportError> {
    let hint = content_length
        .map(|n| n.min(1024 * 1024) as usize)
        .unwrap_or(8 * 1024);
    let mut buf = BytesMut::with_capacity(hint);
    while let Some(chunk) = body.next_chunk().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;

    struct Chunks(Vec<Bytes>);

    impl TransportBody for Chunks {
        fn next_chunk<'a>(
            &'a mut self,
        ) -> Pin<Box<dyn Future<Output = Result<Option<Bytes>, TransportError>> + Send + 'a>>
        {
            Box::pin(async move {
                if self.0.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(self.0.remove(0)))
                }
            })
        }
    }

    #[tokio::test]
    async fn chunks_are_accumulated_in_order() {
        let mut body = Chunks(vec![
            Bytes::from_static(b"{\"a\""),
            Bytes::from_static(b":"),
            Bytes::from_static(b"1}"),
        ]);
        let out = read_body_all(&mut body, None).await.unwrap();
        assert_eq!(&out[..], b"{\"a\":1}");
    }

    #[test]
    fn failure_threshold_is_400() {
        assert!(!is_failure(StatusCode::OK));
        assert!(!is_failure(StatusCode::FOUND));
        assert!(is_failure(StatusCode::BAD_REQUEST));
        assert!(is_failure(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn resolved_response_maps_data() {
        let r = ResolvedResponse {
            status: StatusCode::OK,
            data: ResponseData::Text("7".into()),
            headers: HeaderMap::new(),
            rate_limit: None,
        };
        let n = r.map(|d| d.as_text().map(str::len).unwrap_or(0));
        assert_eq!(n.data, 1);
    }
}
