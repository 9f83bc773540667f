//! Request/response lifecycle and incremental pagination for the Twitter API.

mod client;
mod codec;
mod config;
mod debug;
pub mod error;
mod pagination;
mod rate_limit;
mod request;
mod stream;
mod timeout;
pub mod transport;

pub mod prelude {
    pub use crate::client::ApiClient;
    pub use crate::codec::{Format, ResponseData, decode_response};
    pub use crate::config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_FORM_ENCODED_BASE};
    pub use crate::debug::{
        DebugLevel, DebugSink, Diagnostics, NoopDebugSink, Outcome, StderrDebugSink,
        TracingDebugSink,
    };
    pub use crate::error::{
        ApiClientError, ErrorPayload, FxError, LegacyError, ParseError, RequestError,
        ResponseError, StructuredError,
    };
    pub use crate::pagination::{
        Caps, CursorMeta, Direction, Includes, MergeIncludes, PageFetch, PageMeta,
        PaginatorEndpoint, TimelineBuffer, TimelinePage, TimelinePaginator,
    };
    pub use crate::rate_limit::RateLimit;
    pub use crate::request::ResolvedResponse;
    pub use crate::stream::StreamHandle;
    pub use crate::timeout::TimeoutOverride;
    pub use crate::transport::{
        ReqwestTransport, RequestDescriptor, Transport, TransportBody, TransportError,
        TransportResponse,
    };
}
