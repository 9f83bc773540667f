use crate::codec::ResponseData;
use crate::config::ClientConfig;
use crate::debug::{DebugLevel, Diagnostics};
use crate::error::ApiClientError;
use crate::pagination::Caps;
use crate::request::{Built, ResolvedResponse};
use crate::stream::StreamHandle;
use crate::transport::{ReqwestTransport, RequestDescriptor, Transport};
use serde::de::DeserializeOwned;

/// Request executor.
///
/// Each call owns its own request/response pair; nothing is shared between in-flight calls
/// beyond the read-only configuration.
#[derive(Clone)]
pub struct ApiClient<T: Transport = ReqwestTransport> {
    transport: T,
    config: ClientConfig,
    diagnostics: Diagnostics,
}

impl ApiClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_reqwest_client(config, reqwest::Client::new())
    }

    pub fn with_reqwest_client(config: ClientConfig, client: reqwest::Client) -> Self {
        Self::with_transport(config, ReqwestTransport::new(client))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let diagnostics = Diagnostics::new(config.debug_level, config.debug_sink.clone());
        Self {
            transport,
            config,
            diagnostics,
        }
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline]
    pub fn debug_level(&self) -> DebugLevel {
        self.diagnostics.level()
    }

    #[inline]
    pub fn set_debug_level(&mut self, level: DebugLevel) {
        self.config.debug_level = level;
        self.diagnostics = self.diagnostics.with_level(level);
    }

    #[inline]
    pub fn with_debug_level(mut self, level: DebugLevel) -> Self {
        self.set_debug_level(level);
        self
    }

    #[inline]
    pub fn pagination_caps(&self) -> Caps {
        self.config.pagination_caps
    }

    #[inline]
    pub fn set_pagination_caps(&mut self, caps: Caps) {
        self.config.pagination_caps = caps;
    }

    /// Blocking mode: resolves once the whole body was received and decoded.
    pub async fn execute(
        &self,
        req: RequestDescriptor,
    ) -> Result<ResolvedResponse<ResponseData>, ApiClientError> {
        self.build(req).send().await?.complete().await
    }

    /// Blocking mode, then deserialization of the decoded body into `R`.
    pub async fn execute_json<R: DeserializeOwned>(
        &self,
        req: RequestDescriptor,
    ) -> Result<ResolvedResponse<R>, ApiClientError> {
        Ok(self.execute(req).await?.deserialize()?)
    }

    /// Streaming mode: resolves as soon as headers report success, leaving the body unread.
    ///
    /// A failing status is handled exactly like [`execute`](Self::execute): the body is read,
    /// decoded and reported as a `ResponseError`.
    pub async fn execute_for_stream(
        &self,
        req: RequestDescriptor,
    ) -> Result<StreamHandle, ApiClientError> {
        self.build(req).send().await?.into_stream().await
    }

    fn build(&self, req: RequestDescriptor) -> Built<'_, T> {
        let form_encoded = self.config.is_form_encoded(&req.url);
        Built::new(&self.transport, &self.diagnostics, form_encoded, req)
    }
}
