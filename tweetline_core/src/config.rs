use crate::debug::{DebugLevel, DebugSink, NoopDebugSink};
use crate::pagination::Caps;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/2/";
pub const DEFAULT_FORM_ENCODED_BASE: &str = "https://api.twitter.com/oauth/";

/// Client-wide settings. Every field has a usable default.
#[derive(Clone)]
pub struct ClientConfig {
    /// Root that paginator endpoint templates are joined onto.
    pub api_base: String,
    /// Requests whose URL starts with this prefix get form-encoded response decoding.
    pub form_encoded_base: String,
    pub debug_level: DebugLevel,
    pub debug_sink: Arc<dyn DebugSink>,
    pub timeout: Option<Duration>,
    /// Applied to descriptors the paginator builds (auth, user-agent, ...).
    pub default_headers: HeaderMap,
    pub pagination_caps: Caps,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            form_encoded_base: DEFAULT_FORM_ENCODED_BASE.to_string(),
            debug_level: DebugLevel::default(),
            debug_sink: Arc::new(NoopDebugSink),
            timeout: None,
            default_headers: HeaderMap::new(),
            pagination_caps: Caps::default(),
        }
    }
}

impl core::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("form_encoded_base", &self.form_encoded_base)
            .field("debug_level", &self.debug_level)
            .field("timeout", &self.timeout)
            .field("default_headers", &self.default_headers.len())
            .field("pagination_caps", &self.pagination_caps)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A trailing `/` is added when missing so relative templates join under the base path.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.api_base = base;
        self
    }

    /// Resolves an endpoint path against `api_base`; a leading `/` is ignored.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.api_base)?.join(path.trim_start_matches('/'))
    }

    #[inline]
    pub fn with_form_encoded_base(mut self, base: impl Into<String>) -> Self {
        self.form_encoded_base = base.into();
        self
    }

    #[inline]
    pub fn with_debug_level(mut self, level: DebugLevel) -> Self {
        self.debug_level = level;
        self
    }

    #[inline]
    pub fn with_debug_sink(mut self, sink: impl DebugSink) -> Self {
        self.debug_sink = Arc::new(sink);
        self
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    #[inline]
    pub fn with_pagination_caps(mut self, caps: Caps) -> Self {
        self.pagination_caps = caps;
        self
    }

    #[inline]
    pub fn is_form_encoded(&self, url: &Url) -> bool {
        url.as_str().starts_with(&self.form_encoded_base)
    }
}
