use crate::client::ApiClient;
use crate::error::ApiClientError;
use crate::pagination::{
    CursorMeta, Direction, MergeIncludes, PaginatorEndpoint, TimelineBuffer, TimelinePage,
};
use crate::rate_limit::RateLimit;
use crate::request::ResolvedResponse;
use crate::timeout::TimeoutOverride;
use crate::transport::{RequestDescriptor, Transport};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;

const PAGINATION_TOKEN: &str = "pagination_token";
const MAX_RESULTS: &str = "max_results";

/// Result of a single page fetch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PageFetch {
    /// Items in the fetched page's raw `data` array.
    pub len: usize,
    /// The direction has no further data.
    pub exhausted: bool,
}

/// Bidirectional paginator over one `:id`-templated endpoint.
///
/// Fetches take `&mut self`, so a paginator never has two merges in flight.
pub struct TimelinePaginator<'a, T, Item, Meta = crate::pagination::PageMeta, Inc = crate::pagination::Includes>
where
    T: Transport,
{
    client: &'a ApiClient<T>,
    endpoint: PaginatorEndpoint,
    query: Vec<(String, String)>,
    timeout: TimeoutOverride,
    buffer: TimelineBuffer<Item, Meta, Inc>,
    rate_limit: Option<RateLimit>,
    last_page_len: usize,
    started: bool,
    done: bool,
    previous_done: bool,
}

impl<'a, T, Item, Meta, Inc> TimelinePaginator<'a, T, Item, Meta, Inc>
where
    T: Transport,
    Item: DeserializeOwned + Send + 'static,
    Meta: CursorMeta + DeserializeOwned,
    Inc: MergeIncludes + DeserializeOwned,
{
    /// Empty paginator; the first `fetch_next`/`fetch_previous` requests the first page.
    pub fn new(client: &'a ApiClient<T>, endpoint: PaginatorEndpoint) -> Self {
        Self {
            client,
            endpoint,
            query: Vec::new(),
            timeout: TimeoutOverride::Inherit,
            buffer: TimelineBuffer::default(),
            rate_limit: None,
            last_page_len: 0,
            started: false,
            done: false,
            previous_done: false,
        }
    }

    /// Requests the first page and wraps it.
    pub async fn fetch_first(
        client: &'a ApiClient<T>,
        endpoint: PaginatorEndpoint,
        query: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ApiClientError> {
        let mut p = Self::new(client, endpoint).with_query(query);
        let req = p.page_request(None, None)?;
        let resp = p
            .client
            .execute_json::<TimelinePage<Item, Meta, Inc>>(req)
            .await?;
        p.adopt(resp);
        Ok(p)
    }

    /// Wraps a first page that was fetched elsewhere.
    pub fn from_response(
        client: &'a ApiClient<T>,
        endpoint: PaginatorEndpoint,
        query: impl IntoIterator<Item = (String, String)>,
        first: ResolvedResponse<TimelinePage<Item, Meta, Inc>>,
    ) -> Self {
        let mut p = Self::new(client, endpoint).with_query(query);
        p.adopt(first);
        p
    }

    /// Shared query parameters sent with every page.
    pub fn with_query(mut self, query: impl IntoIterator<Item = (String, String)>) -> Self {
        for (k, v) in query {
            set_query(&mut self.query, &k, v);
        }
        self
    }

    #[inline]
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = TimeoutOverride::Set(d);
        self
    }

    #[inline]
    pub fn clear_timeout(mut self) -> Self {
        self.timeout = TimeoutOverride::Clear;
        self
    }

    /// Fetches the page after the newest one and appends it.
    pub async fn fetch_next(&mut self, max_results: Option<u32>) -> Result<PageFetch, ApiClientError> {
        self.fetch(Direction::Next, max_results).await
    }

    /// Fetches the page before the oldest one and prepends it.
    pub async fn fetch_previous(
        &mut self,
        max_results: Option<u32>,
    ) -> Result<PageFetch, ApiClientError> {
        self.fetch(Direction::Previous, max_results).await
    }

    /// Fetches forward until `count` new items arrived or the timeline ends.
    ///
    /// Bounded by the client's `Caps`; returns the number of items gathered.
    pub async fn fetch_last(&mut self, count: usize) -> Result<usize, ApiClientError> {
        let caps = self.client.pagination_caps();
        let mut seen: HashSet<String> = HashSet::new();
        let mut gathered = 0usize;

        for page_index in 0..caps.max_pages {
            if gathered >= count || self.is_done() {
                return Ok(gathered);
            }
            if caps.detect_loops
                && let Some(token) = self.buffer.meta().token(Direction::Next)
                && !seen.insert(token.to_owned())
            {
                return Err(ApiClientError::Pagination(
                    format!(
                        "loop detected (endpoint={} page_index={} token={})",
                        self.endpoint,
                        page_index,
                        token
                    )
                    .into(),
                ));
            }
            gathered += self.fetch_next(None).await?.len;
        }

        if gathered >= count || self.is_done() {
            return Ok(gathered);
        }
        Err(ApiClientError::PaginationLimit(
            format!(
                "max_pages reached (endpoint={} max_pages={} gathered={})",
                self.endpoint,
                caps.max_pages,
                gathered
            )
            .into(),
        ))
    }

    async fn fetch(
        &mut self,
        direction: Direction,
        max_results: Option<u32>,
    ) -> Result<PageFetch, ApiClientError> {
        let token = if self.started {
            let token = self.buffer.meta().token(direction).map(str::to_owned);
            if token.is_none() {
                self.set_done(direction, true);
                return Ok(PageFetch {
                    len: 0,
                    exhausted: true,
                });
            }
            token
        } else {
            None
        };

        let req = self.page_request(token.as_deref(), max_results)?;
        let resp = self
            .client
            .execute_json::<TimelinePage<Item, Meta, Inc>>(req)
            .await?;

        let len = resp.data.len();
        let exhausted = resp.data.is_last(direction);
        if !self.started {
            self.adopt(resp);
            return Ok(PageFetch { len, exhausted });
        }

        let ResolvedResponse {
            data: page,
            rate_limit,
            ..
        } = resp;
        self.buffer.merge(page, direction);
        self.rate_limit = rate_limit;
        self.last_page_len = len;
        self.set_done(direction, exhausted);
        Ok(PageFetch { len, exhausted })
    }

    fn adopt(&mut self, first: ResolvedResponse<TimelinePage<Item, Meta, Inc>>) {
        let page = first.data;
        self.last_page_len = page.len();
        self.done = page.is_last(Direction::Next);
        self.previous_done = page.is_last(Direction::Previous);
        self.buffer = TimelineBuffer::from_page(page);
        self.rate_limit = first.rate_limit;
        self.started = true;
    }

    fn set_done(&mut self, direction: Direction, done: bool) {
        match direction {
            Direction::Next => self.done = done,
            Direction::Previous => self.previous_done = done,
        }
    }

    /// Shared query ∪ `pagination_token` ∪ `max_results` (when non-zero).
    fn page_request(
        &self,
        token: Option<&str>,
        max_results: Option<u32>,
    ) -> Result<RequestDescriptor, ApiClientError> {
        let mut query = self.query.clone();
        if let Some(t) = token {
            set_query(&mut query, PAGINATION_TOKEN, t);
        }
        if let Some(n) = max_results.filter(|n| *n > 0) {
            set_query(&mut query, MAX_RESULTS, n.to_string());
        }

        let config = self.client.config();
        let mut url = config.endpoint_url(&self.endpoint.path()?)?;
        if !query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in query.iter() {
                qp.append_pair(k, v);
            }
        }

        Ok(RequestDescriptor::get(url)
            .with_headers(&config.default_headers)
            .with_timeout(self.timeout.resolve(config.timeout)))
    }
}

impl<'a, T, Item, Meta, Inc> TimelinePaginator<'a, T, Item, Meta, Inc>
where
    T: Transport,
    Meta: CursorMeta,
    Inc: MergeIncludes,
{
    /// Accumulated items, oldest fetch boundary first.
    #[inline]
    pub fn items(&self) -> &[Item] {
        self.buffer.items()
    }

    #[inline]
    pub fn meta(&self) -> &Meta {
        self.buffer.meta()
    }

    #[inline]
    pub fn includes(&self) -> &Inc {
        self.buffer.includes()
    }

    #[inline]
    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.rate_limit.as_ref()
    }

    /// Items in the most recently fetched page.
    #[inline]
    pub fn last_page_len(&self) -> usize {
        self.last_page_len
    }

    /// The latest forward page was empty or carried no cursor.
    ///
    /// Advisory: `fetch_next` still requests while a cursor is present.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[inline]
    pub fn is_previous_done(&self) -> bool {
        self.previous_done
    }

    #[inline]
    pub fn endpoint(&self) -> &PaginatorEndpoint {
        &self.endpoint
    }

    #[inline]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[inline]
    pub fn into_buffer(self) -> TimelineBuffer<Item, Meta, Inc> {
        self.buffer
    }
}

fn set_query(query: &mut Vec<(String, String)>, key: &str, value: impl Into<String>) {
    query.retain(|(k, _)| k != key);
    query.push((key.to_string(), value.into()));
}
