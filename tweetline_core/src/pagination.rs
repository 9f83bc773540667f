mod accumulator;
mod endpoint;
mod page;
mod paginator;

pub use accumulator::TimelineBuffer;
pub use endpoint::PaginatorEndpoint;
pub use page::{Includes, PageMeta, TimelinePage};
pub use paginator::{PageFetch, TimelinePaginator};

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Which end of the accumulated result set a page extends.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    Next,
    Previous,
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Direction::Next => f.write_str("next"),
            Direction::Previous => f.write_str("previous"),
        }
    }
}

/// Bounds for multi-page loops (`fetch_last`).
#[derive(Copy, Clone, Debug)]
pub struct Caps {
    pub max_pages: u32,
    pub detect_loops: bool,
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            max_pages: 100,
            detect_loops: true,
        }
    }
}

impl Caps {
    #[inline]
    pub fn max_pages(mut self, v: u32) -> Self {
        self.max_pages = v;
        self
    }

    #[inline]
    pub fn detect_loops(mut self, v: bool) -> Self {
        self.detect_loops = v;
        self
    }
}

/// Page metadata: a result count plus the two continuation cursors.
///
/// Contract:
/// - `result_count()` is the number of results the page itself reports.
/// - An empty cursor string is equivalent to no cursor.
pub trait CursorMeta: Default + Send + 'static {
    fn result_count(&self) -> u64;
    fn set_result_count(&mut self, v: u64);

    fn next_token(&self) -> Option<&str>;
    fn set_next_token(&mut self, v: Option<String>);

    fn previous_token(&self) -> Option<&str>;
    fn set_previous_token(&mut self, v: Option<String>);

    #[inline]
    fn token(&self, direction: Direction) -> Option<&str> {
        let t = match direction {
            Direction::Next => self.next_token(),
            Direction::Previous => self.previous_token(),
        };
        t.filter(|s| !s.is_empty())
    }
}

/// Auxiliary entities merged page after page by per-category concatenation.
///
/// Entries are never de-duplicated: the same entity returned by two pages is kept twice.
pub trait MergeIncludes: Default + Send + 'static {
    fn merge(&mut self, other: Self);
}

impl<K, V> MergeIncludes for BTreeMap<K, Vec<V>>
where
    K: Ord + Send + 'static,
    V: Send + 'static,
{
    fn merge(&mut self, other: Self) {
        for (category, entities) in other {
            self.entry(category).or_default().extend(entities);
        }
    }
}

impl<K, V> MergeIncludes for HashMap<K, Vec<V>>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    fn merge(&mut self, other: Self) {
        for (category, entities) in other {
            self.entry(category).or_default().extend(entities);
        }
    }
}
