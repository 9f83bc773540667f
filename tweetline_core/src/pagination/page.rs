use crate::pagination::{CursorMeta, Direction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default includes shape: category name -> raw entities.
pub type Includes = BTreeMap<String, Vec<serde_json::Value>>;

/// `meta` object of a paged v2 response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub result_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_token: Option<String>,
}

impl CursorMeta for PageMeta {
    #[inline]
    fn result_count(&self) -> u64 {
        self.result_count
    }
    #[inline]
    fn set_result_count(&mut self, v: u64) {
        self.result_count = v;
    }
    #[inline]
    fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }
    #[inline]
    fn set_next_token(&mut self, v: Option<String>) {
        self.next_token = v;
    }
    #[inline]
    fn previous_token(&self) -> Option<&str> {
        self.previous_token.as_deref()
    }
    #[inline]
    fn set_previous_token(&mut self, v: Option<String>) {
        self.previous_token = v;
    }
}

/// One page as returned by the API: `{data?, meta, includes?}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "Item: Serialize, Meta: Serialize, Inc: Serialize",
    deserialize = "Item: DeserializeOwned, Meta: DeserializeOwned + Default, Inc: DeserializeOwned"
))]
pub struct TimelinePage<Item, Meta = PageMeta, Inc = Includes> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Item>>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Inc>,
}

impl<Item, Meta: CursorMeta, Inc> TimelinePage<Item, Meta, Inc> {
    /// Number of items in the raw `data` array (0 when absent).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// No further data in `direction`: the page is empty or carries no cursor for it.
    #[inline]
    pub fn is_last(&self, direction: Direction) -> bool {
        self.is_empty() || self.meta.token(direction).is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    type Page = TimelinePage<serde_json::Value>;

    #[test]
    fn missing_data_and_includes_are_tolerated() {
        let page: Page = serde_json::from_value(json!({"meta": {"result_count": 0}})).unwrap();
        assert_eq!(page.len(), 0);
        assert!(page.includes.is_none());
        assert!(page.is_last(Direction::Next));
    }

    #[test]
    fn last_page_needs_items_and_cursor() {
        let page: Page = serde_json::from_value(json!({
            "data": [{"id": "1"}],
            "meta": {"result_count": 1, "next_token": "n1"}
        }))
        .unwrap();
        assert!(!page.is_last(Direction::Next));
        assert!(page.is_last(Direction::Previous));

        let page: Page = serde_json::from_value(json!({
            "data": [],
            "meta": {"result_count": 0, "next_token": "n1", "previous_token": "p1"}
        }))
        .unwrap();
        assert!(page.is_last(Direction::Next));
        assert!(page.is_last(Direction::Previous));
    }
}
