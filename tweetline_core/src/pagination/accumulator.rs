use crate::pagination::{CursorMeta, Direction, MergeIncludes, TimelinePage};

/// Every page fetched so far for one logical query, merged in chronological order.
///
/// Forward pages are appended, backward pages prepended. The buffer only ever grows.
#[derive(Clone, Debug)]
pub struct TimelineBuffer<Item, Meta, Inc> {
    data: Vec<Item>,
    meta: Meta,
    includes: Inc,
}

impl<Item, Meta, Inc> Default for TimelineBuffer<Item, Meta, Inc>
where
    Meta: CursorMeta,
    Inc: MergeIncludes,
{
    fn default() -> Self {
        Self {
            data: Vec::new(),
            meta: Meta::default(),
            includes: Inc::default(),
        }
    }
}

impl<Item, Meta, Inc> TimelineBuffer<Item, Meta, Inc>
where
    Meta: CursorMeta,
    Inc: MergeIncludes,
{
    /// Adopts a first page as-is, both cursors included.
    pub fn from_page(page: TimelinePage<Item, Meta, Inc>) -> Self {
        Self {
            data: page.data.unwrap_or_default(),
            meta: page.meta,
            includes: page.includes.unwrap_or_default(),
        }
    }

    /// Folds one page in.
    ///
    /// The running count grows by the page's `result_count` in both directions; only the
    /// cursor of `direction` is replaced.
    pub fn merge(&mut self, page: TimelinePage<Item, Meta, Inc>, direction: Direction) {
        let TimelinePage {
            data,
            meta,
            includes,
        } = page;
        let items = data.unwrap_or_default();
        let cursor = meta.token(direction).map(str::to_owned);

        let total = self.meta.result_count().saturating_add(meta.result_count());
        self.meta.set_result_count(total);

        match direction {
            Direction::Next => {
                self.meta.set_next_token(cursor);
                self.data.extend(items);
            }
            Direction::Previous => {
                self.meta.set_previous_token(cursor);
                self.data.splice(0..0, items);
            }
        }

        if let Some(inc) = includes {
            self.includes.merge(inc);
        }
    }

    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.data
    }

    #[inline]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    #[inline]
    pub fn includes(&self) -> &Inc {
        &self.includes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Item>, Meta, Inc) {
        (self.data, self.meta, self.includes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pagination::{Includes, PageMeta};
    use serde_json::json;

    type Buffer = TimelineBuffer<u32, PageMeta, Includes>;
    type Page = TimelinePage<u32, PageMeta, Includes>;

    fn page(items: &[u32], next: Option<&str>, previous: Option<&str>) -> Page {
        TimelinePage {
            data: Some(items.to_vec()),
            meta: PageMeta {
                result_count: items.len() as u64,
                next_token: next.map(Into::into),
                previous_token: previous.map(Into::into),
            },
            includes: None,
        }
    }

    #[test]
    fn forward_pages_append_and_take_next_cursor() {
        let mut buf = Buffer::default();
        buf.merge(page(&[1, 2], Some("a"), Some("p0")), Direction::Next);
        assert_eq!(buf.meta().next_token.as_deref(), Some("a"));
        assert_eq!(buf.meta().previous_token, None);

        buf.merge(page(&[3], None, Some("p1")), Direction::Next);
        assert_eq!(buf.items(), &[1, 2, 3]);
        assert_eq!(buf.meta().next_token, None);
        assert_eq!(buf.meta().previous_token, None);
        assert_eq!(buf.meta().result_count, 3);
    }

    #[test]
    fn backward_pages_prepend_and_take_previous_cursor() {
        let mut buf = Buffer::from_page(page(&[1, 2], Some("n"), Some("p")));
        buf.merge(page(&[0, 0], Some("ignored"), Some("p2")), Direction::Previous);
        assert_eq!(buf.items(), &[0, 0, 1, 2]);
        assert_eq!(buf.meta().previous_token.as_deref(), Some("p2"));
        assert_eq!(buf.meta().next_token.as_deref(), Some("n"));
        assert_eq!(buf.meta().result_count, 4);
    }

    #[test]
    fn count_grows_in_both_directions() {
        let mut buf = Buffer::from_page(page(&[5], Some("n"), Some("p")));
        let mut last = buf.meta().result_count;
        for (items, dir) in [
            (&[6u32][..], Direction::Next),
            (&[4][..], Direction::Previous),
            (&[][..], Direction::Next),
        ] {
            buf.merge(page(items, None, None), dir);
            assert!(buf.meta().result_count >= last);
            last = buf.meta().result_count;
        }
        assert_eq!(buf.items(), &[4, 5, 6]);
        assert_eq!(last, 3);
    }

    #[test]
    fn includes_keep_duplicates_across_pages() {
        let mut buf = Buffer::default();
        let mut p1 = page(&[1], Some("a"), None);
        p1.includes = Some(serde_json::from_value(json!({"users": [{"id": "9"}]})).unwrap());
        let mut p2 = page(&[2], None, None);
        p2.includes = Some(serde_json::from_value(json!({"users": [{"id": "9"}]})).unwrap());

        buf.merge(p1, Direction::Next);
        buf.merge(p2, Direction::Next);
        assert_eq!(buf.includes()["users"].len(), 2);
    }

    #[test]
    fn empty_cursor_string_clears_cursor() {
        let mut buf = Buffer::from_page(page(&[1], Some("a"), None));
        buf.merge(page(&[2], Some(""), None), Direction::Next);
        assert_eq!(buf.meta().next_token, None);
    }
}
