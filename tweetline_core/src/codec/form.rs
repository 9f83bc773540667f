use bytes::Bytes;
use std::collections::BTreeMap;

pub(crate) const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Later duplicates of a key overwrite earlier ones.
pub(crate) fn decode(body: &Bytes) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
