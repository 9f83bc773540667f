mod assert;
mod mock;
mod sink;

pub use assert::*;
pub use mock::*;
pub use sink::*;

use bytes::Bytes;
use serde::Serialize;

pub fn json_bytes<T: Serialize>(v: &T) -> Bytes {
    Bytes::from(serde_json::to_vec(v).expect("json encode"))
}
