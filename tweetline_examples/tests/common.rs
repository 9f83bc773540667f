use serde_json::{Value, json};
use tweetline_core::prelude::*;
use tweetline_test_support::MockTransport;

#[allow(unused)]
pub const BASE: &str = "https://api.twitter.com/2/";

#[allow(unused)]
pub fn client(transport: MockTransport) -> ApiClient<MockTransport> {
    ApiClient::with_transport(ClientConfig::new(), transport)
}

#[allow(unused)]
pub fn client_with(config: ClientConfig, transport: MockTransport) -> ApiClient<MockTransport> {
    ApiClient::with_transport(config, transport)
}

#[allow(unused)]
pub fn get(path: &str) -> RequestDescriptor {
    RequestDescriptor::get(url::Url::parse(BASE).unwrap().join(path).unwrap())
}

/// `{data, meta: {result_count, next_token?, previous_token?}}`
#[allow(unused)]
pub fn page(items: &[u32], next: Option<&str>, previous: Option<&str>) -> Value {
    let mut meta = json!({ "result_count": items.len() });
    if let Some(n) = next {
        meta["next_token"] = json!(n);
    }
    if let Some(p) = previous {
        meta["previous_token"] = json!(p);
    }
    json!({ "data": items, "meta": meta })
}
