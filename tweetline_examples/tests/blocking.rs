mod common;
use common::*;

use bytes::Bytes;
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tweetline_core::prelude::*;
use tweetline_test_support::*;

#[tokio::test]
async fn json_body_round_trips() {
    let body = json!({ "data": { "id": "12", "username": "jack" } });
    let (transport, handle) = mock().reply(MockReply::ok_json(json_bytes(&body))).build();
    let api = client(transport);

    let resp = api.execute(get("users/12")).await.unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data.as_json(), Some(&body));
    assert!(resp.rate_limit.is_none());

    handle.assert_recorded_len(1);
    assert_request(&handle.recorded()[0])
        .method(http::Method::GET)
        .path("/2/users/12")
        .body_absent();
}

#[tokio::test]
async fn chunked_json_is_accumulated_before_decoding() {
    let body = json!({ "data": [1, 2, 3], "meta": { "result_count": 3 } });
    let (transport, handle) = mock()
        .reply(MockReply::ok_json(json_bytes(&body)).chunked(&[1, 4, 7]))
        .build();
    let api = client(transport);

    let resp = api.execute(get("tweets")).await.unwrap();
    assert_eq!(resp.data.as_json(), Some(&body));
    // four chunks plus the end-of-body read
    assert_eq!(handle.body_reads(0), 5);
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let (transport, _handle) = mock()
        .reply(MockReply::ok_json(Bytes::from_static(b"{\"data\": [1, 2")))
        .build();
    let api = client(transport);

    let err = api.execute(get("tweets")).await.unwrap_err();
    match err {
        ApiClientError::Parse(e) => assert!(e.body.starts_with("{\"data\"")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn oauth_endpoint_body_is_form_decoded() {
    let (transport, _handle) = mock()
        .reply(MockReply::ok_untyped(Bytes::from_static(b"a=1&b=2")))
        .build();
    let api = client(transport);

    let req = RequestDescriptor::post(
        url::Url::parse("https://api.twitter.com/oauth/request_token").unwrap(),
    );
    let resp = api.execute(req).await.unwrap();
    let form = resp.data.as_form().unwrap();
    assert_eq!(form.len(), 2);
    assert_eq!(form["a"], "1");
    assert_eq!(form["b"], "2");
}

#[tokio::test]
async fn form_content_type_is_only_decoded_for_oauth_endpoints() {
    let (transport, _handle) = mock()
        .replies([
            MockReply::ok_form(Bytes::from_static(b"oauth_token=t&oauth_token_secret=s")),
            MockReply::ok_form(Bytes::from_static(b"oauth_token=t")),
        ])
        .build();
    let api = client(transport);

    let req = RequestDescriptor::post(
        url::Url::parse("https://api.twitter.com/oauth/access_token").unwrap(),
    );
    let resp = api.execute(req).await.unwrap();
    assert_eq!(resp.data.as_form().unwrap()["oauth_token_secret"], "s");

    let resp = api.execute(get("users/me")).await.unwrap();
    assert_eq!(resp.data.as_text(), Some("oauth_token=t"));
}

#[tokio::test]
async fn untyped_body_outside_oauth_stays_text() {
    let (transport, _handle) = mock()
        .replies([
            MockReply::ok_untyped(Bytes::from_static(b"a=1&b=2")),
            MockReply::ok_text(Bytes::from_static(b"{\"looks\":\"like json\"}")),
        ])
        .build();
    let api = client(transport);

    let resp = api.execute(get("users/me")).await.unwrap();
    assert_eq!(resp.data.as_text(), Some("a=1&b=2"));

    // content-type wins over the body's shape
    let resp = api.execute(get("users/me")).await.unwrap();
    assert_eq!(resp.data.as_text(), Some("{\"looks\":\"like json\"}"));
}

#[tokio::test]
async fn empty_json_body_resolves_as_empty_text() {
    let (transport, _handle) = mock()
        .reply(MockReply::json(StatusCode::NO_CONTENT, Bytes::new()))
        .build();
    let api = client(transport);

    let resp = api.execute(get("users/12/blocking/13")).await.unwrap();
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(resp.data.as_text(), Some(""));
}

#[tokio::test]
async fn rate_limit_headers_reach_the_resolved_response() {
    let (transport, _handle) = mock()
        .reply(
            MockReply::ok_json(json_bytes(&json!({ "data": [] }))).with_rate_limit(15, 14, 1_700_000_000),
        )
        .build();
    let api = client(transport);

    let resp = api.execute(get("users/12/followers")).await.unwrap();
    let rl = resp.rate_limit.unwrap();
    assert_eq!(rl.limit, 15);
    assert_eq!(rl.remaining, 14);
    assert_eq!(rl.reset, 1_700_000_000);
    assert!(!rl.is_exhausted());
}

#[derive(Deserialize, Debug)]
struct Envelope {
    data: User,
}

#[derive(Deserialize, Debug)]
struct User {
    id: String,
    username: String,
}

#[tokio::test]
async fn execute_json_deserializes_into_typed_value() {
    let (transport, _handle) = mock()
        .reply(MockReply::ok_json(json_bytes(
            &json!({ "data": { "id": "12", "username": "jack" } }),
        )))
        .build();
    let api = client(transport);

    let resp = api.execute_json::<Envelope>(get("users/12")).await.unwrap();
    assert_eq!(resp.data.data.id, "12");
    assert_eq!(resp.data.data.username, "jack");
}

#[tokio::test]
async fn execute_json_shape_mismatch_is_a_parse_error() {
    let (transport, _handle) = mock()
        .reply(MockReply::ok_json(json_bytes(&json!({ "data": { "id": 12 } }))))
        .build();
    let api = client(transport);

    let err = api.execute_json::<Envelope>(get("users/12")).await.unwrap_err();
    assert!(matches!(err, ApiClientError::Parse(_)), "{err:?}");
}

#[tokio::test]
async fn request_is_sent_as_given() {
    let (transport, handle) = mock()
        .reply(MockReply::ok_json(json_bytes(&json!({ "data": { "id": "1" } }))))
        .build();
    let api = client(transport);

    let req = RequestDescriptor::post(url::Url::parse("https://api.twitter.com/2/tweets").unwrap())
        .with_header(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        )
        .with_body(Bytes::from_static(b"{\"text\":\"hello\"}"))
        .with_timeout(Some(Duration::from_secs(3)));
    api.execute(req).await.unwrap();

    assert_request(&handle.recorded()[0])
        .method(http::Method::POST)
        .path("/2/tweets")
        .header("content-type", "application/json")
        .body(b"{\"text\":\"hello\"}")
        .timeout(Some(Duration::from_secs(3)));
}
