use serde::Deserialize;
use trawl_http::{Auth, HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Instance {
    uri: String,
}

#[tokio::test]
async fn sends_bearer_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/instance"))
        .and(header("authorization", "Bearer tok"))
        .and(query_param("limit", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "uri": "mastodon.example"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let got: Instance = client
        .get_json(
            "api/v1/instance",
            RequestOpts {
                auth: Some(Auth::Bearer(" tok ")),
                query: Some(vec![("limit", "40".into())]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(got.uri, "mastodon.example");
}

#[tokio::test]
async fn api_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/timelines/public"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(serde_json::json!({"error": "overloaded"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<serde_json::Value>("api/v1/timelines/public", RequestOpts::default())
        .await
        .unwrap_err();
    match &err {
        HttpError::Api { message, .. } => assert_eq!(message, "overloaded"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Instance>("api/v1/instance", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, ref snip) if snip == "not json"));
}
