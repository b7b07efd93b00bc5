//! Integration tests for the Consul KV source against a mock HTTP server.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use strata_consul::ConsulSource;
use strata_core::source::Source;
use strata_core::{StrataBuilder, codec};

fn kv_body(payload: &serde_json::Value) -> serde_json::Value {
    json!([{ "Key": "app/config", "Value": BASE64.encode(payload.to_string()) }])
}

#[tokio::test]
#[serial]
async fn test_load_decodes_base64_kv_value() {
    codec::register_defaults();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv_body(&json!({ "server": { "port": 9090 } }))),
        )
        .mount(&server)
        .await;

    let source = ConsulSource::new("app/config", codec::JSON)
        .unwrap()
        .with_address(server.uri());
    let fragment = source.load().await.unwrap();
    assert_eq!(fragment["server"]["port"], 9090);
}

#[tokio::test]
#[serial]
async fn test_missing_key_contributes_empty_fragment() {
    codec::register_defaults();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = ConsulSource::new("app/missing", codec::JSON)
        .unwrap()
        .with_address(server.uri());
    assert!(source.load().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_token_is_sent_when_configured() {
    codec::register_defaults();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .and(header("X-Consul-Token", "secret-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(kv_body(&json!({ "a": 1 }))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = temp_env::with_var("CONSUL_HTTP_TOKEN", Some("secret-token"), || {
        ConsulSource::new("app/config", codec::JSON).unwrap()
    })
    .with_address(server.uri());

    let fragment = source.load().await.unwrap();
    assert_eq!(fragment["a"], 1);
}

#[tokio::test]
#[serial]
async fn test_server_error_fails_load() {
    codec::register_defaults();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = ConsulSource::new("app/config", codec::JSON)
        .unwrap()
        .with_address(server.uri());
    let err = source.load().await.unwrap_err();
    assert_eq!(err.operation(), "load");
    assert_eq!(err.origin(), "consul:app/config");
}

#[tokio::test]
#[serial]
async fn test_debug_output_redacts_token() {
    codec::register_defaults();
    let source = temp_env::with_var("CONSUL_HTTP_TOKEN", Some("secret-token"), || {
        ConsulSource::new("app/config", codec::JSON).unwrap()
    });

    let rendered = format!("{source:?}");
    assert!(!rendered.contains("secret-token"), "{rendered}");
    assert!(rendered.contains("app/config"), "{rendered}");
}

#[tokio::test]
#[serial]
async fn test_unregistered_format_fails_at_construction() {
    let err = ConsulSource::new("app/config", "smoke-signals").unwrap_err();
    assert_eq!(err.operation(), "init");
}

#[tokio::test]
#[serial]
async fn test_consul_fragment_merges_like_any_source() {
    codec::register_defaults();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/kv/app/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv_body(&json!({ "Server": { "Host": "from-consul" } }))),
        )
        .mount(&server)
        .await;

    let source = ConsulSource::new("app/config", codec::JSON)
        .unwrap()
        .with_address(server.uri());

    let config = StrataBuilder::new()
        .with_content_source(&br#"{"server":{"host":"local","port":1}}"#[..], codec::JSON)
        .with_source(Box::new(source))
        .build()
        .unwrap();
    config.load().await.unwrap();

    // Remote source is declared later, so it overrides; unrelated keys stay.
    assert_eq!(config.get_string("server.host"), "from-consul");
    assert_eq!(config.get_int("server.port"), 1);
}
