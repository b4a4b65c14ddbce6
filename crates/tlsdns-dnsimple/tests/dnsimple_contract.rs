//! Contract tests for the DNSimple challenge provider

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tlsdns_core::challenge::challenge_value;
use tlsdns_core::{ChallengeProvider, Error};
use tlsdns_dnsimple::{Config, DnsimpleProvider, new_dns_provider_config};

const KEY_AUTH: &str = "token.thumbprint";

/// Route provider logs to the test output
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn provider_for(server: &MockServer) -> DnsimpleProvider {
    new_dns_provider_config(Config {
        access_token: "account-token".to_string(),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap()
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/whoami"))
        .and(header("Authorization", "Bearer account-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": null, "account": { "id": 1010, "email": "admin@example.com" } }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/1010/zones/example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 1, "account_id": 1010, "name": "example.com" }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_present_creates_relative_record() {
    init_tracing();
    let server = MockServer::start().await;
    mount_account(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/1010/zones/example.com/records"))
        .and(body_partial_json(json!({
            "name": "_acme-challenge.www",
            "type": "TXT",
            "content": challenge_value(KEY_AUTH),
            "ttl": 120
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 55, "name": "_acme-challenge.www", "type": "TXT" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Everything below example.com is unknown
    Mock::given(method("GET"))
        .and(path("/v2/1010/zones/_acme-challenge.www.example.com"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Zone not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/1010/zones/www.example.com"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Zone not found" })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider
        .present("www.example.com", "tok", KEY_AUTH)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cleanup_deletes_matching_records() {
    init_tracing();
    let server = MockServer::start().await;
    mount_account(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2/1010/zones/example.com/records"))
        .and(query_param("name", "_acme-challenge"))
        .and(query_param("type", "TXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 7, "name": "_acme-challenge", "type": "TXT" },
                { "id": 8, "name": "_acme-challenge", "type": "TXT" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v2/1010/zones/example.com/records/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2/1010/zones/example.com/records/8"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.cleanup("example.com", "tok", KEY_AUTH).await.unwrap();
}

#[tokio::test]
async fn test_account_looked_up_once() {
    init_tracing();
    let server = MockServer::start().await;
    mount_account(&server).await;

    Mock::given(method("POST"))
        .and(path("/v2/1010/zones/example.com/records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": 1 } })))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    provider.present("example.com", "a", KEY_AUTH).await.unwrap();
    provider.present("example.com", "b", KEY_AUTH).await.unwrap();
}

#[tokio::test]
async fn test_user_token_rejected() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": { "id": 1 }, "account": null }
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .present("example.com", "tok", KEY_AUTH)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "dnsimple: user tokens are not supported, please use an account token"
    );
}

#[tokio::test]
async fn test_unauthorized() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/whoami"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Authentication failed"
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .present("example.com", "tok", KEY_AUTH)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
}

#[tokio::test]
async fn test_unknown_zone() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/whoami"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "account": { "id": 1010 } }
        })))
        .mount(&server)
        .await;

    // No zone mocks: every lookup gets wiremock's default 404
    let provider = provider_for(&server);
    let err = provider
        .present("example.org", "tok", KEY_AUTH)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
