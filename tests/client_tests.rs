//! HTTP-level tests for the NetBox client
//!
//! The client is blocking, so each test drives it from
//! `tokio::task::spawn_blocking` against a wiremock server.

use nbgen::config::NetboxConfig;
use nbgen::netbox::{Collection, NetboxClient};
use nbgen::Error;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> NetboxConfig {
    NetboxConfig {
        host: server.address().to_string(),
        token: "0123456789abcdef".to_string(),
        tls: false,
        ..NetboxConfig::default()
    }
}

fn page(results: serde_json::Value) -> serde_json::Value {
    let count = results.as_array().map_or(0, |r| r.len());
    json!({"count": count, "next": null, "previous": null, "results": results})
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requests_carry_token_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tenancy/tenants/"))
        .and(query_param("limit", "9999"))
        .and(header("Authorization", "Token 0123456789abcdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"id": 1, "name": "AS65342", "slug": "as65342"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let (first, second) = tokio::task::spawn_blocking(move || {
        let client = NetboxClient::new(&config)?;
        Ok::<_, Error>((client.tenants()?, client.tenants()?))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second[0].slug, "as65342");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_each_collection_hits_its_endpoint() {
    let server = MockServer::start().await;

    for endpoint in [
        "/api/ipam/prefixes/",
        "/api/ipam/ip-addresses/",
        "/api/dcim/devices/",
        "/api/virtualization/virtual-machines/",
        "/api/extras/config-contexts/",
        "/api/tenancy/tenants/",
    ] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
            .expect(1)
            .mount(&server)
            .await;
    }

    let config = config_for(&server);
    tokio::task::spawn_blocking(move || NetboxClient::new(&config)?.prewarm())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_retrieval_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/dcim/devices/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let (first, second) = tokio::task::spawn_blocking(move || {
        let client = NetboxClient::new(&config).unwrap();
        (client.devices().unwrap_err(), client.devices().unwrap_err())
    })
    .await
    .unwrap();

    // failures are not cached, so the second call asks again
    for err in [&first, &second] {
        assert_eq!(err.collection(), Some(Collection::Devices));
        assert!(err.to_string().contains("HTTP 500"), "{}", err);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_undecodable_body_is_retrieval_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/ipam/prefixes/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = tokio::task::spawn_blocking(move || {
        NetboxClient::new(&config).unwrap().prefixes().unwrap_err()
    })
    .await
    .unwrap();

    assert!(err.is_retrieval());
    assert_eq!(err.collection(), Some(Collection::Prefixes));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_configured_limit_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/ipam/ip-addresses/"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
            {"address": "10.0.1.10/24", "dns_name": "web01.as65342.net", "tenant": {"slug": "as65342"}}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.limit = 50;
    let addresses = tokio::task::spawn_blocking(move || NetboxClient::new(&config)?.ip_addresses())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(addresses[0].address, "10.0.1.10/24");
}
