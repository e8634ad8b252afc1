#![allow(clippy::unwrap_used)]
// Integration tests for `Tunnel` against a wiremock daemon.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lokal_api::transport::USER_AGENT;
use lokal_api::{Banner, Client, ClientConfig, Credentials, Error, Options, TunnelState};

// ── Helpers ─────────────────────────────────────────────────────────

type BannerCall = (String, Option<String>, Option<String>);

#[derive(Clone, Default)]
struct RecordingBanner {
    calls: Arc<Mutex<Vec<BannerCall>>>,
}

impl Banner for RecordingBanner {
    fn render(&self, min_version: &str, public_address: Option<&str>, lan_address: Option<&str>) {
        self.calls.lock().unwrap().push((
            min_version.to_owned(),
            public_address.map(str::to_owned),
            lan_address.map(str::to_owned),
        ));
    }
}

async fn setup() -> (MockServer, Client, RecordingBanner) {
    let server = MockServer::start().await;
    let banner = RecordingBanner::default();
    let config = ClientConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        ..ClientConfig::default()
    };
    let client = Client::new(&config).unwrap().with_banner(banner.clone());
    (server, client, banner)
}

fn ok_body(tunnel: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "data": [tunnel] })
}

async fn mount_start(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

// ── create ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_without_exposure_makes_no_request() {
    let (server, client, _) = setup().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut tunnel = client.new_tunnel();
    tunnel.set_local_address("127.0.0.1:3000");

    let result = tunnel.create().await;
    assert!(
        matches!(result, Err(Error::MissingExposureTarget)),
        "expected MissingExposureTarget, got: {result:?}"
    );
}

#[tokio::test]
async fn test_create_merges_daemon_fields() {
    let (server, client, banner) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .and(body_partial_json(json!({
            "name": "db",
            "tunnel_type": "TCP",
            "local_address": "127.0.0.1:5432",
            "address_public": "1.2.3.4",
            "address_mdns": "",
            "inspect": false,
            "options": { "cidr_allow": ["10.0.0.0/8"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "server_id": "s1",
            "address_public": "1.2.3.4",
            "address_tunnel": "tunnel.lokal.so",
            "address_tunnel_port": 5000,
            "unrelated_field": { "nested": true }
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_name("db")
        .set_tunnel_type("TCP")
        .set_local_address("127.0.0.1:5432")
        .set_public_address("1.2.3.4")
        .set_options(Options::new().with_cidr_allow("10.0.0.0/8"));
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.id(), "t1");
    assert_eq!(tunnel.server_id(), "s1");
    assert_eq!(tunnel.address_public(), "1.2.3.4");
    assert_eq!(tunnel.address_tunnel(), "tunnel.lokal.so");
    assert_eq!(tunnel.address_tunnel_port(), 5000);
    assert_eq!(tunnel.name(), "db");
    assert_eq!(tunnel.state(), TunnelState::Created);
    assert!(banner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejected_leaves_tunnel_untouched() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "name taken",
            "data": [{ "id": "should-not-merge" }]
        })),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web");

    match tunnel.create().await {
        Err(Error::RequestRejected { message }) => assert_eq!(message, "name taken"),
        other => panic!("expected RequestRejected, got: {other:?}"),
    }
    assert_eq!(tunnel.id(), "");
    assert_eq!(tunnel.state(), TunnelState::Configured);
}

#[tokio::test]
async fn test_create_prints_banner_when_requested() {
    let (server, client, banner) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "server_id": "s1",
            "address_mdns": "web"
        }))),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web.local")
        .show_startup_banner();
    tunnel.create().await.unwrap();

    let calls = banner.calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![("0.6.0".to_owned(), None, Some("web.local".to_owned()))]
    );
}

// ── duplicate handling ──────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_adopted_when_ignored() {
    let (server, client, banner) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "message": "tunnel already exists",
            "data": [{ "id": "t1", "address_public": "1.2.3.4" }]
        })),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_public_address("1.2.3.4")
        .ignore_duplicate()
        .show_startup_banner();
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.id(), "t1");
    assert_eq!(tunnel.address_public(), "1.2.3.4");
    assert_eq!(tunnel.state(), TunnelState::Created);
    assert_eq!(banner.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_from_old_daemon_is_not_adopted() {
    let (server, client, banner) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(409)
            .insert_header("Lokal-Server-Version", "0.5.9")
            .set_body_json(json!({ "data": [{ "id": "t1", "address_mdns": "web" }] })),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web")
        .ignore_duplicate()
        .show_startup_banner();

    let result = tunnel.create().await;
    assert!(
        matches!(result, Err(Error::VersionMismatch { .. })),
        "expected VersionMismatch, got: {result:?}"
    );
    assert_eq!(tunnel.id(), "");
    assert_eq!(tunnel.state(), TunnelState::Configured);
    assert!(banner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_with_null_rule_lists_is_adopted() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(409)
            .insert_header("Lokal-Server-Version", "0.6.2")
            .set_body_json(json!({
                "success": false,
                "data": [{
                    "id": "t1",
                    "server_id": "s1",
                    "address_mdns": "web",
                    "options": { "header_key": null, "cidr_deny": ["0.0.0.0/0"] }
                }]
            })),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web")
        .set_options(Options::new().with_header_key("X-Key"))
        .ignore_duplicate();
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.id(), "t1");
    assert!(tunnel.options().header_key.is_empty());
    assert_eq!(tunnel.options().cidr_deny, ["0.0.0.0/0"]);
}

#[tokio::test]
async fn test_duplicate_propagated_by_default() {
    let (server, client, banner) = setup().await;

    let body = json!({ "data": [{ "id": "t1", "address_public": "1.2.3.4" }] });
    mount_start(&server, ResponseTemplate::new(409).set_body_json(&body)).await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_public_address("1.2.3.4")
        .show_startup_banner();

    match tunnel.create().await {
        Err(Error::DuplicateTunnel { body: raw, .. }) => {
            let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(parsed, body);
        }
        other => panic!("expected DuplicateTunnel, got: {other:?}"),
    }
    assert_eq!(tunnel.id(), "");
    assert!(banner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_other_status_is_never_absorbed() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(500).set_body_string("internal error"),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web")
        .ignore_duplicate();

    match tunnel.create().await {
        Err(Error::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
    assert_eq!(tunnel.state(), TunnelState::Configured);
}

#[tokio::test]
async fn test_create_accepts_null_rule_lists() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "server_id": "s1",
            "address_public": "1.2.3.4",
            "options": { "basic_auth": null, "cidr_allow": null }
        }))),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_public_address("1.2.3.4");
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.id(), "t1");
    assert_eq!(tunnel.state(), TunnelState::Created);
    assert!(tunnel.options().is_empty());
}

// ── version guard ───────────────────────────────────────────────────

#[tokio::test]
async fn test_old_daemon_is_rejected() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Lokal-Server-Version", "0.5.9")
            .set_body_json(ok_body(json!({ "id": "t1", "server_id": "s1" }))),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web");

    match tunnel.create().await {
        Err(Error::VersionMismatch { server, minimum }) => {
            assert_eq!(server, "0.5.9");
            assert_eq!(minimum, "0.6.0");
        }
        other => panic!("expected VersionMismatch, got: {other:?}"),
    }
    assert_eq!(tunnel.id(), "");
}

#[tokio::test]
async fn test_supported_daemon_is_accepted() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(200)
            .insert_header("Lokal-Server-Version", "0.6.0")
            .set_body_json(ok_body(json!({ "id": "t1", "server_id": "s1" }))),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web");
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.id(), "t1");
}

// ── public address resolution ───────────────────────────────────────

async fn created_tcp_tunnel(server: &MockServer, client: &Client) -> lokal_api::Tunnel {
    mount_start(
        server,
        ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "server_id": "s1",
            "address_public": "1.2.3.4"
        }))),
    )
    .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_tunnel_type("TCP")
        .set_local_address("127.0.0.1:5432")
        .set_public_address("1.2.3.4");
    tunnel.create().await.unwrap();
    tunnel
}

#[tokio::test]
async fn test_dynamic_port_polls_once_then_resolves() {
    let (server, client, _) = setup().await;
    let mut tunnel = created_tcp_tunnel(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "address_public": "1.2.3.4:8080"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let first = tunnel.public_address().await;
    assert!(
        matches!(first, Err(Error::PortNotYetAssigned)),
        "expected PortNotYetAssigned, got: {first:?}"
    );
    assert_eq!(tunnel.address_public(), "1.2.3.4:8080");

    let second = tunnel.public_address().await.unwrap();
    assert_eq!(second, "1.2.3.4:8080");
    assert_eq!(tunnel.state(), TunnelState::Resolved);
}

#[tokio::test]
async fn test_dynamic_port_still_pending() {
    let (server, client, _) = setup().await;
    let mut tunnel = created_tcp_tunnel(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "address_public": "1.2.3.4"
        }))))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let result = tunnel.public_address().await;
        assert!(matches!(result, Err(Error::PortNotYetAssigned)));
    }
    assert_eq!(tunnel.address_public(), "1.2.3.4");
    assert_eq!(tunnel.state(), TunnelState::Created);
}

#[tokio::test]
async fn test_poll_checks_daemon_version() {
    let (server, client, _) = setup().await;
    let mut tunnel = created_tcp_tunnel(&server, &client).await;

    Mock::given(method("GET"))
        .and(path("/api/tunnel/info/t1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Lokal-Server-Version", "0.1.0")
                .set_body_json(ok_body(json!({ "address_public": "1.2.3.4:8080" }))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = tunnel.public_address().await;
    assert!(matches!(result, Err(Error::VersionMismatch { .. })));
    assert_eq!(tunnel.address_public(), "1.2.3.4");
}

#[tokio::test]
async fn test_http_tunnel_returns_address_without_polling() {
    let (server, client, _) = setup().await;

    mount_start(
        &server,
        ResponseTemplate::new(200).set_body_json(ok_body(json!({
            "id": "t1",
            "server_id": "s1",
            "address_public": "app.lokal.so"
        }))),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_tunnel_type("HTTP")
        .set_local_address("127.0.0.1:3000")
        .set_public_address("app.lokal.so");
    tunnel.create().await.unwrap();

    assert_eq!(tunnel.public_address().await.unwrap(), "app.lokal.so");
}

#[tokio::test]
async fn test_public_address_preconditions() {
    let (_server, client, _) = setup().await;

    let mut tunnel = client.new_tunnel();
    tunnel.set_local_address("127.0.0.1:3000");
    assert!(matches!(
        tunnel.public_address().await,
        Err(Error::NoPublicAddressRequested)
    ));

    tunnel.set_public_address("1.2.3.4:9000");
    assert!(matches!(
        tunnel.public_address().await,
        Err(Error::TunnelNotCreated)
    ));
}

// ── transport headers ───────────────────────────────────────────────

#[tokio::test]
async fn test_requests_carry_identity_and_credentials() {
    let server = MockServer::start().await;
    let config = ClientConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        credentials: Credentials::basic("admin", "pw").with_api_token("tok"),
        ..ClientConfig::default()
    };
    let client = Client::new(&config)
        .unwrap()
        .with_banner(RecordingBanner::default());

    Mock::given(method("POST"))
        .and(path("/api/tunnel/start"))
        .and(header("User-Agent", USER_AGENT))
        .and(header("X-Auth-Token", "tok"))
        .and(header("Authorization", "Basic YWRtaW46cHc="))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!({ "id": "t1" }))))
        .expect(1)
        .mount(&server)
        .await;

    let mut tunnel = client.new_tunnel();
    tunnel
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("web");
    tunnel.create().await.unwrap();
    assert_eq!(tunnel.id(), "t1");
}

// ── reconfiguration ─────────────────────────────────────────────────

#[tokio::test]
async fn test_configure_reaches_only_later_tunnels() {
    let (old_daemon, mut client, _) = setup().await;
    let new_daemon = MockServer::start().await;

    for server in [&old_daemon, &new_daemon] {
        mount_start(
            server,
            ResponseTemplate::new(200)
                .set_body_json(ok_body(json!({ "id": "t1", "server_id": "s1" }))),
        )
        .await;
    }

    let mut before = client.new_tunnel();
    before
        .set_local_address("127.0.0.1:3000")
        .set_lan_address("before");

    client
        .configure(Url::parse(&new_daemon.uri()).unwrap(), None)
        .unwrap();

    let mut after = client.new_tunnel();
    after
        .set_local_address("127.0.0.1:3001")
        .set_lan_address("after");

    // Each mock expects exactly one start request.
    before.create().await.unwrap();
    after.create().await.unwrap();
}
