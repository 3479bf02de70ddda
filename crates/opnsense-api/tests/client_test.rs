// Integration tests for `Client` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{basic_auth, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opnsense_api::routes::Route;
use opnsense_api::unbound::HostOverride;
use opnsense_api::{Client, Error, RetryPolicy, SelectedMap};

// ── Helpers ─────────────────────────────────────────────────────────

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        min_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        max_retries: 3,
    }
}

async fn setup() -> (MockServer, Client) {
    let server = MockServer::start().await;
    let client = Client::with_client(
        reqwest::Client::new(),
        &server.uri(),
        SecretString::from("key"),
        SecretString::from("secret"),
        fast_retry(),
    )
    .unwrap();
    (server, client)
}

async fn mount_reconfigure(server: &MockServer, endpoint: &str, status: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/api{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": status })))
        .mount(server)
        .await;
}

fn route() -> Route {
    Route {
        disabled: "0".into(),
        description: "lab".into(),
        gateway: SelectedMap::from("WAN_DHCP"),
        network: "10.0.0.0/8".into(),
    }
}

// ── CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_route_saves_and_reconfigures() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4().to_string();

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/addroute"))
        .and(basic_auth("key", "secret"))
        .and(body_json(json!({
            "route": {
                "disabled": "0",
                "descr": "lab",
                "gateway": "WAN_DHCP",
                "network": "10.0.0.0/8"
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": id })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/reconfigure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.routes().add_route(&route()).await.unwrap();
    assert_eq!(created, id);
}

#[tokio::test]
async fn test_get_route_decodes_selected_gateway() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "route": {
                "disabled": "0",
                "descr": "lab",
                "network": "10.0.0.0/8",
                "gateway": {
                    "Null4": { "value": "Null4 - 127.0.0.1", "selected": 0 },
                    "WAN_DHCP": { "value": "WAN_DHCP - 192.0.2.1", "selected": 1 }
                }
            }
        })))
        .mount(&server)
        .await;

    let got = client.routes().get_route("abc").await.unwrap();
    assert_eq!(got, route());
}

#[tokio::test]
async fn test_get_missing_item_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client.routes().get_route("gone").await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

#[tokio::test]
async fn test_update_and_delete_host_override() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/unbound/settings/setHostOverride/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "saved" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/unbound/settings/delHostOverride/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "deleted" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/unbound/service/reconfigure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(2)
        .mount(&server)
        .await;

    let host = HostOverride {
        enabled: "1".into(),
        hostname: "nas".into(),
        domain: "lan".into(),
        record_type: SelectedMap::from("A"),
        server: "10.0.0.5".into(),
        ..HostOverride::default()
    };
    client.unbound().update_host_override("h1", &host).await.unwrap();
    client.unbound().delete_host_override("h1").await.unwrap();
}

#[tokio::test]
async fn test_filter_apply_accepts_padded_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/firewall/filter/addRule"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": "f1" })),
        )
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/firewall/filter/apply", "OK\n\n").await;

    let id = client
        .firewall()
        .add_filter(&opnsense_api::firewall::Filter::default())
        .await
        .unwrap();
    assert_eq!(id, "f1");
}

#[tokio::test]
async fn test_category_skips_reconfigure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/firewall/category/addItem"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": "c1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let category = opnsense_api::firewall::Category {
        name: "web".into(),
        ..Default::default()
    };
    assert_eq!(client.firewall().add_category(&category).await.unwrap(), "c1");
}

// ── Failure modes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_failure_is_not_saved() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/addroute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "failed",
            "validations": { "route.network": "Please specify a valid network segment." }
        })))
        .mount(&server)
        .await;

    let err = client.routes().add_route(&route()).await.unwrap_err();
    match err {
        Error::NotSaved {
            kind, validations, ..
        } => {
            assert_eq!(kind, "route");
            assert!(validations.contains_key("route.network"));
        }
        other => panic!("expected NotSaved, got {other:?}"),
    }
}

#[tokio::test]
async fn test_add_without_uuid_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/addroute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "saved" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/routes/routes/reconfigure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.routes().add_route(&route()).await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_reconfigure_failure_after_add_is_partial_create() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/interfaces/vlan_settings/addItem"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": "v1" })),
        )
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/interfaces/vlan_settings/reconfigure", "failed").await;

    let err = client
        .interfaces()
        .add_vlan(&opnsense_api::interfaces::Vlan::default())
        .await
        .unwrap_err();
    assert_eq!(err.created_id(), Some("v1"));
}

#[tokio::test]
async fn test_delete_not_deleted() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/ipsec/vti/delItem/x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "failed" })))
        .mount(&server)
        .await;

    let err = client.ipsec().delete_vti("x").await.unwrap_err();
    assert!(matches!(err, Error::NotDeleted { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/abc"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.routes().get_route("abc").await.unwrap_err();
    assert!(matches!(err, Error::Authentication { status: 401 }), "got {err:?}");
}

// ── Retry ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/ipsec/pre_shared_keys/getItem/p1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ipsec/pre_shared_keys/getItem/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "preSharedKey": {
                "ident": "fw.example.com",
                "remote_ident": "peer.example.com",
                "Key": "s3cret",
                "keyType": { "PSK": { "value": "PSK", "selected": 1 }, "EAP": { "value": "EAP", "selected": 0 } },
                "description": ""
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let psk = client.ipsec().get_psk("p1").await.unwrap();
    assert_eq!(psk.key_type.as_str(), "PSK");
    assert_eq!(psk.pre_shared_key, "s3cret");
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/abc"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&server)
        .await;

    let err = client.routes().get_route("abc").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 502, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_not_implemented_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/abc"))
        .respond_with(ResponseTemplate::new(501))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.routes().get_route("abc").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 501, .. }), "got {err:?}");
}

// ── Diagnostics ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_interface_by_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/diagnostics/interface/getInterfaceConfig"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vtnet0": { "macaddr": "00:11:22:33:44:55", "mtu": "1500", "is_physical": true },
            "lo0": { "macaddr": "", "mtu": 16384, "is_physical": false }
        })))
        .mount(&server)
        .await;

    let vtnet0 = client.diagnostics().get_interface("vtnet0").await.unwrap();
    assert_eq!(vtnet0.device, "vtnet0");
    assert_eq!(vtnet0.mtu, "1500");

    let all = client.diagnostics().get_interface_all().await.unwrap();
    assert_eq!(all.keys().collect::<Vec<_>>(), ["lo0", "vtnet0"]);

    let err = client.diagnostics().get_interface("igb9").await.unwrap_err();
    assert!(err.is_not_found());
}
