// End-to-end lifecycle tests: provider registry -> handlers -> client,
// against a wiremock appliance.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use opnsense_provider::OpnsenseProvider;

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OpnsenseProvider) {
    let server = MockServer::start().await;
    let provider = OpnsenseProvider::new();
    let diags = provider.configure(json!({
        "uri": server.uri(),
        "api_key": "key",
        "api_secret": "secret",
        "retries": 1
    }));
    assert!(diags.is_empty(), "configure failed: {diags:?}");
    (server, provider)
}

async fn mount_reconfigure(server: &MockServer, endpoint: &str, status: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/api{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": status })))
        .mount(server)
        .await;
}

fn selected(key: &str) -> Value {
    json!({ key: { "value": key, "selected": 1 } })
}

// ── Routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_route_create_reports_id_and_defaults() {
    let (server, provider) = setup().await;
    let id = Uuid::new_v4().to_string();

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/addroute"))
        .and(body_json(json!({
            "route": {
                "disabled": "0",
                "descr": "",
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
    mount_reconfigure(&server, "/routes/routes/reconfigure", "ok").await;

    let outcome = provider
        .create_resource(
            "opnsense_route",
            json!({ "gateway": "WAN_DHCP", "network": "10.0.0.0/8" }),
        )
        .await;

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let state = outcome.state.unwrap();
    assert_eq!(state["id"], json!(id));
    assert_eq!(state["enabled"], json!(true));
    assert_eq!(state["description"], Value::Null);
}

#[tokio::test]
async fn test_route_read_of_deleted_item_removes_state() {
    let (server, provider) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let outcome = provider
        .read_resource(
            "opnsense_route",
            json!({ "id": "gone", "gateway": "WAN_DHCP", "network": "10.0.0.0/8" }),
        )
        .await;

    assert_eq!(outcome.state, None);
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn test_route_update_and_delete() {
    let (server, provider) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/setroute/r1"))
        .and(body_json(json!({
            "route": {
                "disabled": "1",
                "descr": "lab",
                "gateway": "WAN_DHCP",
                "network": "10.0.0.0/8"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "saved" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/routes/routes/delroute/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "deleted" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/routes/routes/reconfigure", "ok").await;

    let prior = json!({
        "id": "r1",
        "enabled": true,
        "description": null,
        "gateway": "WAN_DHCP",
        "network": "10.0.0.0/8"
    });
    let outcome = provider
        .update_resource(
            "opnsense_route",
            json!({
                "enabled": false,
                "description": "lab",
                "gateway": "WAN_DHCP",
                "network": "10.0.0.0/8"
            }),
            prior.clone(),
        )
        .await;
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let state = outcome.state.unwrap();
    assert_eq!(state["id"], json!("r1"));
    assert_eq!(state["enabled"], json!(false));

    let diags = provider.delete_resource("opnsense_route", state).await;
    assert!(diags.is_empty(), "{diags:?}");
}

#[tokio::test]
async fn test_rejected_save_becomes_diagnostic() {
    let (server, provider) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/routes/routes/addroute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "failed",
            "validations": { "route.network": "A valid network is required." }
        })))
        .mount(&server)
        .await;

    let outcome = provider
        .create_resource(
            "opnsense_route",
            json!({ "gateway": "WAN_DHCP", "network": "10.0.0.0/8" }),
        )
        .await;

    assert_eq!(outcome.state, None);
    let diag = outcome.diagnostics.iter().next().unwrap();
    assert!(diag.detail.starts_with("Unable to create route"), "{diag:?}");
}

// ── VLANs ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_vlan_partial_create_keeps_id() {
    let (server, provider) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/interfaces/vlan_settings/addItem"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": "v1" })),
        )
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/interfaces/vlan_settings/reconfigure", "failed").await;

    let outcome = provider
        .create_resource(
            "opnsense_interfaces_vlan",
            json!({ "tag": 10, "parent": "vtnet0" }),
        )
        .await;

    assert!(outcome.diagnostics.has_error());
    let state = outcome.state.unwrap();
    assert_eq!(state["id"], json!("v1"));
    assert_eq!(state["tag"], json!(10));
}

#[tokio::test]
async fn test_vlan_read_keeps_unset_device() {
    let (server, provider) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/interfaces/vlan_settings/getItem/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vlan": {
                "descr": "",
                "tag": "10",
                "pcp": selected("3"),
                "if": selected("vtnet0"),
                "vlanif": "vlan0.10"
            }
        })))
        .mount(&server)
        .await;

    let prior = json!({
        "id": "v1",
        "description": null,
        "tag": 10,
        "priority": 3,
        "parent": "vtnet0",
        "device": ""
    });
    let outcome = provider
        .read_resource("opnsense_interfaces_vlan", prior.clone())
        .await;
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.state, Some(prior));

    // After an import the generated name is reported as-is.
    let outcome = provider
        .read_resource("opnsense_interfaces_vlan", json!({ "id": "v1" }))
        .await;
    assert_eq!(outcome.state.unwrap()["device"], json!("vlan0.10"));
}

// ── WireGuard ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_wireguard_server_create_picks_up_instance() {
    let (server, provider) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/wireguard/server/addServer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": "s1" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/wireguard/server/getServer/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "server": {
                "enabled": "1",
                "name": "wg-home",
                "pubkey": "cHVi",
                "privkey": "cHJpdg==",
                "port": "",
                "mtu": "",
                "dns": "",
                "tunneladdress": { "10.8.0.1/24": { "value": "10.8.0.1/24", "selected": 1 } },
                "peers": "",
                "disableroutes": "0",
                "gateway": "",
                "instance": "3"
            }
        })))
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/wireguard/service/reconfigure", "ok").await;

    let outcome = provider
        .create_resource(
            "opnsense_wireguard_server",
            json!({
                "name": "wg-home",
                "public_key": "cHVi",
                "private_key": "cHJpdg==",
                "tunnel_address": ["10.8.0.1/24"]
            }),
        )
        .await;

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let state = outcome.state.unwrap();
    assert_eq!(state["id"], json!("s1"));
    assert_eq!(state["instance"], json!("3"));
    assert_eq!(state["port"], json!(-1));
}

#[tokio::test]
async fn test_wireguard_server_update_keeps_instance() {
    let (server, provider) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/wireguard/server/setServer/s1"))
        .and(body_json(json!({
            "server": {
                "enabled": "1",
                "name": "wg-home",
                "pubkey": "cHVi",
                "privkey": "cHJpdg==",
                "port": "51821",
                "mtu": "",
                "dns": "",
                "tunneladdress": "10.8.0.1/24",
                "peers": "",
                "disableroutes": "0",
                "gateway": "",
                "instance": ""
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "saved" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/wireguard/service/reconfigure", "ok").await;

    let plan = json!({
        "name": "wg-home",
        "public_key": "cHVi",
        "private_key": "cHJpdg==",
        "port": 51821,
        "tunnel_address": ["10.8.0.1/24"]
    });
    let prior = json!({
        "id": "s1",
        "name": "wg-home",
        "public_key": "cHVi",
        "private_key": "cHJpdg==",
        "tunnel_address": ["10.8.0.1/24"],
        "instance": "3"
    });
    let outcome = provider
        .update_resource("opnsense_wireguard_server", plan, prior)
        .await;

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let state = outcome.state.unwrap();
    assert_eq!(state["instance"], json!("3"));
    assert_eq!(state["port"], json!(51821));
}

#[tokio::test]
async fn test_wireguard_client_data_source() {
    let (server, provider) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/wireguard/client/getClient/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "client": {
                "enabled": "1",
                "name": "laptop",
                "pubkey": "bGFwdG9w",
                "psk": "",
                "tunneladdress": "10.8.0.2/32",
                "serveraddress": "",
                "serverport": "",
                "keepalive": "25"
            }
        })))
        .mount(&server)
        .await;

    let outcome = provider
        .read_data_source("opnsense_wireguard_client", json!({ "id": "c1" }))
        .await;
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(
        outcome.state,
        Some(json!({
            "id": "c1",
            "enabled": true,
            "name": "laptop",
            "public_key": "bGFwdG9w",
            "psk": "",
            "tunnel_address": ["10.8.0.2/32"],
            "server_address": "",
            "server_port": -1,
            "keep_alive": 25
        }))
    );
}

// ── Unbound forwards ────────────────────────────────────────────────

#[tokio::test]
async fn test_unbound_forward_create_and_data_source() {
    let (server, provider) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/unbound/settings/addDot"))
        .and(body_json(json!({
            "dot": {
                "enabled": "1",
                "domain": "",
                "type": "forward",
                "server": "9.9.9.9",
                "port": "53",
                "verify": ""
            }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "saved", "uuid": "f1" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/unbound/settings/getDot/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dot": {
                "enabled": "1",
                "domain": "",
                "type": {
                    "dot": { "value": "DNS over TLS", "selected": 0 },
                    "forward": { "value": "Forward", "selected": 1 }
                },
                "server": "9.9.9.9",
                "port": "53",
                "verify": ""
            }
        })))
        .mount(&server)
        .await;
    mount_reconfigure(&server, "/unbound/service/reconfigure", "ok").await;

    let created = provider
        .create_resource("opnsense_unbound_forward", json!({ "server_ip": "9.9.9.9" }))
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);

    let read = provider
        .read_data_source("opnsense_unbound_forward", json!({ "id": "f1" }))
        .await;
    assert!(read.diagnostics.is_empty(), "{:?}", read.diagnostics);
    assert_eq!(read.state, created.state);
}

// ── Data sources ────────────────────────────────────────────────────

#[tokio::test]
async fn test_data_source_reads_by_id() {
    let (server, provider) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/unbound/settings/getDomainOverride/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "domain": {
                "enabled": "1",
                "domain": "lab.internal",
                "server": "10.0.0.53",
                "description": ""
            }
        })))
        .mount(&server)
        .await;

    let outcome = provider
        .read_data_source("opnsense_unbound_domain_override", json!({ "id": "d1" }))
        .await;
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(
        outcome.state,
        Some(json!({
            "id": "d1",
            "enabled": true,
            "domain": "lab.internal",
            "server": "10.0.0.53",
            "description": null
        }))
    );
}

#[tokio::test]
async fn test_data_source_missing_item_is_an_error() {
    let (server, provider) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/routes/routes/getroute/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let outcome = provider
        .read_data_source("opnsense_route", json!({ "id": "gone" }))
        .await;
    assert_eq!(outcome.state, None);
    assert!(outcome.diagnostics.has_error());
}
