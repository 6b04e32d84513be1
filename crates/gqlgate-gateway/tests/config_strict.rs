#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gqlgate_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  port: 8080
cache:
  documnet_capacity: 10 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.port, 8080);
    assert_eq!(cfg.gateway.endpoint, "/query");
    assert_eq!(cfg.gateway.keepalive_interval_ms, 10000);
    assert!(cfg.gateway.introspection);
    assert_eq!(cfg.cache.document_capacity, 1000);
    assert_eq!(cfg.cache.persisted_query_capacity, 100);
    assert_eq!(cfg.limits.max_body_bytes, 1024 * 1024);
    assert_eq!(cfg.limits.max_frame_bytes, 1024 * 1024);
    assert_eq!(
        cfg.origins.allowlist,
        vec!["http://localhost:3000".to_string(), "http://localhost:8080".to_string()]
    );
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
gateway:
  host: "127.0.0.1"
  port: 9000
  endpoint: "/graphql"
  keepalive_interval_ms: 5000
  introspection: false
origins:
  allowlist: ["https://app.example"]
cache:
  document_capacity: 10
  persisted_query_capacity: 2
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.gateway.listen_addr(), "127.0.0.1:9000");
    assert_eq!(cfg.gateway.endpoint, "/graphql");
    assert_eq!(cfg.origins.allowlist, vec!["https://app.example".to_string()]);
    assert_eq!(cfg.cache.persisted_query_capacity, 2);
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 2\n",
        "version: 1\ncache: { document_capacity: 0 }\n",
        "version: 1\ncache: { persisted_query_capacity: 0 }\n",
        "version: 1\ngateway: { endpoint: \"query\" }\n",
        "version: 1\ngateway: { endpoint: \"/\" }\n",
        "version: 1\ngateway: { keepalive_interval_ms: 10 }\n",
        "version: 1\norigins: { allowlist: [\"*\"] }\n",
        "version: 1\norigins: { allowlist: [\"\"] }\n",
        "version: 1\nlimits: { max_body_bytes: 10 }\n",
        "version: 1\nlimits: { max_frame_bytes: 0 }\n",
    ] {
        assert!(config::load_from_str(bad).is_err(), "should reject: {bad}");
    }
}

#[test]
fn port_override() {
    let mut cfg = config::load_from_str("version: 1\n").unwrap();
    cfg.gateway.apply_port_override("4000").unwrap();
    assert_eq!(cfg.gateway.port, 4000);
    cfg.gateway.apply_port_override("").unwrap();
    assert_eq!(cfg.gateway.port, 4000);
    assert!(cfg.gateway.apply_port_override("http").is_err());
}

#[test]
fn missing_file_uses_defaults() {
    let cfg = config::load_optional("/nonexistent/gqlgate.yaml").unwrap();
    assert_eq!(cfg.gateway.port, 8080);
    assert!(config::load_from_file("/nonexistent/gqlgate.yaml").is_err());
}
