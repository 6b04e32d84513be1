//! Persisted query extension tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use gqlgate_core::error::ClientCode;
use gqlgate_core::protocol::apq::{sha256_hex, PersistedQuery};
use gqlgate_core::protocol::request::GraphQLRequest;

#[test]
fn hash_is_lowercase_hex_sha256() {
    assert_eq!(
        sha256_hex(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(sha256_hex("{ ping }").len(), 64);
}

#[test]
fn verify_accepts_matching_hash_only() {
    let pq = PersistedQuery::for_query("{ ping }");
    pq.verify("{ ping }").unwrap();

    let upper = PersistedQuery::new(pq.sha256_hash.to_uppercase());
    upper.verify("{ ping }").unwrap();

    let err = pq.verify("{ other }").unwrap_err();
    assert_eq!(err.client_code(), ClientCode::PersistedQueryHashMismatch);
}

#[test]
fn unsupported_version_is_rejected() {
    let pq = PersistedQuery {
        version: 2,
        sha256_hash: "abc".into(),
    };
    assert_eq!(
        pq.check_version().unwrap_err().client_code(),
        ClientCode::PersistedQueryNotSupported
    );
}

#[test]
fn request_wire_shape() {
    let body = r#"{
        "operationName": "GetLastPing",
        "variables": {},
        "extensions": { "persistedQuery": { "version": 1, "sha256Hash": "abc" }, "clientLibrary": "x" },
        "somethingElse": true
    }"#;
    let req: GraphQLRequest = serde_json::from_str(body).unwrap();
    assert_eq!(req.query_text(), None);
    assert_eq!(req.operation_name.as_deref(), Some("GetLastPing"));
    assert_eq!(req.persisted_query().unwrap().sha256_hash, "abc");

    let encoded = serde_json::to_value(GraphQLRequest::new("{ ping }")).unwrap();
    assert_eq!(encoded, serde_json::json!({ "query": "{ ping }" }));
}
