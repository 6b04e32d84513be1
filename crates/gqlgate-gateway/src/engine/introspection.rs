//! Minimal schema introspection derived from the resolver registry.
//!
//! Covers what explorers ask first (`__schema { queryType mutationType
//! subscriptionType types }`). Objects carry their own `__typename` so the
//! projection step can answer it at any depth.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use gqlgate_core::protocol::document::OperationKind;

use super::resolver::ResolverRegistry;

const KINDS: [OperationKind; 3] = [
    OperationKind::Query,
    OperationKind::Mutation,
    OperationKind::Subscription,
];

/// Root fields every operation may select regardless of the registry.
pub fn is_meta_field(name: &str) -> bool {
    matches!(name, "__typename" | "__schema" | "__type")
}

pub fn schema(registry: &ResolverRegistry) -> Value {
    let mut types = Vec::new();
    let mut scalars = BTreeSet::new();
    let mut roots = [Value::Null, Value::Null, Value::Null];

    for (slot, kind) in roots.iter_mut().zip(KINDS) {
        let fields = registry.root_fields(kind);
        // Query always exists; other roots only when something is registered.
        if fields.is_empty() && kind != OperationKind::Query {
            continue;
        }
        *slot = type_ref(kind.root_type(), "OBJECT");
        types.push(object_type(kind.root_type(), &fields));
        scalars.extend(fields.iter().map(|(_, ty)| *ty));
    }
    types.extend(scalars.into_iter().map(scalar_type));

    let [query, mutation, subscription] = roots;
    json!({
        "__typename": "__Schema",
        "queryType": query,
        "mutationType": mutation,
        "subscriptionType": subscription,
        "types": types,
        "directives": [],
    })
}

fn type_ref(name: &str, kind: &str) -> Value {
    json!({ "__typename": "__Type", "name": name, "kind": kind })
}

fn object_type(name: &str, fields: &[(&'static str, &'static str)]) -> Value {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(field, ty)| {
            json!({
                "__typename": "__Field",
                "name": field,
                "args": [],
                "type": type_ref(ty, "SCALAR"),
                "isDeprecated": false,
                "deprecationReason": null,
            })
        })
        .collect();
    json!({
        "__typename": "__Type",
        "name": name,
        "kind": "OBJECT",
        "description": null,
        "fields": fields,
        "interfaces": [],
    })
}

fn scalar_type(name: &str) -> Value {
    json!({
        "__typename": "__Type",
        "name": name,
        "kind": "SCALAR",
        "description": null,
        "fields": null,
        "interfaces": null,
    })
}
