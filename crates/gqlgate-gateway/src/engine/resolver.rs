use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::BoxStream;
use serde_json::{Map, Value};

use gqlgate_core::error::Result;
use gqlgate_core::protocol::document::OperationKind;

/// Stream of root field values produced by a subscription.
pub type ValueStream = BoxStream<'static, Value>;

/// Per-operation context handed to resolvers.
#[derive(Debug, Clone)]
pub struct ResolveCtx {
    pub operation: OperationKind,
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
}

/// Query and mutation root fields.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    fn kind(&self) -> OperationKind;
    fn field(&self) -> &'static str;
    /// Type name reported by introspection.
    fn type_name(&self) -> &'static str {
        "String"
    }
    async fn resolve(&self, ctx: &ResolveCtx) -> Result<Value>;
}

/// Subscription root fields.
pub trait SubscriptionSource: Send + Sync {
    fn field(&self) -> &'static str;
    fn type_name(&self) -> &'static str {
        "String"
    }
    fn subscribe(&self, ctx: &ResolveCtx) -> Result<ValueStream>;
}

/// Registry of root field resolvers.
#[derive(Default)]
pub struct ResolverRegistry {
    queries: DashMap<&'static str, Arc<dyn FieldResolver>>,
    mutations: DashMap<&'static str, Arc<dyn FieldResolver>>,
    subscriptions: DashMap<&'static str, Arc<dyn SubscriptionSource>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self {
            queries: DashMap::new(),
            mutations: DashMap::new(),
            subscriptions: DashMap::new(),
        }
    }

    fn fields_of(&self, kind: OperationKind) -> Option<&DashMap<&'static str, Arc<dyn FieldResolver>>> {
        match kind {
            OperationKind::Query => Some(&self.queries),
            OperationKind::Mutation => Some(&self.mutations),
            OperationKind::Subscription => None,
        }
    }

    pub fn register_field(&self, r: Arc<dyn FieldResolver>) {
        match self.fields_of(r.kind()) {
            Some(map) => {
                map.insert(r.field(), r);
            }
            None => {
                tracing::warn!(field = r.field(), "subscription fields must be registered as SubscriptionSource");
            }
        }
    }

    pub fn register_subscription(&self, s: Arc<dyn SubscriptionSource>) {
        self.subscriptions.insert(s.field(), s);
    }

    pub fn field(&self, kind: OperationKind, name: &str) -> Option<Arc<dyn FieldResolver>> {
        self.fields_of(kind)?.get(name).map(|e| e.value().clone())
    }

    pub fn subscription(&self, name: &str) -> Option<Arc<dyn SubscriptionSource>> {
        self.subscriptions.get(name).map(|e| e.value().clone())
    }

    /// Whether `name` is a registered root field of `kind`.
    pub fn has_root_field(&self, kind: OperationKind, name: &str) -> bool {
        match self.fields_of(kind) {
            Some(map) => map.contains_key(name),
            None => self.subscriptions.contains_key(name),
        }
    }

    /// Root fields of `kind` as `(name, type)`, sorted by name.
    pub fn root_fields(&self, kind: OperationKind) -> Vec<(&'static str, &'static str)> {
        let mut out: Vec<_> = match self.fields_of(kind) {
            Some(map) => map.iter().map(|e| (*e.key(), e.value().type_name())).collect(),
            None => self
                .subscriptions
                .iter()
                .map(|e| (*e.key(), e.value().type_name()))
                .collect(),
        };
        out.sort_unstable();
        out
    }
}
