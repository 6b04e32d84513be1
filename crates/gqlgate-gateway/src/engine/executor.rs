use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use serde_json::{Map, Value};

use gqlgate_core::error::{GqlGateError, Result};
use gqlgate_core::protocol::document::{self, Document, Field, OperationDefinition, OperationKind};
use gqlgate_core::protocol::request::GraphQLRequest;
use gqlgate_core::protocol::response::{GraphQLError, GraphQLResponse};

use crate::cache::{SharedDocumentCache, SharedPersistedQueryCache};

use super::introspection;
use super::resolver::{ResolveCtx, ResolverRegistry};

/// Execution engine.
/// Construct once at startup, then share via Arc.
pub struct ExecutionEngine {
    registry: ResolverRegistry,
    documents: SharedDocumentCache,
    persisted: SharedPersistedQueryCache,
    introspection: bool,
}

/// A request that passed parsing and validation.
#[derive(Debug, Clone)]
pub struct PreparedOperation {
    document: Arc<Document>,
    index: usize,
    ctx: ResolveCtx,
}

impl PreparedOperation {
    pub fn kind(&self) -> OperationKind {
        self.ctx.operation
    }

    pub fn definition(&self) -> &OperationDefinition {
        &self.document.operations[self.index]
    }

    pub fn ctx(&self) -> &ResolveCtx {
        &self.ctx
    }
}

impl ExecutionEngine {
    pub fn new(
        registry: ResolverRegistry,
        documents: SharedDocumentCache,
        persisted: SharedPersistedQueryCache,
        introspection: bool,
    ) -> Self {
        Self {
            registry,
            documents,
            persisted,
            introspection,
        }
    }

    /// Query text for a request, going through the persisted query cache
    /// when the request carries an APQ extension.
    pub fn resolve_query_text(&self, req: &GraphQLRequest) -> Result<String> {
        match (req.persisted_query(), req.query_text()) {
            (None, Some(q)) => Ok(q.to_string()),
            (None, None) => Err(GqlGateError::BadRequest("no operation provided".into())),
            (Some(pq), None) => {
                pq.check_version()?;
                // Hex digests compare case-insensitively; keys are stored lowercase.
                self.persisted
                    .lookup(&pq.sha256_hash.to_ascii_lowercase())
                    .ok_or(GqlGateError::PersistedQueryNotFound)
            }
            (Some(pq), Some(q)) => {
                pq.check_version()?;
                pq.verify(q)?;
                let hash = pq.sha256_hash.to_ascii_lowercase();
                tracing::debug!(%hash, "persisted query registered");
                self.persisted.insert(hash, q.to_string());
                Ok(q.to_string())
            }
        }
    }

    /// Parsed document for `text`, parsing and caching on a miss.
    pub fn document(&self, text: &str) -> Result<Arc<Document>> {
        if let Some(doc) = self.documents.lookup(text) {
            return Ok(doc);
        }
        let doc = Arc::new(document::parse(text)?);
        self.documents.insert(text.to_string(), Arc::clone(&doc));
        Ok(doc)
    }

    /// Resolve, parse and validate a request.
    pub fn prepare(&self, req: &GraphQLRequest) -> Result<PreparedOperation> {
        let text = self.resolve_query_text(req)?;
        let document = self.document(&text)?;

        let name = req.operation_name.as_deref();
        let op = document.operation(name)?;
        let index = document
            .operations
            .iter()
            .position(|o| std::ptr::eq(o, op))
            .ok_or_else(|| GqlGateError::Internal("selected operation missing".into()))?;

        self.validate(op)?;

        let ctx = ResolveCtx {
            operation: op.kind,
            operation_name: op.name.clone(),
            variables: req.variables.clone().unwrap_or_default(),
        };
        Ok(PreparedOperation {
            document,
            index,
            ctx,
        })
    }

    fn validate(&self, op: &OperationDefinition) -> Result<()> {
        let root = op.kind.root_type();
        for field in &op.selection_set {
            let name = field.name.as_str();
            if introspection::is_meta_field(name) {
                if name != "__typename" && (!self.introspection || op.kind != OperationKind::Query) {
                    return Err(GqlGateError::ValidationFailed(format!(
                        "Cannot query field \"{name}\" on type \"{root}\"."
                    )));
                }
                continue;
            }
            if !self.registry.has_root_field(op.kind, name) {
                return Err(GqlGateError::ValidationFailed(format!(
                    "Cannot query field \"{name}\" on type \"{root}\"."
                )));
            }
        }

        if op.kind == OperationKind::Subscription && op.selection_set.len() != 1 {
            return Err(GqlGateError::ValidationFailed(
                "subscription must select only one top level field".into(),
            ));
        }
        if op.kind == OperationKind::Subscription && op.selection_set[0].name.starts_with("__") {
            return Err(GqlGateError::ValidationFailed(
                "subscription must not select an introspection top level field".into(),
            ));
        }
        Ok(())
    }

    /// Execute a query or mutation. Root fields run in document order.
    pub async fn execute(&self, op: &PreparedOperation) -> GraphQLResponse {
        let kind = op.kind();
        if kind == OperationKind::Subscription {
            let err = GqlGateError::OperationNotSupported(
                "subscriptions must be started with subscribe".into(),
            );
            return GraphQLResponse::error(&err);
        }

        let mut data = Map::new();
        let mut errors = Vec::new();

        for field in &op.definition().selection_set {
            let key = field.response_key();
            let value = match field.name.as_str() {
                "__typename" => Ok(Value::String(kind.root_type().to_string())),
                "__schema" => Ok(introspection::schema(&self.registry)),
                // Type lookup by name is not supported; answer like an unknown type.
                "__type" => Ok(Value::Null),
                name => match self.registry.field(kind, name) {
                    Some(r) => r.resolve(op.ctx()).await,
                    None => Err(GqlGateError::ValidationFailed(format!(
                        "Cannot query field \"{name}\" on type \"{}\".",
                        kind.root_type()
                    ))),
                },
            };

            match value {
                Ok(v) => {
                    data.insert(key.to_string(), project(&v, &field.selection_set));
                }
                Err(e) => {
                    tracing::debug!(field = %field.name, error = %e, "resolver failed");
                    errors.push(GraphQLError::from(&e).with_path(key));
                    data.insert(key.to_string(), Value::Null);
                }
            }
        }

        GraphQLResponse {
            data: Some(Value::Object(data)),
            errors,
        }
    }

    /// Start a subscription. Each produced value becomes one response.
    pub fn subscribe(&self, op: &PreparedOperation) -> Result<BoxStream<'static, GraphQLResponse>> {
        if op.kind() != OperationKind::Subscription {
            return Err(GqlGateError::OperationNotSupported(format!(
                "{} cannot be subscribed to",
                op.kind().as_str()
            )));
        }

        let field = op
            .definition()
            .selection_set
            .first()
            .cloned()
            .ok_or_else(|| GqlGateError::Internal("empty subscription".into()))?;
        let source = self.registry.subscription(&field.name).ok_or_else(|| {
            GqlGateError::ValidationFailed(format!(
                "Cannot query field \"{}\" on type \"Subscription\".",
                field.name
            ))
        })?;

        let stream = source.subscribe(op.ctx())?;
        Ok(stream
            .map(move |v| {
                let mut data = Map::new();
                data.insert(field.response_key().to_string(), project(&v, &field.selection_set));
                GraphQLResponse::data(Value::Object(data))
            })
            .boxed())
    }
}

/// Shape a resolved value by the field's sub-selection.
fn project(value: &Value, selection: &[Field]) -> Value {
    if selection.is_empty() {
        return value.clone();
    }
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for f in selection {
                let v = map
                    .get(&f.name)
                    .map(|v| project(v, &f.selection_set))
                    .unwrap_or(Value::Null);
                out.insert(f.response_key().to_string(), v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| project(v, selection)).collect()),
        other => other.clone(),
    }
}
