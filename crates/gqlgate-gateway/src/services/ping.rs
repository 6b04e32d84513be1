//! `ping` root fields.
//!
//! - `query { ping }`: last ping instant (RFC 3339) or `null`
//! - `mutation { ping }`: record a ping now and publish it
//! - `subscription { ping }`: every ping recorded after subscribing

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use gqlgate_core::error::Result;
use gqlgate_core::protocol::document::OperationKind;

use crate::engine::{FieldResolver, ResolveCtx, ResolverRegistry, SubscriptionSource, ValueStream};
use crate::monitor::SharedTimestamp;

const FIELD: &str = "ping";
const FANOUT_CAPACITY: usize = 64;

/// Ping state: the shared last-ping timestamp plus a fan-out channel for
/// subscribers.
pub struct PingHub {
    last: Arc<SharedTimestamp>,
    tx: broadcast::Sender<DateTime<Utc>>,
}

impl PingHub {
    pub fn new(last: Arc<SharedTimestamp>) -> Self {
        let (tx, _) = broadcast::channel(FANOUT_CAPACITY);
        Self { last, tx }
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last.get()
    }

    /// Record a ping and notify subscribers. No subscribers is fine.
    pub fn trigger(&self) -> DateTime<Utc> {
        let now = self.last.touch();
        let _ = self.tx.send(now);
        now
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DateTime<Utc>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub fn format_instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Register all ping resolvers.
pub fn register(registry: &ResolverRegistry, hub: Arc<PingHub>) {
    registry.register_field(Arc::new(PingQuery { hub: Arc::clone(&hub) }));
    registry.register_field(Arc::new(PingMutation { hub: Arc::clone(&hub) }));
    registry.register_subscription(Arc::new(PingSubscription { hub }));
}

struct PingQuery {
    hub: Arc<PingHub>,
}

#[async_trait]
impl FieldResolver for PingQuery {
    fn kind(&self) -> OperationKind {
        OperationKind::Query
    }

    fn field(&self) -> &'static str {
        FIELD
    }

    async fn resolve(&self, _ctx: &ResolveCtx) -> Result<Value> {
        Ok(self
            .hub
            .last()
            .map(|t| Value::String(format_instant(t)))
            .unwrap_or(Value::Null))
    }
}

struct PingMutation {
    hub: Arc<PingHub>,
}

#[async_trait]
impl FieldResolver for PingMutation {
    fn kind(&self) -> OperationKind {
        OperationKind::Mutation
    }

    fn field(&self) -> &'static str {
        FIELD
    }

    async fn resolve(&self, _ctx: &ResolveCtx) -> Result<Value> {
        let at = self.hub.trigger();
        tracing::debug!(at = %at, subscribers = self.hub.subscriber_count(), "ping");
        Ok(Value::String(format_instant(at)))
    }
}

struct PingSubscription {
    hub: Arc<PingHub>,
}

impl SubscriptionSource for PingSubscription {
    fn field(&self) -> &'static str {
        FIELD
    }

    fn subscribe(&self, _ctx: &ResolveCtx) -> Result<ValueStream> {
        let rx = self.hub.subscribe();
        let s = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(t) => return Some((Value::String(format_instant(t)), rx)),
                    // Slow subscriber: skip to the newest values.
                    Err(RecvError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "ping subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        Ok(s.boxed())
    }
}
