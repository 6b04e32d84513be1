//! Shared application state for the gqlgate gateway.
//!
//! Everything shared across connections is built here exactly once and handed
//! out by handle: the origin policy, both query caches (inside the engine)
//! and the last-ping timestamp.

use std::sync::Arc;

use gqlgate_core::error::Result;
use gqlgate_core::protocol::document::Document;

use crate::cache::{BoundedLru, SharedDocumentCache, SharedPersistedQueryCache};
use crate::config::GatewayConfig;
use crate::engine::{ExecutionEngine, ResolverRegistry};
use crate::monitor::SharedTimestamp;
use crate::policy::OriginPolicy;
use crate::services::{ping, PingHub};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    engine: Arc<ExecutionEngine>,
    last_ping: Arc<SharedTimestamp>,
    ping_hub: Arc<PingHub>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    origin_policy: OriginPolicy,
}

impl AppState {
    /// Build application state with caches sized from config.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let documents: SharedDocumentCache = Arc::new(BoundedLru::<Arc<Document>>::with_capacity(
            "document",
            cfg.cache.document_capacity,
        )?);
        let persisted: SharedPersistedQueryCache = Arc::new(BoundedLru::<String>::with_capacity(
            "persisted_query",
            cfg.cache.persisted_query_capacity,
        )?);
        Self::with_caches(cfg, documents, persisted)
    }

    /// Build application state around caller-supplied caches.
    pub fn with_caches(
        cfg: GatewayConfig,
        documents: SharedDocumentCache,
        persisted: SharedPersistedQueryCache,
    ) -> Result<Self> {
        cfg.validate()?;

        // 1) Compile origin policy
        let origin_policy = OriginPolicy::from_config(&cfg.origins)?;

        // 2) Shared monitoring state
        let last_ping = Arc::new(SharedTimestamp::new());

        // 3) Register built-in services
        let registry = ResolverRegistry::new();
        let ping_hub = Arc::new(PingHub::new(Arc::clone(&last_ping)));
        ping::register(&registry, Arc::clone(&ping_hub));

        let engine = ExecutionEngine::new(registry, documents, persisted, cfg.gateway.introspection);

        tracing::debug!(
            allowlist = origin_policy.allowlist().len(),
            document_capacity = cfg.cache.document_capacity,
            persisted_query_capacity = cfg.cache.persisted_query_capacity,
            "app state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, origin_policy }),
            engine: Arc::new(engine),
            last_ping,
            ping_hub,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.inner.origin_policy
    }

    pub fn engine(&self) -> Arc<ExecutionEngine> {
        Arc::clone(&self.engine)
    }

    pub fn last_ping(&self) -> Arc<SharedTimestamp> {
        Arc::clone(&self.last_ping)
    }

    /// Fan-out behind the `ping` subscription.
    pub fn ping_hub(&self) -> Arc<PingHub> {
        Arc::clone(&self.ping_hub)
    }
}
