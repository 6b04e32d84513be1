use serde::Deserialize;
use gqlgate_core::error::{GqlGateError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub origins: OriginsSection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub limits: LimitsSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            origins: OriginsSection::default(),
            cache: CacheSection::default(),
            limits: LimitsSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GqlGateError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.origins.validate()?;
        self.cache.validate()?;
        self.limits.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Execution endpoint path.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    /// How long a socket may stay open without `connection_init`.
    #[serde(default = "default_init_timeout_ms")]
    pub init_timeout_ms: u64,

    #[serde(default = "default_introspection")]
    pub introspection: bool,

    #[serde(default = "default_explorer_title")]
    pub explorer_title: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            endpoint: default_endpoint(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
            init_timeout_ms: default_init_timeout_ms(),
            introspection: default_introspection(),
            explorer_title: default_explorer_title(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with('/') || self.endpoint == "/" {
            return Err(GqlGateError::BadRequest(
                "gateway.endpoint must be an absolute path other than /".into(),
            ));
        }
        if !(1000..=120000).contains(&self.keepalive_interval_ms) {
            return Err(GqlGateError::BadRequest(
                "gateway.keepalive_interval_ms must be between 1000 and 120000".into(),
            ));
        }
        if !(1000..=600000).contains(&self.init_timeout_ms) {
            return Err(GqlGateError::BadRequest(
                "gateway.init_timeout_ms must be between 1000 and 600000".into(),
            ));
        }
        Ok(())
    }

    /// `PORT` from the environment wins over the file.
    pub fn apply_port_override(&mut self, raw: &str) -> Result<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        self.port = raw
            .parse()
            .map_err(|_| GqlGateError::BadRequest(format!("invalid PORT: {raw}")))?;
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_endpoint() -> String {
    "/query".into()
}
fn default_keepalive_interval_ms() -> u64 {
    10000
}
fn default_init_timeout_ms() -> u64 {
    15000
}
fn default_introspection() -> bool {
    true
}
fn default_explorer_title() -> String {
    "GraphQL playground".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OriginsSection {
    /// Exact origins (`scheme://host[:port]`) granted cross-origin access.
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,
}

impl Default for OriginsSection {
    fn default() -> Self {
        Self {
            allowlist: default_allowlist(),
        }
    }
}

impl OriginsSection {
    pub fn validate(&self) -> Result<()> {
        for o in &self.allowlist {
            if o.trim().is_empty() {
                return Err(GqlGateError::BadRequest(
                    "origins.allowlist entries must not be empty".into(),
                ));
            }
            if o.contains('*') {
                return Err(GqlGateError::BadRequest(format!(
                    "origins.allowlist entries must be exact origins, got {o}"
                )));
            }
        }
        Ok(())
    }
}

fn default_allowlist() -> Vec<String> {
    vec![
        "http://localhost:3000".into(),
        "http://localhost:8080".into(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    #[serde(default = "default_document_capacity")]
    pub document_capacity: usize,

    #[serde(default = "default_persisted_query_capacity")]
    pub persisted_query_capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            document_capacity: default_document_capacity(),
            persisted_query_capacity: default_persisted_query_capacity(),
        }
    }
}

impl CacheSection {
    pub fn validate(&self) -> Result<()> {
        if self.document_capacity == 0 {
            return Err(GqlGateError::BadRequest(
                "cache.document_capacity must be greater than 0".into(),
            ));
        }
        if self.persisted_query_capacity == 0 {
            return Err(GqlGateError::BadRequest(
                "cache.persisted_query_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_document_capacity() -> usize {
    1000
}
fn default_persisted_query_capacity() -> usize {
    100
}

/// Inbound size caps, applied before anything is parsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    /// HTTP request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Reassembled WebSocket message.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl LimitsSection {
    pub fn validate(&self) -> Result<()> {
        if self.max_body_bytes < 1024 {
            return Err(GqlGateError::BadRequest(
                "limits.max_body_bytes must be at least 1024".into(),
            ));
        }
        if self.max_frame_bytes < 1024 {
            return Err(GqlGateError::BadRequest(
                "limits.max_frame_bytes must be at least 1024".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}
fn default_max_frame_bytes() -> usize {
    1024 * 1024
}
