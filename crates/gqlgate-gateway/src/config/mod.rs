//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use gqlgate_core::error::{GqlGateError, Result};

pub use schema::{CacheSection, GatewayConfig, GatewaySection, LimitsSection, OriginsSection};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GqlGateError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
pub fn load_optional(path: &str) -> Result<GatewayConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            Ok(GatewayConfig::default())
        }
        Err(e) => Err(GqlGateError::Internal(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| GqlGateError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
