//! Automatic persisted queries (APQ).
//!
//! Clients send `extensions.persistedQuery = { version, sha256Hash }` either
//! alone (expecting a cache hit) or together with the full query text
//! (register-and-execute). The hash is the lowercase hex SHA-256 of the
//! query text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{GqlGateError, Result};

/// Only supported protocol version.
pub const APQ_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedQuery {
    pub version: u32,
    pub sha256_hash: String,
}

impl PersistedQuery {
    pub fn new(sha256_hash: impl Into<String>) -> Self {
        Self {
            version: APQ_VERSION,
            sha256_hash: sha256_hash.into(),
        }
    }

    /// Build the extension for a query by hashing it.
    pub fn for_query(query: &str) -> Self {
        Self::new(sha256_hex(query))
    }

    pub fn check_version(&self) -> Result<()> {
        if self.version != APQ_VERSION {
            return Err(GqlGateError::PersistedQueryNotSupported(self.version));
        }
        Ok(())
    }

    /// Registration requires the supplied hash to match the query text.
    pub fn verify(&self, query: &str) -> Result<()> {
        if !self.sha256_hash.eq_ignore_ascii_case(&sha256_hex(query)) {
            return Err(GqlGateError::PersistedQueryHashMismatch);
        }
        Ok(())
    }
}

pub fn sha256_hex(query: &str) -> String {
    hex::encode(Sha256::digest(query.as_bytes()))
}
