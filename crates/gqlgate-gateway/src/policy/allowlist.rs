//! Origin allow-list compilation and matching.
//!
//! Entries are exact origins. Wildcards are refused at compile time: the
//! matched origin is echoed back together with
//! `Access-Control-Allow-Credentials`, which browsers reject for `*`.

use std::collections::HashSet;

use gqlgate_core::error::{GqlGateError, Result};

#[derive(Debug, Clone, Default)]
pub struct OriginAllowlist {
    entries: HashSet<String>,
}

impl OriginAllowlist {
    pub fn compile(raw: &[String]) -> Result<Self> {
        let mut entries = HashSet::with_capacity(raw.len());
        for s in raw {
            let s = s.trim();
            if s.is_empty() || s.contains('*') {
                return Err(GqlGateError::BadRequest(format!(
                    "invalid origin allowlist entry: {s:?} (expected scheme://host[:port])"
                )));
            }
            entries.insert(s.to_string());
        }
        Ok(Self { entries })
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.entries.contains(origin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
