use gqlgate_core::error::Result;

use crate::config::OriginsSection;

use super::allowlist::OriginAllowlist;

/// Outcome of evaluating a request's declared origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// `echo` is the exact origin to reflect in CORS headers; `None` when the
    /// request carried no origin (same-origin default).
    Allow { echo: Option<String> },
    Deny,
}

impl OriginDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, OriginDecision::Allow { .. })
    }

    pub fn echo(&self) -> Option<&str> {
        match self {
            OriginDecision::Allow { echo } => echo.as_deref(),
            OriginDecision::Deny => None,
        }
    }

    /// Apply the decision for a transport.
    ///
    /// Plain HTTP never blocks: a denial only drops the permissive headers and
    /// leaves enforcement to the browser. Upgrades to a duplex socket are
    /// refused outright since browsers do not enforce origin on them.
    pub fn enforce(self, kind: TransportKind) -> Admission {
        match (self, kind) {
            (OriginDecision::Allow { echo }, _) => Admission::Proceed { cors_origin: echo },
            (OriginDecision::Deny, TransportKind::Http) => Admission::Proceed { cors_origin: None },
            (OriginDecision::Deny, TransportKind::Upgrade) => Admission::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request/response (GET, POST, OPTIONS).
    Http,
    /// Upgrade to a persistent bidirectional connection.
    Upgrade,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Http => "http",
            TransportKind::Upgrade => "upgrade",
        }
    }
}

/// What the transport should do with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Proceed { cors_origin: Option<String> },
    Reject,
}

/// Origin admission policy.
/// Construct once at startup, then share via `AppState`.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowlist: OriginAllowlist,
}

impl OriginPolicy {
    pub fn new(allowlist: OriginAllowlist) -> Self {
        Self { allowlist }
    }

    pub fn from_config(cfg: &OriginsSection) -> Result<Self> {
        Ok(Self::new(OriginAllowlist::compile(&cfg.allowlist)?))
    }

    pub fn allowlist(&self) -> &OriginAllowlist {
        &self.allowlist
    }

    /// Decide from the `Origin` and `Host` headers.
    ///
    /// Missing or empty origin is allowed: non-browser clients do not send
    /// one. Note this also means omitting the header bypasses the allow-list.
    pub fn evaluate(&self, origin: Option<&str>, host: Option<&str>) -> OriginDecision {
        let origin = origin.map(str::trim).unwrap_or_default();
        if origin.is_empty() {
            return OriginDecision::Allow { echo: None };
        }
        if host.is_some_and(|h| h.trim() == origin) || self.allowlist.contains(origin) {
            return OriginDecision::Allow {
                echo: Some(origin.to_string()),
            };
        }
        OriginDecision::Deny
    }

    /// `evaluate` + `enforce`, logging denials.
    pub fn admit(&self, origin: Option<&str>, host: Option<&str>, kind: TransportKind) -> Admission {
        let decision = self.evaluate(origin, host);
        if !decision.is_allowed() {
            tracing::warn!(
                origin = origin.unwrap_or_default(),
                host = host.unwrap_or_default(),
                transport = kind.as_str(),
                "origin not allowed"
            );
        }
        decision.enforce(kind)
    }
}
