//! GraphQL request body (POST JSON, GET query string, WS subscribe payload).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::apq::PersistedQuery;

/// One GraphQL request as sent by clients.
///
/// Unknown top-level fields are ignored; clients routinely attach their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<RequestExtensions>,
}

impl GraphQLRequest {
    /// Plain request carrying full query text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn persisted_query(&self) -> Option<&PersistedQuery> {
        self.extensions.as_ref()?.persisted_query.as_ref()
    }

    /// Query text, treating an empty string as absent.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// `extensions` object of a request. Only `persistedQuery` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestExtensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persisted_query: Option<PersistedQuery>,
}
