//! GraphQL response body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GqlGateError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl GraphQLResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Response for a request that never reached execution (no `data` key).
    pub fn error(err: &GqlGateError) -> Self {
        Self {
            data: None,
            errors: vec![GraphQLError::from(err)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ErrorExtensions>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }

    pub fn with_path(mut self, key: &str) -> Self {
        self.path.push(Value::String(key.to_string()));
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref().map(|e| e.code.as_str())
    }
}

impl From<&GqlGateError> for GraphQLError {
    fn from(err: &GqlGateError) -> Self {
        let locations = match err {
            GqlGateError::ParseFailed { line, column, .. } => vec![Location {
                line: *line,
                column: *column,
            }],
            _ => Vec::new(),
        };
        Self {
            message: err.to_string(),
            locations,
            path: Vec::new(),
            extensions: Some(ErrorExtensions {
                code: err.client_code().as_str().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    pub code: String,
}
