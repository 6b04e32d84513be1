//! HTTP GET/POST execution handlers.
//!
//! GET carries `query`, `operationName`, `variables` and `extensions` in the
//! query string (the last two JSON-encoded); POST carries a JSON body. GET
//! requests that ask for a WebSocket upgrade are handed to [`super::ws`].

use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use gqlgate_core::error::{GqlGateError, Result};
use gqlgate_core::protocol::document::OperationKind;
use gqlgate_core::protocol::request::GraphQLRequest;
use gqlgate_core::protocol::response::GraphQLResponse;

use crate::app_state::AppState;
use crate::transport::ws;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetParams {
    pub query: Option<String>,
    pub operation_name: Option<String>,
    pub variables: Option<String>,
    pub extensions: Option<String>,
}

impl GetParams {
    pub fn into_request(self) -> Result<GraphQLRequest> {
        Ok(GraphQLRequest {
            query: self.query,
            operation_name: self.operation_name.filter(|s| !s.is_empty()),
            variables: parse_json_param("variables", self.variables)?,
            extensions: parse_json_param("extensions", self.extensions)?,
        })
    }
}

fn parse_json_param<T: serde::de::DeserializeOwned>(name: &str, raw: Option<String>) -> Result<Option<T>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("null") => Ok(None),
        Some(s) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| GqlGateError::BadRequest(format!("{name} could not be decoded: {e}"))),
    }
}

/// Error rendered as a GraphQL error body with an explicit status.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub err: GqlGateError,
}

impl HttpError {
    pub fn new(status: StatusCode, err: GqlGateError) -> Self {
        Self { status, err }
    }
}

impl From<GqlGateError> for HttpError {
    fn from(err: GqlGateError) -> Self {
        Self {
            status: status_for(&err),
            err,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(GraphQLResponse::error(&self.err))).into_response()
    }
}

/// Status for errors raised before execution.
///
/// A persisted query miss is a normal protocol step and stays 200.
pub fn status_for(err: &GqlGateError) -> StatusCode {
    match err {
        GqlGateError::PersistedQueryNotFound => StatusCode::OK,
        GqlGateError::BadRequest(_)
        | GqlGateError::ParseFailed { .. }
        | GqlGateError::ValidationFailed(_)
        | GqlGateError::PersistedQueryHashMismatch
        | GqlGateError::PersistedQueryNotSupported(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GqlGateError::OperationNotSupported(_) => StatusCode::BAD_REQUEST,
        GqlGateError::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
        GqlGateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HttpMethod {
    Get,
    Post,
}

pub async fn graphql_get(
    State(app): State<AppState>,
    headers: HeaderMap,
    upgrade: Option<WebSocketUpgrade>,
    Query(params): Query<GetParams>,
) -> Response {
    if ws::is_upgrade_request(&headers) {
        return ws::upgrade(app, &headers, upgrade);
    }

    match params.into_request() {
        Ok(req) => execute(&app, req, HttpMethod::Get).await,
        Err(e) => HttpError::new(StatusCode::BAD_REQUEST, e).into_response(),
    }
}

pub async fn graphql_post(State(app): State<AppState>, body: Bytes) -> Response {
    let req: GraphQLRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            let err = GqlGateError::BadRequest(format!("json request body could not be decoded: {e}"));
            return HttpError::new(StatusCode::BAD_REQUEST, err).into_response();
        }
    };
    execute(&app, req, HttpMethod::Post).await
}

async fn execute(app: &AppState, req: GraphQLRequest, method: HttpMethod) -> Response {
    let engine = app.engine();

    let op = match engine.prepare(&req) {
        Ok(op) => op,
        Err(e) => {
            tracing::debug!(error = %e, code = e.client_code().as_str(), "request rejected before execution");
            return HttpError::from(e).into_response();
        }
    };

    match (op.kind(), method) {
        (OperationKind::Mutation, HttpMethod::Get) => {
            let err = GqlGateError::OperationNotSupported("GET requests only allow query operations".into());
            return HttpError::new(StatusCode::NOT_ACCEPTABLE, err).into_response();
        }
        (OperationKind::Subscription, _) => {
            let err = GqlGateError::OperationNotSupported(
                "subscriptions are only served over websocket".into(),
            );
            return HttpError::from(err).into_response();
        }
        _ => {}
    }

    let resp = engine.execute(&op).await;
    (StatusCode::OK, Json(resp)).into_response()
}
