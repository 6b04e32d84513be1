//! Axum router wiring.
//!
//! - `GET /`: explorer page (no origin check, no execution)
//! - `GET|POST|OPTIONS <endpoint>`: execution, wrapped by the CORS middleware;
//!   GET with `Upgrade: websocket` switches to the subscription transport

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    let endpoint = state.cfg().gateway.endpoint.clone();
    let max_body = state.cfg().limits.max_body_bytes;

    // `MethodRouter::layer` also wraps the method fallback, so OPTIONS reaches
    // the middleware and is answered there.
    let execution = get(transport::http::graphql_get)
        .post(transport::http::graphql_post)
        .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(
            state.clone(),
            transport::cors::cors,
        ))
        .layer(DefaultBodyLimit::max(max_body));

    Router::new()
        .route("/", get(transport::explorer::explorer))
        .route(&endpoint, execution)
        .with_state(state)
}
