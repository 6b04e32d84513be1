//! Explorer page (`GET /`).
//!
//! Static HTML loading GraphiQL from a CDN and pointing it at the execution
//! endpoint. No origin check and no engine involvement.

use axum::{extract::State, response::Html};

use crate::app_state::AppState;

pub async fn explorer(State(app): State<AppState>) -> Html<String> {
    let gw = &app.cfg().gateway;
    Html(render(&gw.explorer_title, &gw.endpoint))
}

pub fn render(title: &str, endpoint: &str) -> String {
    let title = escape_html(title);
    let endpoint_js = serde_json::Value::String(endpoint.to_string()).to_string();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>body {{ height: 100%; margin: 0; width: 100%; overflow: hidden; }} #graphiql {{ height: 100vh; }}</style>
  <link rel="stylesheet" href="https://unpkg.com/graphiql@3/graphiql.min.css" crossorigin="anonymous">
</head>
<body>
  <div id="graphiql">Loading...</div>
  <script src="https://unpkg.com/react@18/umd/react.production.min.js" crossorigin="anonymous"></script>
  <script src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js" crossorigin="anonymous"></script>
  <script src="https://unpkg.com/graphiql@3/graphiql.min.js" crossorigin="anonymous"></script>
  <script>
    const endpoint = {endpoint_js};
    const url = location.protocol + '//' + location.host + endpoint;
    const wsProto = location.protocol === 'https:' ? 'wss:' : 'ws:';
    const subscriptionUrl = wsProto + '//' + location.host + endpoint;
    const fetcher = GraphiQL.createFetcher({{ url, subscriptionUrl }});
    ReactDOM.createRoot(document.getElementById('graphiql')).render(
      React.createElement(GraphiQL, {{ fetcher, isHeadersEditorEnabled: true }}),
    );
  </script>
</body>
</html>
"#
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
