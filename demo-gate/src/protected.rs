use axum::{
    Extension, Json, Router,
    response::{Html, IntoResponse},
    routing::get,
};
use serde_json::json;

use session_gate_axum::{GATE_API_PREFIX, GateContext};

pub(super) fn router() -> Router<()> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page))
        .route(&format!("{}/protected", *GATE_API_PREFIX), get(protected))
}

async fn index() -> impl IntoResponse {
    let api = GATE_API_PREFIX.as_str();
    Html(format!(
        "<h1>session-gate demo</h1>\
         <ul>\
         <li>POST {api}/auth/login <code>{{\"username\", \"password\"}}</code></li>\
         <li>POST {api}/auth/logout <code>{{\"username\"}}</code></li>\
         <li>GET {api}/auth/session with x-username and x-session-token</li>\
         <li>GET {api}/protected with x-username and x-session-token</li>\
         <li>GET {api}/users, GET/DELETE {api}/users/{{id}}</li>\
         </ul>\
         <p><a href=\"/login\">Login page</a></p>"
    ))
}

async fn login_page() -> impl IntoResponse {
    let api = GATE_API_PREFIX.as_str();
    Html(format!(
        r#"<h1>Login</h1>
<form id="login">
  <input name="username" placeholder="username">
  <input name="password" type="password" placeholder="password">
  <button>Login</button>
</form>
<pre id="out"></pre>
<script>
document.getElementById("login").onsubmit = async (e) => {{
  e.preventDefault();
  const form = new FormData(e.target);
  const res = await fetch("{api}/auth/login", {{
    method: "POST",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify(Object.fromEntries(form)),
  }});
  document.getElementById("out").textContent = JSON.stringify(await res.json(), null, 2);
}};
</script>"#
    ))
}

/// Only reachable with a valid session; the gate has already refreshed it
async fn protected(Extension(context): Extension<GateContext>) -> impl IntoResponse {
    tracing::debug!(username = %context.username, "Protected resource served");
    Json(json!({
        "success": true,
        "message": format!("Hello, {}!", context.username),
        "code": "SUCCESS",
        "data": {
            "userId": context.subject_id,
            "username": context.username,
            "expiresAt": context.expires_at,
        },
    }))
}
