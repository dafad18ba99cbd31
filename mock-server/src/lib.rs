use std::collections::HashMap;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Form, Path},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Reply of the `/echo` route: what the server saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/headers", get(request_headers))
        .route("/headers/{name}", get(raw_header))
        .route("/echo", any(echo))
        .route("/json", post(json))
        .route("/form", post(form))
        .route("/items/{id}", delete(delete_item))
        .route("/redirect", get(redirect))
        .route("/status/{code}", get(status))
        .route("/slow/{ms}", get(slow))
        .route("/bytes/{n}", get(bytes))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn hello() -> Response {
    let mut resp = "ok".into_response();
    if let Ok(id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        resp.headers_mut().insert("x-request-id", id);
    }
    resp
}

async fn request_headers(headers: HeaderMap) -> Json<HashMap<String, String>> {
    let map = headers
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    Json(map)
}

/// Value bytes of one request header, exactly as received.
async fn raw_header(Path(name): Path<String>, headers: HeaderMap) -> Result<Vec<u8>, StatusCode> {
    headers
        .get(name.as_str())
        .map(|v| v.as_bytes().to_vec())
        .ok_or(StatusCode::NOT_FOUND)
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    Json(Echo {
        method: method.to_string(),
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn json(Json(value): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "received": value }))
}

async fn form(Form(fields): Form<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(fields)
}

async fn delete_item(Path(id): Path<u32>) -> StatusCode {
    tracing::info!(id, "item deleted");
    StatusCode::NO_CONTENT
}

async fn redirect() -> Redirect {
    Redirect::to("/hello")
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, StatusCode> {
    StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn slow(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

async fn bytes(Path(n): Path<usize>) -> Vec<u8> {
    vec![b'x'; n]
}
