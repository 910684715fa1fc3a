#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use sunoplayer::config::Settings;

/// Unsigned JWT with the given claims, padded past the minimum token length.
pub fn make_jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.{}", header, payload, "s".repeat(120))
}

pub fn jwt_expiring_in(offset: Duration) -> String {
    make_jwt(json!({ "sub": "user_1", "exp": (Utc::now() + offset).timestamp() }))
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn settings(home: &Path, api_url: &str) -> Settings {
    let mut settings = Settings::with_home(home.to_path_buf());
    settings.api_url = api_url.to_string();
    settings
}

pub fn clip_json(id: &str, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "status": status,
        "created_at": "2024-05-01T10:00:00.000Z",
        "duration": 12.5
    })
}
