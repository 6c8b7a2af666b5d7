//! Test fixtures for building upload requests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

/// Boundary used by every hand-built multipart body.
pub const BOUNDARY: &str = "sqldepot-test-boundary";

/// Minimal SQLite header, enough to look like a database file.
#[allow(dead_code)]
pub const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

/// A single part of a multipart form.
#[allow(dead_code)]
pub enum Part<'a> {
    /// A file part with a file name.
    File {
        name: &'a str,
        file_name: &'a str,
        data: &'a [u8],
    },
    /// A plain text field.
    Text { name: &'a str, value: &'a str },
}

/// Encode `parts` as a multipart/form-data body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart form and return the status and JSON body.
pub async fn post_multipart(
    router: &axum::Router,
    uri: &str,
    parts: &[Part<'_>],
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    send(router, request).await
}

/// POST a single file part named `file`.
#[allow(dead_code)]
pub async fn upload_file(
    router: &axum::Router,
    uri: &str,
    file_name: &str,
    data: &[u8],
) -> (StatusCode, Value) {
    post_multipart(
        router,
        uri,
        &[Part::File {
            name: "file",
            file_name,
            data,
        }],
    )
    .await
}

/// Send a request and decode its JSON body, `Value::Null` when empty or not JSON.
pub async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
