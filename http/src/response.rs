//! Response helpers. None of these can fail: headers are static or checked.

use bytes::Bytes;
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderValue, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

pub type HttpResponse = Response<Full<Bytes>>;

/// Build a response with a status and a static content type.
pub fn with_content_type(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> HttpResponse {
    let mut res = Response::new(Full::new(body.into()));
    *res.status_mut() = status;
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    res
}

/// Create a text/plain response
pub fn text(body: impl Into<Bytes>) -> HttpResponse {
    with_content_type(StatusCode::OK, "text/plain; charset=utf-8", body)
}

/// Create a text/html response
pub fn html(body: impl Into<Bytes>) -> HttpResponse {
    with_content_type(StatusCode::OK, "text/html; charset=utf-8", body)
}

/// Create a JSON response. A value that fails to serialize becomes a 500.
pub fn json<T: Serialize>(body: &T) -> HttpResponse {
    json_with_status(StatusCode::OK, body)
}

pub fn json_with_status<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_content_type(status, "application/json", bytes),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize JSON response");
            internal_error()
        }
    }
}

/// Attach `Cache-Control: max-age=<seconds>`.
pub fn cached(mut res: HttpResponse, max_age_secs: u32) -> HttpResponse {
    if let Ok(value) = HeaderValue::from_str(&format!("max-age={max_age_secs}")) {
        res.headers_mut().insert(CACHE_CONTROL, value);
    }
    res
}

/// Create a 404 Not Found response
pub fn not_found() -> HttpResponse {
    with_content_type(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", "Not Found")
}

/// Create a 400 response for bodies that could not be read
pub fn bad_request() -> HttpResponse {
    with_content_type(StatusCode::BAD_REQUEST, "text/plain; charset=utf-8", "Bad Request")
}

/// Create a 413 response for bodies over the ingress limit
pub fn payload_too_large() -> HttpResponse {
    with_content_type(
        StatusCode::PAYLOAD_TOO_LARGE,
        "text/plain; charset=utf-8",
        "Payload Too Large",
    )
}

/// The opaque failure response. Never carries internal detail.
pub fn internal_error() -> HttpResponse {
    with_content_type(
        StatusCode::INTERNAL_SERVER_ERROR,
        "application/json",
        r#"{"error":"Internal Server Error"}"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(res: HttpResponse) -> String {
        let bytes = res.into_body().collect().await.expect("infallible").to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn internal_error_is_opaque() {
        let res = internal_error();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(res).await, r#"{"error":"Internal Server Error"}"#);
    }

    #[tokio::test]
    async fn json_sets_content_type() {
        let res = json(&serde_json::json!({"ok": true}));
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_string(res).await, r#"{"ok":true}"#);
    }

    #[test]
    fn cached_sets_max_age() {
        let res = cached(text("hi"), 10);
        assert_eq!(res.headers()[CACHE_CONTROL], "max-age=10");
    }
}
