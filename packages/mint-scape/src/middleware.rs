//! Admin authentication and request correlation middleware.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::OnceLock;
use subtle::ConstantTimeEq;

pub const API_KEY_ENV: &str = "MINT_SCAPE_API_KEY";

/// Cached API key from env. `None` = dev mode (no auth).
static API_KEY: OnceLock<Option<String>> = OnceLock::new();

fn expected_api_key() -> &'static Option<String> {
    API_KEY.get_or_init(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
}

/// `X-Api-Key`, else `Authorization: Bearer`.
fn provided_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

/// Constant-time comparison.
fn key_matches(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(key) => {
            key.len() == expected.len() && key.as_bytes().ct_eq(expected.as_bytes()).into()
        }
        None => false,
    }
}

/// Guards the admin routes. Bypassed if `MINT_SCAPE_API_KEY` is unset (dev mode).
pub async fn api_key_auth(request: Request, next: Next) -> Response {
    let expected = match expected_api_key() {
        Some(key) => key,
        None => return next.run(request).await,
    };

    if key_matches(provided_api_key(request.headers()), expected) {
        return next.run(request).await;
    }
    let body = serde_json::json!({
        "success": false,
        "error": "Unauthorized: invalid or missing API key"
    });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

/// Propagate or generate `x-request-id` for end-to-end correlation.
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            format!("mint-{:016x}", rng.gen::<u64>())
        });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", val);
    }

    response
}

/// Request correlation ID, extractable from `Request::extensions()`.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches() {
        assert!(key_matches(Some("s3cret"), "s3cret"));
        assert!(!key_matches(Some("s3cre"), "s3cret"));
        assert!(!key_matches(Some("s3creT"), "s3cret"));
        assert!(!key_matches(None, "s3cret"));
    }

    #[test]
    fn test_provided_key_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(provided_api_key(&headers), Some("from-bearer"));
        headers.insert("x-api-key", HeaderValue::from_static("from-header"));
        assert_eq!(provided_api_key(&headers), Some("from-header"));
    }

    #[test]
    fn test_basic_auth_is_not_a_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(provided_api_key(&headers), None);
    }
}
