use http::{HeaderMap, StatusCode};
use serde_json::Value as JsonValue;

use azoai_protocol::ErrorEnvelope;

/// A failure already shaped for the client: HTTP status plus the Azure
/// error envelope, and any headers that must ride along (rate-limit family
/// on 429 passthrough).
#[derive(Debug)]
pub struct ProxyError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub envelope: ErrorEnvelope,
}

impl ProxyError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            envelope: ErrorEnvelope::new(code, message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BadRequest", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFound", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "RequestEntityTooLarge",
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalServerError",
            message,
        )
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "BadGateway", message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "GatewayTimeout", message)
    }

    /// Shape an upstream non-2xx into the Azure envelope. A recognizable
    /// `{"error": {...}}` body is unwrapped so operators see the upstream
    /// message; anything else is carried as a body excerpt.
    pub fn from_upstream_status(status: u16, upstream_headers: &[(String, String)], body: &[u8]) -> Self {
        let status =
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = code_for_status(status);
        let message = upstream_error_message(body)
            .unwrap_or_else(|| String::from_utf8_lossy(&body[..body.len().min(512)]).to_string());

        let mut error = Self::new(status, code, message);
        if status == StatusCode::TOO_MANY_REQUESTS {
            copy_rate_limit_headers(upstream_headers, &mut error.headers);
        }
        error
    }

    /// In-stream upstream error object, folded into the envelope shape used
    /// for the terminal `data: {"error": ...}` frame.
    pub fn from_stream_error(detail: &JsonValue) -> Self {
        let message = detail
            .get("message")
            .and_then(|value| value.as_str())
            .unwrap_or("upstream stream error")
            .to_string();
        let code = detail
            .get("code")
            .and_then(|value| value.as_str())
            .unwrap_or("InternalServerError")
            .to_string();
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, &code, message)
    }

    pub fn body_bytes(&self) -> bytes::Bytes {
        serde_json::to_vec(&self.envelope)
            .map(bytes::Bytes::from)
            .unwrap_or_else(|_| {
                bytes::Bytes::from_static(
                    br#"{"error":{"code":"InternalServerError","message":"error encoding failed","param":null,"type":null}}"#,
                )
            })
    }
}

fn code_for_status(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BadRequest",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "NotFound",
        StatusCode::PAYLOAD_TOO_LARGE => "RequestEntityTooLarge",
        StatusCode::TOO_MANY_REQUESTS => "TooManyRequests",
        StatusCode::BAD_GATEWAY => "BadGateway",
        StatusCode::GATEWAY_TIMEOUT => "GatewayTimeout",
        _ => "InternalServerError",
    }
}

fn upstream_error_message(body: &[u8]) -> Option<String> {
    let value: JsonValue = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }
    error.as_str().map(|message| message.to_string())
}

fn copy_rate_limit_headers(upstream: &[(String, String)], out: &mut HeaderMap) {
    for (name, value) in upstream {
        let lowered = name.to_ascii_lowercase();
        if !lowered.starts_with("x-ratelimit-") {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(lowered),
            http::HeaderValue::try_from(value.as_str()),
        ) {
            out.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_json_error_is_unwrapped() {
        let err = ProxyError::from_upstream_status(
            403,
            &[],
            br#"{"error":{"message":"key disabled","type":"access"}}"#,
        );
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.envelope.error.code, "Forbidden");
        assert_eq!(err.envelope.error.message, "key disabled");
    }

    #[test]
    fn rate_limit_headers_ride_on_429() {
        let upstream: Vec<(String, String)> = vec![
            ("x-ratelimit-remaining-requests".to_string(), "0".to_string()),
            ("x-ratelimit-limit-tokens".to_string(), "10000".to_string()),
            ("content-length".to_string(), "99".to_string()),
        ];
        let err = ProxyError::from_upstream_status(429, &upstream, b"slow down");
        assert_eq!(err.envelope.error.code, "TooManyRequests");
        assert_eq!(err.headers.get("x-ratelimit-remaining-requests").unwrap(), "0");
        assert!(err.headers.get("content-length").is_none());
    }

    #[test]
    fn opaque_upstream_body_becomes_an_excerpt() {
        let err = ProxyError::from_upstream_status(500, &[], b"<html>boom</html>");
        assert_eq!(err.envelope.error.code, "InternalServerError");
        assert!(err.envelope.error.message.contains("boom"));
    }

    #[test]
    fn envelope_serializes_with_null_param_and_type() {
        let body = ProxyError::bad_request("Invalid image data.").body_bytes();
        let value: JsonValue = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "BadRequest");
        assert_eq!(value["error"]["message"], "Invalid image data.");
        assert!(value["error"]["param"].is_null());
        assert!(value["error"]["type"].is_null());
    }
}
