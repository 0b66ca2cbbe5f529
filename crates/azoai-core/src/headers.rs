use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Synthesize the Azure-observed response headers for a 2xx response.
///
/// The rate-limit family is copied from the upstream when present and
/// omitted otherwise; nothing is invented.
pub fn synthesize_response_headers(
    deployment: &str,
    region: &str,
    request_id: &str,
    client_request_id: Option<&str>,
    streaming: bool,
    upstream_headers: &[(String, String)],
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = if streaming {
        "text/event-stream; charset=utf-8"
    } else {
        "application/json"
    };
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

    insert_str(&mut headers, "x-ms-deployment-name", deployment);
    insert_str(&mut headers, "x-ms-region", region);
    insert_str(&mut headers, "apim-request-id", request_id);
    insert_str(
        &mut headers,
        "azureml-model-session",
        &uuid::Uuid::new_v4().to_string(),
    );
    if let Some(client_request_id) = client_request_id {
        insert_str(&mut headers, "x-ms-client-request-id", client_request_id);
    }

    for (name, value) in upstream_headers {
        let lowered = name.to_ascii_lowercase();
        if lowered.starts_with("x-ratelimit-") {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(lowered),
                HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }
    }

    if streaming {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    }

    headers
}

fn insert_str(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
