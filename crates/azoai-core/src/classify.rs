use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

use azoai_protocol::{
    ChatCompletionsRequestBody, CompletionsRequestBody, EmbeddingsRequestBody,
    ImageGenerationRequestBody,
};

use crate::endpoints::Endpoint;
use crate::error::ProxyError;

const VALID_IMAGE_SIZES: [&str; 3] = ["1024x1024", "1792x1024", "1024x1792"];
const VALID_IMAGE_QUALITIES: [&str; 2] = ["standard", "hd"];
const VALID_IMAGE_FORMATS: [&str; 2] = ["url", "b64_json"];

/// The validated request kind, carrying its parsed body.
#[derive(Debug, Clone)]
pub enum ProxyOperation {
    TextChat(ChatCompletionsRequestBody),
    VisionChat(ChatCompletionsRequestBody),
    LegacyCompletion(CompletionsRequestBody),
    ImageGeneration(ImageGenerationRequestBody),
    Embeddings(EmbeddingsRequestBody),
}

impl ProxyOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TextChat(_) => "chat.completions",
            Self::VisionChat(_) => "chat.completions.vision",
            Self::LegacyCompletion(_) => "completions",
            Self::ImageGeneration(_) => "images.generations",
            Self::Embeddings(_) => "embeddings",
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::TextChat(_) | Self::VisionChat(_) => Endpoint::ChatCompletions,
            Self::LegacyCompletion(_) => Endpoint::Completions,
            Self::ImageGeneration(_) => Endpoint::ImageGenerations,
            Self::Embeddings(_) => Endpoint::Embeddings,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedRequest {
    pub deployment: String,
    /// Captured for logging only; the proxy is version-agnostic.
    pub api_version: Option<String>,
    pub operation: ProxyOperation,
    pub is_stream: bool,
}

/// Parse, classify and validate one deployment-scoped request. Rejections
/// happen here, before any upstream dispatch.
pub fn classify_request(
    method: &Method,
    deployment: &str,
    suffix: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
    max_body_bytes: usize,
) -> Result<ClassifiedRequest, ProxyError> {
    // Size gate runs before any parse so oversized bodies cost nothing.
    if body.len() > max_body_bytes {
        return Err(ProxyError::payload_too_large(format!(
            "request body exceeds the {max_body_bytes} byte limit"
        )));
    }
    if *method != Method::POST {
        return Err(ProxyError::not_found(format!(
            "no route for {method} requests"
        )));
    }
    if !has_credential(headers) {
        return Err(ProxyError::unauthorized(
            "Access denied due to missing subscription key. Pass an api-key header or bearer token.",
        ));
    }

    let endpoint = Endpoint::from_suffix(suffix)
        .ok_or_else(|| ProxyError::not_found(format!("unknown operation: {suffix}")))?;
    let api_version = api_version_from_query(query);

    let (operation, is_stream) = match endpoint {
        Endpoint::ChatCompletions => {
            let parsed: ChatCompletionsRequestBody = parse_json(&body, "chat completions")?;
            let is_stream = parsed.stream.unwrap_or(false);
            (validate_chat(parsed, is_stream)?, is_stream)
        }
        Endpoint::Completions => {
            let parsed: CompletionsRequestBody = parse_json(&body, "completions")?;
            let is_stream = parsed.stream.unwrap_or(false);
            (ProxyOperation::LegacyCompletion(parsed), is_stream)
        }
        Endpoint::ImageGenerations => {
            let parsed: ImageGenerationRequestBody = parse_json(&body, "image generations")?;
            validate_image_generation(&parsed)?;
            (ProxyOperation::ImageGeneration(parsed), false)
        }
        Endpoint::Embeddings => {
            let parsed: EmbeddingsRequestBody = parse_json(&body, "embeddings")?;
            if parsed.input.is_empty() {
                return Err(ProxyError::bad_request(
                    "'input' must be a non-empty string or a non-empty array of strings.",
                ));
            }
            (ProxyOperation::Embeddings(parsed), false)
        }
    };

    Ok(ClassifiedRequest {
        deployment: deployment.to_string(),
        api_version,
        operation,
        is_stream,
    })
}

fn validate_chat(
    body: ChatCompletionsRequestBody,
    is_stream: bool,
) -> Result<ProxyOperation, ProxyError> {
    if body.messages.is_empty() {
        return Err(ProxyError::bad_request("'messages' must be a non-empty array."));
    }
    let has_known_role = body.messages.iter().any(|message| {
        matches!(message.role.as_str(), "system" | "user" | "assistant" | "tool")
    });
    if !has_known_role {
        return Err(ProxyError::bad_request(
            "'messages' must contain at least one system, user, assistant or tool message.",
        ));
    }

    let image_count: usize = body
        .messages
        .iter()
        .map(|message| message.image_urls().count())
        .sum();
    if image_count == 0 {
        return Ok(ProxyOperation::TextChat(body));
    }

    // Vision requests mirror the restrictions Azure itself enforces.
    if image_count > 1 {
        return Err(ProxyError::bad_request("Invalid image data."));
    }
    if is_stream {
        return Err(ProxyError::bad_request(
            "Streaming is not supported for vision requests.",
        ));
    }
    for message in &body.messages {
        for image in message.image_urls() {
            if !is_valid_image_url(&image.url) {
                return Err(ProxyError::bad_request(
                    "Image URL must be a valid HTTP/HTTPS URL or a base64 data URL.",
                ));
            }
        }
    }
    Ok(ProxyOperation::VisionChat(body))
}

fn validate_image_generation(body: &ImageGenerationRequestBody) -> Result<(), ProxyError> {
    if body.prompt.is_empty() {
        return Err(ProxyError::bad_request("'prompt' must be a non-empty string."));
    }
    if let Some(n) = body.n
        && !(1..=10).contains(&n)
    {
        return Err(ProxyError::bad_request("'n' must be between 1 and 10."));
    }
    if let Some(size) = body.size.as_deref()
        && !VALID_IMAGE_SIZES.contains(&size)
    {
        return Err(ProxyError::bad_request(
            "'size' must be one of 1024x1024, 1792x1024 or 1024x1792.",
        ));
    }
    if let Some(quality) = body.quality.as_deref()
        && !VALID_IMAGE_QUALITIES.contains(&quality)
    {
        return Err(ProxyError::bad_request("'quality' must be standard or hd."));
    }
    if let Some(format) = body.response_format.as_deref()
        && !VALID_IMAGE_FORMATS.contains(&format)
    {
        return Err(ProxyError::bad_request(
            "'response_format' must be url or b64_json.",
        ));
    }
    Ok(())
}

/// Credential presence only; the value is not verified here. The proxy
/// authenticates to the upstream with its own key.
fn has_credential(headers: &HeaderMap) -> bool {
    if headers
        .get("api-key")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| !value.trim().is_empty())
    {
        return true;
    }
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim())
        .is_some_and(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
                .is_some_and(|token| !token.trim().is_empty())
        })
}

fn is_valid_image_url(url: &str) -> bool {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.len() > "https://".len();
    }
    let Some(rest) = url.strip_prefix("data:") else {
        return false;
    };
    let Some((mime, payload)) = rest.split_once(";base64,") else {
        return false;
    };
    !mime.is_empty() && !payload.is_empty()
}

fn api_version_from_query(query: Option<&str>) -> Option<String> {
    let query = query?;
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find(|(key, _)| key == "api-version")
        .map(|(_, value)| value)
}

fn parse_json<T>(body: &[u8], label: &str) -> Result<T, ProxyError>
where
    T: DeserializeOwned,
{
    if body.is_empty() {
        return Err(ProxyError::bad_request(format!("missing body for {label}")));
    }
    serde_json::from_slice(body)
        .map_err(|err| ProxyError::bad_request(format!("invalid {label} body: {err}")))
}
