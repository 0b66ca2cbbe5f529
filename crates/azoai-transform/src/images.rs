use serde_json::{Value as JsonValue, json};

use azoai_protocol::ImageGenerationRequestBody;

pub fn to_upstream_image_body(
    mut body: ImageGenerationRequestBody,
    deployment: &str,
) -> ImageGenerationRequestBody {
    body.model = Some(deployment.to_string());
    body
}

/// Minimal normalization of the upstream image result: make sure `object`
/// exists and `data` is an array.
pub fn normalize_image_response(mut value: JsonValue) -> JsonValue {
    let Some(object) = value.as_object_mut() else {
        return json!({ "object": "list", "data": [value] });
    };
    object
        .entry("object")
        .or_insert_with(|| JsonValue::String("list".to_string()));
    match object.get_mut("data") {
        Some(JsonValue::Array(_)) => {}
        Some(other) => {
            let item = other.take();
            object.insert("data".to_string(), JsonValue::Array(vec![item]));
        }
        None => {
            object.insert("data".to_string(), JsonValue::Array(Vec::new()));
        }
    }
    value
}
