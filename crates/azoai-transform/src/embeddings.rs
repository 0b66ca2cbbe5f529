use serde_json::{Value as JsonValue, json};

use azoai_protocol::EmbeddingsRequestBody;

/// The deployment fills in `model` only when the client left it out.
pub fn to_upstream_embeddings_body(
    mut body: EmbeddingsRequestBody,
    deployment: &str,
) -> EmbeddingsRequestBody {
    if body.model.is_none() {
        body.model = Some(deployment.to_string());
    }
    body
}

pub fn normalize_embeddings_response(mut value: JsonValue) -> JsonValue {
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
